#![forbid(unsafe_code)]

//! The host-facing seam: DOM access, helper and component lookup.

use std::collections::HashMap;
use std::rc::Rc;

use tessel_core::value::Fields;
use tessel_core::{Error, Result, Value};
use tessel_dom::DomHelper;

use crate::builtins;
use crate::config::RenderConfig;
use crate::helper::Helper;
use crate::morph::block::BlockOptions;
use crate::scope::Scope;
use crate::template::Template;

/// What a component tag expands to.
#[derive(Clone)]
pub struct ComponentDefinition {
    pub layout: Rc<Template>,
}

/// Everything a render needs from its host.
pub trait Environment {
    fn dom(&self) -> &Rc<dyn DomHelper>;

    fn config(&self) -> &RenderConfig;

    /// Identity key of a list item, used by `@identity` keys.
    fn identity(&self, value: &Value) -> String {
        value.identity_key()
    }

    /// Whether a single-segment path names a helper rather than data.
    fn has_helper(&self, scope: &Scope, path: &[String]) -> bool;

    fn lookup_helper(&self, scope: &Scope, path: &[String]) -> Result<Helper>;

    fn component_definition(&self, scope: &Scope, tag: &str) -> Option<ComponentDefinition>;
}

/// Table-driven environment with the built-in `if`, `unless`, `with` and
/// `each` helpers pre-registered.
pub struct DefaultEnvironment {
    dom: Rc<dyn DomHelper>,
    config: RenderConfig,
    helpers: HashMap<String, Helper>,
    components: HashMap<String, ComponentDefinition>,
}

impl DefaultEnvironment {
    pub fn new(dom: Rc<dyn DomHelper>) -> Self {
        let mut helpers = HashMap::new();
        builtins::register(&mut helpers);
        Self {
            dom,
            config: RenderConfig::default(),
            helpers,
            components: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value], &Fields) -> Result<Value> + 'static,
    {
        self.helpers.insert(name.into(), Helper::inline(f));
        self
    }

    #[must_use]
    pub fn with_block_helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value], &Fields, &mut BlockOptions<'_>) -> Result<()> + 'static,
    {
        self.helpers.insert(name.into(), Helper::block(f));
        self
    }

    #[must_use]
    pub fn with_component(mut self, tag: impl Into<String>, layout: Rc<Template>) -> Self {
        self.components
            .insert(tag.into(), ComponentDefinition { layout });
        self
    }

    /// Finish building; frames share the environment through an `Rc`.
    pub fn into_shared(self) -> Rc<dyn Environment> {
        Rc::new(self)
    }
}

impl Environment for DefaultEnvironment {
    fn dom(&self) -> &Rc<dyn DomHelper> {
        &self.dom
    }

    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn has_helper(&self, _scope: &Scope, path: &[String]) -> bool {
        path.len() == 1 && self.helpers.contains_key(&path[0])
    }

    fn lookup_helper(&self, _scope: &Scope, path: &[String]) -> Result<Helper> {
        let name = path.join(".");
        self.helpers
            .get(&name)
            .cloned()
            .ok_or(Error::HelperNotFound { path: name })
    }

    fn component_definition(&self, _scope: &Scope, tag: &str) -> Option<ComponentDefinition> {
        self.components.get(tag).cloned()
    }
}
