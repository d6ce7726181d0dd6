#![forbid(unsafe_code)]

use std::rc::Rc;

use tessel_dom::DomHelper;

use crate::config::RenderConfig;
use crate::environment::Environment;
use crate::scope::Scope;

/// Evaluation context handed to every statement: the host environment
/// plus the current scope.
#[derive(Clone)]
pub struct Frame {
    env: Rc<dyn Environment>,
    scope: Rc<Scope>,
}

impl Frame {
    pub fn new(env: Rc<dyn Environment>, scope: Rc<Scope>) -> Self {
        Self { env, scope }
    }

    pub fn env(&self) -> &Rc<dyn Environment> {
        &self.env
    }

    pub fn dom(&self) -> &Rc<dyn DomHelper> {
        self.env.dom()
    }

    pub fn config(&self) -> &RenderConfig {
        self.env.config()
    }

    pub fn scope(&self) -> &Rc<Scope> {
        &self.scope
    }

    /// Same environment, nested scope declaring `local_names`.
    pub fn child_scope(&self, local_names: &[String]) -> Self {
        Self {
            env: Rc::clone(&self.env),
            scope: self.scope.child(local_names),
        }
    }

    /// Same environment, unrelated scope.
    pub fn with_scope(&self, scope: Rc<Scope>) -> Self {
        Self {
            env: Rc::clone(&self.env),
            scope,
        }
    }
}
