#![forbid(unsafe_code)]

//! Lexical scopes: `self`, block-param locals and named blocks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tessel_core::{ConstReference, ReferenceHandle, RootReference, Value};

use crate::frame::Frame;
use crate::template::Template;

/// A template bound to the frame it must render in (a caller's block
/// handed to a component layout).
#[derive(Clone)]
pub struct Block {
    pub template: Rc<Template>,
    pub frame: Frame,
}

/// One level of the scope chain.
///
/// Locals have a fixed shape decided when the scope is created; binding a
/// local updates its root reference in place so morphs reading it are
/// notified instead of rebuilt.
pub struct Scope {
    self_ref: Option<ReferenceHandle>,
    locals: Vec<(String, Rc<RootReference>)>,
    blocks: RefCell<HashMap<String, Block>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// A root scope with its own `self`.
    pub fn top_level(self_ref: Option<ReferenceHandle>, local_names: &[String]) -> Rc<Self> {
        Rc::new(Self {
            self_ref,
            locals: declare(local_names),
            blocks: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// A nested scope that inherits `self`, locals and blocks.
    pub fn child(self: &Rc<Self>, local_names: &[String]) -> Rc<Self> {
        Rc::new(Self {
            self_ref: None,
            locals: declare(local_names),
            blocks: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(self)),
        })
    }

    /// The nearest `self` on the chain.
    pub fn get_self(&self) -> Option<ReferenceHandle> {
        match (&self.self_ref, &self.parent) {
            (Some(self_ref), _) => Some(Rc::clone(self_ref)),
            (None, Some(parent)) => parent.get_self(),
            (None, None) => None,
        }
    }

    /// Whether `name` is declared as a local anywhere on the chain.
    pub fn has_local(&self, name: &str) -> bool {
        self.get_local(name).is_some()
    }

    /// The nearest local named `name`.
    pub fn get_local(&self, name: &str) -> Option<ReferenceHandle> {
        if let Some((_, slot)) = self.locals.iter().find(|(n, _)| n == name) {
            let handle: ReferenceHandle = slot.clone();
            return Some(handle);
        }
        self.parent.as_ref().and_then(|parent| parent.get_local(name))
    }

    /// Names of the locals declared at this level.
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.locals.iter().map(|(name, _)| name.as_str())
    }

    /// Set a local declared at this level. Returns `false` when the name
    /// is not declared here. Re-binding an equal value notifies nobody.
    pub fn bind_local(&self, name: &str, value: Value) -> bool {
        match self.locals.iter().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                if slot.peek() != value {
                    slot.update(value);
                }
                true
            }
            None => false,
        }
    }

    /// Bind this level's locals positionally. Missing values bind `Null`;
    /// extra values are ignored.
    pub fn bind_locals(&self, values: &[Value]) {
        for (index, (_, slot)) in self.locals.iter().enumerate() {
            let value = values.get(index).cloned().unwrap_or_default();
            if slot.peek() != value {
                slot.update(value);
            }
        }
    }

    pub fn bind_block(&self, name: impl Into<String>, block: Block) {
        self.blocks.borrow_mut().insert(name.into(), block);
    }

    /// The nearest block named `name`.
    pub fn get_block(&self, name: &str) -> Option<Block> {
        if let Some(block) = self.blocks.borrow().get(name) {
            return Some(block.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get_block(name))
    }

    /// Resolve the head of a path.
    ///
    /// Locals win over `self`; a `this` head names `self` explicitly.
    /// Returns the base reference and the number of segments it consumed.
    pub fn get_base(&self, path: &[String]) -> (ReferenceHandle, usize) {
        let null = || ConstReference::handle(Value::Null);
        match path.first().map(String::as_str) {
            Some("this") => (self.get_self().unwrap_or_else(null), 1),
            Some(head) => match self.get_local(head) {
                Some(local) => (local, 1),
                None => (self.get_self().unwrap_or_else(null), 0),
            },
            None => (self.get_self().unwrap_or_else(null), 0),
        }
    }
}

fn declare(names: &[String]) -> Vec<(String, Rc<RootReference>)> {
    names
        .iter()
        .map(|name| (name.clone(), RootReference::new(Value::Null)))
        .collect()
}
