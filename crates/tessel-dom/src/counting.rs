#![forbid(unsafe_code)]

//! Mutation-counting DOM decorator.
//!
//! Wraps any [`DomHelper`] and counts the mutations that flow through it.
//! Used to check that an update touched only what it had to: re-rendering
//! unchanged data must report zero structural mutations.
//!
//! ```
//! use std::rc::Rc;
//! use tessel_dom::{CountingDom, Document, DomHelper};
//!
//! let doc = Rc::new(Document::new());
//! let dom = CountingDom::new(doc.clone());
//! let root = doc.create_root("div");
//! let text = dom.create_text_node("hi");
//! dom.insert_before(root, text, None);
//! assert_eq!(dom.stats().inserted, 1);
//!
//! dom.reset();
//! dom.set_node_value(text, "bye");
//! assert_eq!(dom.stats().structural(), 0);
//! assert_eq!(dom.stats().text_writes, 1);
//! ```

use std::cell::Cell;

use tessel_core::NodeId;

use crate::helper::DomHelper;

/// Mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomStats {
    /// Elements, text, comment and raw nodes created.
    pub created: u64,
    /// `insert_before` calls, including moves.
    pub inserted: u64,
    /// `remove_child` calls.
    pub removed: u64,
    /// Attribute sets and removals.
    pub attributes: u64,
    /// `set_node_value` calls.
    pub text_writes: u64,
}

impl DomStats {
    /// Insertions plus removals.
    #[inline]
    pub const fn structural(&self) -> u64 {
        self.inserted + self.removed
    }
}

/// A [`DomHelper`] that counts what passes through it.
#[derive(Debug, Default)]
pub struct CountingDom<D> {
    inner: D,
    created: Cell<u64>,
    inserted: Cell<u64>,
    removed: Cell<u64>,
    attributes: Cell<u64>,
    text_writes: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

impl<D> CountingDom<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            created: Cell::new(0),
            inserted: Cell::new(0),
            removed: Cell::new(0),
            attributes: Cell::new(0),
            text_writes: Cell::new(0),
        }
    }

    /// Counters since creation or the last [`reset`](Self::reset).
    pub fn stats(&self) -> DomStats {
        DomStats {
            created: self.created.get(),
            inserted: self.inserted.get(),
            removed: self.removed.get(),
            attributes: self.attributes.get(),
            text_writes: self.text_writes.get(),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.created,
            &self.inserted,
            &self.removed,
            &self.attributes,
            &self.text_writes,
        ] {
            counter.set(0);
        }
    }

    #[inline]
    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: DomHelper> DomHelper for CountingDom<D> {
    fn create_element(&self, tag: &str, context: Option<NodeId>) -> NodeId {
        bump(&self.created);
        self.inner.create_element(tag, context)
    }

    fn create_text_node(&self, text: &str) -> NodeId {
        bump(&self.created);
        self.inner.create_text_node(text)
    }

    fn create_comment(&self, text: &str) -> NodeId {
        bump(&self.created);
        self.inner.create_comment(text)
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        bump(&self.inserted);
        self.inner.insert_before(parent, node, reference);
    }

    fn remove_child(&self, parent: NodeId, node: NodeId) {
        bump(&self.removed);
        self.inner.remove_child(parent, node);
    }

    fn set_attribute(&self, element: NodeId, name: &str, value: &str) {
        bump(&self.attributes);
        self.inner.set_attribute(element, name, value);
    }

    fn set_attribute_ns(&self, element: NodeId, name: &str, value: &str, namespace: &str) {
        bump(&self.attributes);
        self.inner.set_attribute_ns(element, name, value, namespace);
    }

    fn remove_attribute(&self, element: NodeId, name: &str) {
        bump(&self.attributes);
        self.inner.remove_attribute(element, name);
    }

    fn set_node_value(&self, node: NodeId, text: &str) {
        bump(&self.text_writes);
        self.inner.set_node_value(node, text);
    }

    fn insert_html_before(
        &self,
        parent: NodeId,
        html: &str,
        reference: Option<NodeId>,
    ) -> Option<(NodeId, NodeId)> {
        let inserted = self.inner.insert_html_before(parent, html, reference);
        if inserted.is_some() {
            bump(&self.created);
            bump(&self.inserted);
        }
        inserted
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent_node(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.inner.next_sibling(node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.inner.first_child(node)
    }
}
