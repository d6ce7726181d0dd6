#![forbid(unsafe_code)]

//! The element stack used while a template appends its nodes.

use std::rc::Rc;

use smallvec::SmallVec;
use tessel_core::{Error, NodeId, Result};
use tessel_dom::DomHelper;

/// One edge of a rendered region.
///
/// Morph boundaries are resolved lazily because a morph's nodes change
/// across updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Node(NodeId),
    /// Index of a morph within the owning render result.
    Morph(usize),
}

/// Whether node insertions currently land at the top level of the
/// template being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operations {
    TopLevel,
    Nested { depth: usize },
}

impl Operations {
    fn nest(self) -> Self {
        match self {
            Self::TopLevel => Self::Nested { depth: 1 },
            Self::Nested { depth } => Self::Nested { depth: depth + 1 },
        }
    }

    fn unnest(self) -> Self {
        match self {
            Self::TopLevel | Self::Nested { depth: 1 } => Self::TopLevel,
            Self::Nested { depth } => Self::Nested { depth: depth - 1 },
        }
    }
}

/// Appends nodes at an insertion point, tracking the open element chain
/// and the first and last top-level boundary.
pub struct ElementStack {
    dom: Rc<dyn DomHelper>,
    element: NodeId,
    next_sibling: Option<NodeId>,
    element_stack: SmallVec<[NodeId; 8]>,
    next_sibling_stack: SmallVec<[Option<NodeId>; 8]>,
    operations: Operations,
    in_morph: bool,
    first: Option<Boundary>,
    last: Option<Boundary>,
}

impl ElementStack {
    pub fn new(dom: Rc<dyn DomHelper>, parent: NodeId, next_sibling: Option<NodeId>) -> Self {
        Self {
            dom,
            element: parent,
            next_sibling,
            element_stack: SmallVec::new(),
            next_sibling_stack: SmallVec::new(),
            operations: Operations::TopLevel,
            in_morph: false,
            first: None,
            last: None,
        }
    }

    pub fn dom(&self) -> &Rc<dyn DomHelper> {
        &self.dom
    }

    /// The element new nodes are appended to.
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// The node new nodes are inserted before.
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn is_top_level(&self) -> bool {
        self.operations == Operations::TopLevel
    }

    pub fn open_element(&mut self, tag: &str) -> NodeId {
        let element = self.dom.create_element(tag, Some(self.element));
        self.insert(element);
        self.element_stack.push(self.element);
        self.next_sibling_stack.push(self.next_sibling);
        self.element = element;
        self.next_sibling = None;
        self.operations = self.operations.nest();
        element
    }

    pub fn close_element(&mut self) -> Result<NodeId> {
        let (Some(parent), Some(next)) = (self.element_stack.pop(), self.next_sibling_stack.pop())
        else {
            return Err(Error::unbalanced("close-element with no open element"));
        };
        let closed = self.element;
        self.element = parent;
        self.next_sibling = next;
        self.operations = self.operations.unnest();
        Ok(closed)
    }

    pub fn append_text(&mut self, text: &str) -> NodeId {
        let node = self.dom.create_text_node(text);
        self.insert(node);
        node
    }

    pub fn append_comment(&mut self, text: &str) -> NodeId {
        let node = self.dom.create_comment(text);
        self.insert(node);
        node
    }

    /// Insert a node the caller already owns.
    pub fn append_node(&mut self, node: NodeId) {
        self.insert(node);
    }

    /// Insert trusted markup; returns the first and last inserted node.
    pub fn append_html(&mut self, html: &str) -> Option<(NodeId, NodeId)> {
        let inserted = self
            .dom
            .insert_html_before(self.element, html, self.next_sibling)?;
        self.record(Boundary::Node(inserted.0), Boundary::Node(inserted.1));
        Some(inserted)
    }

    /// Set an attribute on the innermost open element.
    pub fn set_attribute(&mut self, name: &str, value: &str, namespace: Option<&str>) -> Result<()> {
        let element = self.current_element(name)?;
        match namespace {
            Some(ns) => self.dom.set_attribute_ns(element, name, value, ns),
            None => self.dom.set_attribute(element, name, value),
        }
        Ok(())
    }

    /// The innermost element opened by this stack, for attribute morphs.
    pub fn current_element(&self, attribute: &str) -> Result<NodeId> {
        if self.is_top_level() {
            return Err(Error::AttributeOutsideElement {
                name: attribute.to_owned(),
            });
        }
        Ok(self.element)
    }

    /// Suspend node recording while a morph appends its content.
    pub fn begin_morph(&mut self) {
        self.in_morph = true;
    }

    /// Resume recording; a top-level morph becomes a region boundary.
    pub fn end_morph(&mut self, index: usize, has_bounds: bool) {
        self.in_morph = false;
        if has_bounds {
            self.record(Boundary::Morph(index), Boundary::Morph(index));
        }
    }

    /// The first and last top-level boundary, or an error if an element is
    /// still open.
    pub fn finish(self) -> Result<(Option<Boundary>, Option<Boundary>)> {
        if !self.element_stack.is_empty() {
            return Err(Error::unbalanced(format!(
                "{} element(s) still open at end of template",
                self.element_stack.len()
            )));
        }
        Ok((self.first, self.last))
    }

    fn insert(&mut self, node: NodeId) {
        self.dom.insert_before(self.element, node, self.next_sibling);
        self.record(Boundary::Node(node), Boundary::Node(node));
    }

    fn record(&mut self, first: Boundary, last: Boundary) {
        if self.in_morph || !self.is_top_level() {
            return;
        }
        if self.first.is_none() {
            self.first = Some(first);
        }
        self.last = Some(last);
    }
}
