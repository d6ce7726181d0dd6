#![forbid(unsafe_code)]

//! In-memory document.
//!
//! An arena of nodes linked as a tree. It implements [`DomHelper`] so the
//! engine can render headless, and offers read accessors plus HTML
//! serialization for assertions.
//!
//! Removed nodes stay in the arena: a handle is never reissued, so a
//! stale handle held by a destroyed morph can never alias a live node.
//!
//! ```
//! use tessel_dom::{Document, DomHelper};
//!
//! let doc = Document::new();
//! let root = doc.create_root("div");
//! let p = doc.create_element("p", Some(root));
//! doc.insert_before(root, p, None);
//! let text = doc.create_text_node("a < b");
//! doc.insert_before(p, text, None);
//! assert_eq!(doc.inner_html(root), "<p>a &lt; b</p>");
//! ```

use std::cell::RefCell;
use std::fmt::Write as _;

use smallvec::SmallVec;
use tessel_core::NodeId;

use crate::helper::DomHelper;
use crate::namespace::{Namespace, namespace_for};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    name: String,
    value: String,
    namespace: Option<String>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        namespace: Namespace,
        attributes: SmallVec<[Attribute; 4]>,
    },
    Text(String),
    Comment(String),
    /// Trusted markup kept verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else {
            return;
        };
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    fn insert(&mut self, parent: NodeId, id: NodeId, reference: Option<NodeId>) {
        if reference == Some(id) {
            return;
        }
        self.detach(id);
        let reference = reference.filter(|r| {
            let ok = self.node(*r).parent == Some(parent);
            debug_assert!(ok, "reference node {r} is not a child of {parent}");
            ok
        });
        let prev = match reference {
            Some(r) => self.node(r).prev_sibling,
            None => self.node(parent).last_child,
        };
        {
            let node = self.node_mut(id);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        match reference {
            Some(r) => self.node_mut(r).prev_sibling = Some(id),
            None => self.node_mut(parent).last_child = Some(id),
        }
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(id).first_child;
        while let Some(child) = current {
            out.push(child);
            current = self.node(child).next_sibling;
        }
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
            NodeKind::Raw(html) => out.push_str(html),
            NodeKind::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) && self.node(id).first_child.is_none() {
                    return;
                }
                for child in self.children(id) {
                    self.serialize(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Arena-backed DOM.
#[derive(Debug, Default)]
pub struct Document {
    arena: RefCell<Arena>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached HTML element to render into.
    pub fn create_root(&self, tag: &str) -> NodeId {
        self.create_element(tag, None)
    }

    /// Number of nodes ever created.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena.borrow().children(node)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Element { namespace, .. } => Some(*namespace),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.clone()),
            _ => None,
        }
    }

    pub fn attribute_namespace(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .and_then(|a| a.namespace.clone()),
            _ => None,
        }
    }

    /// Content of a text, comment or raw node.
    pub fn node_value(&self, node: NodeId) -> Option<String> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Text(s) | NodeKind::Comment(s) | NodeKind::Raw(s) => Some(s.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn is_comment(&self, node: NodeId) -> bool {
        matches!(self.arena.borrow().node(node).kind, NodeKind::Comment(_))
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.arena.borrow().node(node).parent.is_some()
    }

    /// Serialize a node and its subtree.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().serialize(node, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_html(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        for child in arena.children(node) {
            arena.serialize(child, &mut out);
        }
        out
    }
}

impl DomHelper for Document {
    fn create_element(&self, tag: &str, context: Option<NodeId>) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let context = context.and_then(|ctx| match &arena.node(ctx).kind {
            NodeKind::Element { tag, namespace, .. } => Some((*namespace, tag.clone())),
            _ => None,
        });
        let namespace = namespace_for(tag, context.as_ref().map(|(ns, t)| (*ns, t.as_str())));
        arena.alloc(NodeKind::Element {
            tag: tag.to_owned(),
            namespace,
            attributes: SmallVec::new(),
        })
    }

    fn create_text_node(&self, text: &str) -> NodeId {
        self.arena.borrow_mut().alloc(NodeKind::Text(text.to_owned()))
    }

    fn create_comment(&self, text: &str) -> NodeId {
        self.arena.borrow_mut().alloc(NodeKind::Comment(text.to_owned()))
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        self.arena.borrow_mut().insert(parent, node, reference);
    }

    fn remove_child(&self, parent: NodeId, node: NodeId) {
        let mut arena = self.arena.borrow_mut();
        debug_assert_eq!(arena.node(node).parent, Some(parent), "{node} is not a child of {parent}");
        arena.detach(node);
    }

    fn set_attribute(&self, element: NodeId, name: &str, value: &str) {
        set_attr(&mut self.arena.borrow_mut(), element, name, value, None);
    }

    fn set_attribute_ns(&self, element: NodeId, name: &str, value: &str, namespace: &str) {
        set_attr(
            &mut self.arena.borrow_mut(),
            element,
            name,
            value,
            Some(namespace),
        );
    }

    fn remove_attribute(&self, element: NodeId, name: &str) {
        if let NodeKind::Element { attributes, .. } =
            &mut self.arena.borrow_mut().node_mut(element).kind
        {
            attributes.retain(|a| a.name != name);
        }
    }

    fn set_node_value(&self, node: NodeId, text: &str) {
        match &mut self.arena.borrow_mut().node_mut(node).kind {
            NodeKind::Text(s) | NodeKind::Comment(s) | NodeKind::Raw(s) => {
                s.clear();
                s.push_str(text);
            }
            NodeKind::Element { .. } => debug_assert!(false, "{node} has no node value"),
        }
    }

    fn insert_html_before(
        &self,
        parent: NodeId,
        html: &str,
        reference: Option<NodeId>,
    ) -> Option<(NodeId, NodeId)> {
        if html.is_empty() {
            return None;
        }
        let mut arena = self.arena.borrow_mut();
        let raw = arena.alloc(NodeKind::Raw(html.to_owned()));
        arena.insert(parent, raw, reference);
        Some((raw, raw))
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().node(node).parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().node(node).next_sibling
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().node(node).first_child
    }
}

fn set_attr(arena: &mut Arena, element: NodeId, name: &str, value: &str, namespace: Option<&str>) {
    let NodeKind::Element { attributes, .. } = &mut arena.node_mut(element).kind else {
        debug_assert!(false, "{element} is not an element");
        return;
    };
    if let Some(existing) = attributes.iter_mut().find(|a| a.name == name) {
        existing.value = value.to_owned();
        existing.namespace = namespace.map(str::to_owned);
    } else {
        attributes.push(Attribute {
            name: name.to_owned(),
            value: value.to_owned(),
            namespace: namespace.map(str::to_owned),
        });
    }
}
