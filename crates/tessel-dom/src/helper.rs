#![forbid(unsafe_code)]

//! The primitives the render engine needs from a DOM.

use std::rc::Rc;

use tessel_core::NodeId;

/// Create, insert and remove platform nodes.
///
/// Methods take `&self`: adapters are shared by every morph of a render
/// and keep their own interior mutability. Implementations may assume
/// handles passed in were issued by themselves.
pub trait DomHelper {
    /// Create an element. The namespace is resolved from `context`, the
    /// element the new one will be inserted into.
    fn create_element(&self, tag: &str, context: Option<NodeId>) -> NodeId;

    fn create_text_node(&self, text: &str) -> NodeId;

    fn create_comment(&self, text: &str) -> NodeId;

    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A node that already has a parent is moved.
    fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>);

    fn remove_child(&self, parent: NodeId, node: NodeId);

    fn set_attribute(&self, element: NodeId, name: &str, value: &str);

    fn set_attribute_ns(&self, element: NodeId, name: &str, value: &str, namespace: &str);

    fn remove_attribute(&self, element: NodeId, name: &str);

    /// Replace the content of a text or comment node.
    fn set_node_value(&self, node: NodeId, text: &str);

    /// Parse trusted markup and insert the resulting nodes before
    /// `reference`. Returns the first and last inserted node, or `None`
    /// when the markup produced nothing.
    fn insert_html_before(
        &self,
        parent: NodeId,
        html: &str,
        reference: Option<NodeId>,
    ) -> Option<(NodeId, NodeId)>;

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn first_child(&self, node: NodeId) -> Option<NodeId>;
}

impl<T: DomHelper + ?Sized> DomHelper for Rc<T> {
    fn create_element(&self, tag: &str, context: Option<NodeId>) -> NodeId {
        (**self).create_element(tag, context)
    }

    fn create_text_node(&self, text: &str) -> NodeId {
        (**self).create_text_node(text)
    }

    fn create_comment(&self, text: &str) -> NodeId {
        (**self).create_comment(text)
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        (**self).insert_before(parent, node, reference)
    }

    fn remove_child(&self, parent: NodeId, node: NodeId) {
        (**self).remove_child(parent, node)
    }

    fn set_attribute(&self, element: NodeId, name: &str, value: &str) {
        (**self).set_attribute(element, name, value)
    }

    fn set_attribute_ns(&self, element: NodeId, name: &str, value: &str, namespace: &str) {
        (**self).set_attribute_ns(element, name, value, namespace)
    }

    fn remove_attribute(&self, element: NodeId, name: &str) {
        (**self).remove_attribute(element, name)
    }

    fn set_node_value(&self, node: NodeId, text: &str) {
        (**self).set_node_value(node, text)
    }

    fn insert_html_before(
        &self,
        parent: NodeId,
        html: &str,
        reference: Option<NodeId>,
    ) -> Option<(NodeId, NodeId)> {
        (**self).insert_html_before(parent, html, reference)
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        (**self).parent_node(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        (**self).next_sibling(node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        (**self).first_child(node)
    }
}

/// Nodes from `first` through `last` inclusive, in sibling order.
///
/// Collected up front so callers can move or remove them while iterating.
pub fn sibling_range(dom: &dyn DomHelper, first: NodeId, last: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut current = Some(first);
    while let Some(node) = current {
        nodes.push(node);
        if node == last {
            break;
        }
        current = dom.next_sibling(node);
    }
    nodes
}
