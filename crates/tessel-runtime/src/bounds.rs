#![forbid(unsafe_code)]

//! Contiguous DOM regions.

use tessel_core::NodeId;
use tessel_dom::DomHelper;
use tessel_dom::helper::sibling_range;

/// `first..=last` are siblings under `parent` and owned by one morph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub parent: NodeId,
    pub first: NodeId,
    pub last: NodeId,
}

impl Bounds {
    pub const fn new(parent: NodeId, first: NodeId, last: NodeId) -> Self {
        Self {
            parent,
            first,
            last,
        }
    }

    /// A region made of one node.
    pub const fn single(parent: NodeId, node: NodeId) -> Self {
        Self::new(parent, node, node)
    }

    /// The nodes in the region, in order.
    pub fn nodes(&self, dom: &dyn DomHelper) -> Vec<NodeId> {
        sibling_range(dom, self.first, self.last)
    }

    /// The node after the region, if any.
    pub fn following(&self, dom: &dyn DomHelper) -> Option<NodeId> {
        dom.next_sibling(self.last)
    }

    /// Remove every node of the region and return the node that followed it.
    pub fn clear(&self, dom: &dyn DomHelper) -> Option<NodeId> {
        let next = self.following(dom);
        for node in self.nodes(dom) {
            dom.remove_child(self.parent, node);
        }
        next
    }

    /// Move the whole region before `reference` (or to the end of the parent).
    pub fn move_before(&self, dom: &dyn DomHelper, reference: Option<NodeId>) {
        for node in self.nodes(dom) {
            dom.insert_before(self.parent, node, reference);
        }
    }
}
