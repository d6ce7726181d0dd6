#![forbid(unsafe_code)]

//! A region that stays anchored in the DOM while it has no content.

use std::rc::Rc;

use tessel_core::NodeId;
use tessel_dom::DomHelper;

use crate::bounds::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing inserted yet; content goes before `next`.
    Appending {
        parent: NodeId,
        next: Option<NodeId>,
    },
    /// A placeholder comment marks the spot.
    Empty { parent: NodeId, comment: NodeId },
    HasContent(Bounds),
}

/// Tracks where a region's content lives and swaps in a placeholder
/// comment whenever the content goes away.
pub struct Emptyable {
    dom: Rc<dyn DomHelper>,
    placeholder: String,
    state: State,
}

impl Emptyable {
    pub fn new(
        dom: Rc<dyn DomHelper>,
        placeholder: impl Into<String>,
        parent: NodeId,
        next: Option<NodeId>,
    ) -> Self {
        Self {
            dom,
            placeholder: placeholder.into(),
            state: State::Appending { parent, next },
        }
    }

    /// Where new content must be inserted: before the region's first node.
    pub fn insertion_point(&self) -> (NodeId, Option<NodeId>) {
        match self.state {
            State::Appending { parent, next } => (parent, next),
            State::Empty { parent, comment } => (parent, Some(comment)),
            State::HasContent(bounds) => (bounds.parent, Some(bounds.first)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, State::Empty { .. })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self.state {
            State::Appending { .. } => None,
            State::Empty { parent, comment } => Some(Bounds::single(parent, comment)),
            State::HasContent(bounds) => Some(bounds),
        }
    }

    /// New content was inserted at [`insertion_point`](Self::insertion_point);
    /// whatever was there before is removed.
    pub fn did_insert_content(&mut self, bounds: Bounds) {
        match self.state {
            State::Appending { .. } => {}
            State::Empty { parent, comment } => self.dom.remove_child(parent, comment),
            State::HasContent(old) => {
                if old != bounds {
                    old.clear(&*self.dom);
                }
            }
        }
        self.state = State::HasContent(bounds);
    }

    /// The same content was updated in place and its edges may have moved.
    pub fn did_update_content(&mut self, bounds: Bounds) {
        if let State::Empty { parent, comment } = self.state {
            self.dom.remove_child(parent, comment);
        }
        self.state = State::HasContent(bounds);
    }

    /// The content is gone; remove what is left and insert the placeholder.
    pub fn did_become_empty(&mut self) {
        let (parent, next) = match self.state {
            State::Empty { .. } => return,
            State::Appending { parent, next } => (parent, next),
            State::HasContent(bounds) => (bounds.parent, bounds.clear(&*self.dom)),
        };
        let comment = self.dom.create_comment(&self.placeholder);
        self.dom.insert_before(parent, comment, next);
        self.state = State::Empty { parent, comment };
    }

    /// Remove every node of the region, placeholder included. The region
    /// returns to appending at the spot it vacated, whose next node is
    /// returned.
    pub fn clear(&mut self) -> Option<NodeId> {
        let (parent, next) = match self.state {
            State::Appending { parent, next } => (parent, next),
            State::Empty { parent, comment } => {
                let next = self.dom.next_sibling(comment);
                self.dom.remove_child(parent, comment);
                (parent, next)
            }
            State::HasContent(bounds) => (bounds.parent, bounds.clear(&*self.dom)),
        };
        self.state = State::Appending { parent, next };
        next
    }
}
