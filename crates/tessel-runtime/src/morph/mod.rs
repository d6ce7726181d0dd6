#![forbid(unsafe_code)]

//! Morphs: the live objects that own one dynamic statement's output.
//!
//! | statement | morph |
//! |---|---|
//! | `append` | [`content::ContentMorph`] |
//! | `dynamic-attr` | [`attr::AttrMorph`] |
//! | `block` (helper) | [`block::BlockHelperMorph`] |
//! | `block` (`each`) | [`list::ListMorph`] |
//! | `component` | [`component::ComponentMorph`] |
//! | `yield` | [`yielded::YieldMorph`] |
//!
//! Morphs that render nested templates share [`region::TemplateMorph`],
//! which keeps an [`emptyable::Emptyable`] region anchored even when it
//! has no content.

pub mod attr;
pub mod block;
pub mod component;
pub mod content;
pub mod emptyable;
pub mod list;
pub mod region;
pub mod yielded;

use std::sync::atomic::{AtomicU64, Ordering};

use tessel_core::Result;

use crate::bounds::Bounds;
use crate::builder::ElementStack;

use self::list::ListMorph;

/// Process-unique morph identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MorphId(u64);

impl MorphId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One dynamic statement's output.
pub trait Morph {
    fn id(&self) -> MorphId;

    /// Short name for diagnostics.
    fn kind(&self) -> &'static str;

    /// Produce the initial output at the stack's insertion point.
    fn append(&mut self, stack: &mut ElementStack) -> Result<()>;

    /// Bring the output up to date with its references.
    fn update(&mut self) -> Result<()>;

    /// Release references. DOM removal is the region owner's job.
    fn destroy(&mut self);

    /// Nodes currently owned, or `None` for morphs that own no nodes.
    fn bounds(&self) -> Option<Bounds>;

    /// Downcast for list introspection.
    fn as_list(&self) -> Option<&ListMorph> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::MorphId;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = MorphId::next();
        let b = MorphId::next();
        assert!(b > a);
        assert_ne!(a.raw(), b.raw());
    }
}
