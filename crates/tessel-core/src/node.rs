#![forbid(unsafe_code)]

//! Opaque node handles.

use std::fmt;

/// Handle to a platform node (element, text, comment or raw markup).
///
/// Handles are issued by a DOM adapter and are only meaningful to the
/// adapter that issued them. They are plain integers so morphs can keep
/// them without borrowing the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw slot index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw slot index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Slot index as `usize` for arena lookups.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
