#![forbid(unsafe_code)]

//! DOM adapter layer: the [`DomHelper`] primitives the render engine
//! consumes, SVG/HTML namespace resolution, an in-memory [`Document`] and
//! a mutation-counting decorator.

pub mod counting;
pub mod document;
pub mod helper;
pub mod namespace;

pub use counting::{CountingDom, DomStats};
pub use document::Document;
pub use helper::DomHelper;
pub use namespace::Namespace;
pub use tessel_core::NodeId;
