#![forbid(unsafe_code)]

//! Core of the tessel render engine: values, node handles, the reference
//! graph and the shared error type.

pub mod error;
pub mod logging;
pub mod node;
pub mod reference;
pub mod value;

pub use error::{Error, Result};
pub use node::NodeId;
pub use reference::{
    ConcatReference, ConstReference, HashReference, PathReference, Reference, ReferenceHandle,
    RootReference,
};
pub use value::{SafeString, Value};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
