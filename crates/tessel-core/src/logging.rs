#![forbid(unsafe_code)]

//! Logging facade for the render engine.
//!
//! With the `tracing` feature the usual `tracing` macros are re-exported.
//! Without it every macro expands to nothing (spans expand to a guard
//! that does nothing), so call sites never need their own `cfg` gates
//! for plain events.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, trace, trace_span, warn};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Expands to nothing when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Expands to nothing when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Expands to nothing when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// Expands to a [`DisabledSpan`](crate::logging::DisabledSpan).
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }

    /// Expands to a [`DisabledSpan`](crate::logging::DisabledSpan).
    #[macro_export]
    macro_rules! trace_span {
        ($($arg:tt)*) => {
            $crate::logging::DisabledSpan
        };
    }
}

/// Stand-in for `tracing::Span` when the feature is off.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    /// Entering a disabled span records nothing.
    #[inline]
    pub fn enter(&self) -> DisabledGuard {
        DisabledGuard
    }
}

/// Guard returned by [`DisabledSpan::enter`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct DisabledGuard;
