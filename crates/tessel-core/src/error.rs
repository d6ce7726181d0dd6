#![forbid(unsafe_code)]

//! Errors raised while decoding, rendering or updating templates.
//!
//! Every variant is fatal for the call that raised it. A failed `append`
//! or `update` may leave the region partially mutated; recovering (for
//! example by re-rendering from scratch) is up to the host.

use std::fmt;

/// Errors produced by the render engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A `close-element` without a matching `open-element`, or an element
    /// still open when its template finished.
    UnbalancedElement {
        /// What was unbalanced.
        detail: String,
    },
    /// An attribute statement evaluated with no element open.
    AttributeOutsideElement {
        /// Attribute name.
        name: String,
    },
    /// The keyed item list no longer forms a simple chain.
    ListCycle {
        /// Key of the item at which the walk detected the problem.
        key: String,
    },
    /// No helper is registered under the given path.
    HelperNotFound {
        /// Dotted helper path.
        path: String,
    },
    /// A helper was used where a different kind of helper was required
    /// (for example an inline helper invoked with a block).
    HelperKind {
        /// Dotted helper path.
        path: String,
        /// The kind the call site needed.
        expected: &'static str,
    },
    /// A helper reported a failure of its own.
    Helper {
        /// Dotted helper path.
        path: String,
        /// Message from the helper.
        message: String,
    },
    /// A value of an unsupported type reached a place that cannot render it.
    UnsupportedValue {
        /// Where the value was used.
        context: &'static str,
        /// Kind of the offending value.
        kind: &'static str,
    },
    /// No component is registered for a tag.
    ComponentNotFound {
        /// Component tag name.
        tag: String,
    },
    /// A component layout violates the single-root rules.
    InvalidComponentLayout {
        /// Component tag name.
        tag: String,
        /// The offending construct.
        reason: String,
    },
    /// A malformed statement or template in the wire format.
    Spec {
        /// Template index within the flat array.
        template: usize,
        /// Statement index within the template, if any.
        statement: Option<usize>,
        /// Description of the offending construct.
        message: String,
    },
}

impl Error {
    /// Build a wire-format error.
    pub fn spec(template: usize, statement: Option<usize>, message: impl Into<String>) -> Self {
        Self::Spec {
            template,
            statement,
            message: message.into(),
        }
    }

    /// Build an unbalanced-element error.
    pub fn unbalanced(detail: impl Into<String>) -> Self {
        Self::UnbalancedElement {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedElement { detail } => write!(f, "unbalanced element: {detail}"),
            Self::AttributeOutsideElement { name } => {
                write!(f, "attribute `{name}` set with no open element")
            }
            Self::ListCycle { key } => write!(f, "cycle in keyed list at item `{key}`"),
            Self::HelperNotFound { path } => write!(f, "no helper named `{path}`"),
            Self::HelperKind { path, expected } => {
                write!(f, "helper `{path}` cannot be used as {expected}")
            }
            Self::Helper { path, message } => write!(f, "helper `{path}` failed: {message}"),
            Self::UnsupportedValue { context, kind } => {
                write!(f, "cannot use a {kind} value as {context}")
            }
            Self::ComponentNotFound { tag } => write!(f, "no component named `{tag}`"),
            Self::InvalidComponentLayout { tag, reason } => {
                write!(f, "invalid layout for component `{tag}`: {reason}")
            }
            Self::Spec {
                template,
                statement: Some(statement),
                message,
            } => write!(f, "template {template}, statement {statement}: {message}"),
            Self::Spec {
                template,
                statement: None,
                message,
            } => write!(f, "template {template}: {message}"),
        }
    }
}

impl std::error::Error for Error {}

/// Standard result type for tessel APIs.
pub type Result<T> = std::result::Result<T, Error>;
