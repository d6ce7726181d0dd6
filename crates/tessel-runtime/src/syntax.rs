#![forbid(unsafe_code)]

//! Statement and expression syntax of a decoded template.

use std::rc::Rc;

use tessel_core::{ConcatReference, ConstReference, Error, PathReference, ReferenceHandle, Result, Value};

use crate::frame::Frame;
use crate::helper::{Helper, HelperReference};
use crate::template::Template;

/// Named arguments, in source order.
pub type HashSyntax = Vec<(String, Expression)>;

/// A value-producing expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal.
    Value(Value),
    /// A dotted path: a local, a zero-argument helper or a field of `self`.
    Get(Vec<String>),
    /// Parts joined as text.
    Concat(Vec<Expression>),
    /// An inline helper call.
    Helper {
        path: Vec<String>,
        params: Vec<Expression>,
        hash: HashSyntax,
    },
}

impl Expression {
    /// Build a fresh reference for this expression in `frame`.
    ///
    /// Every call returns a new reference owned by the caller, so tearing
    /// one morph down never detaches another morph's inputs.
    pub fn evaluate(&self, frame: &Frame) -> Result<ReferenceHandle> {
        match self {
            Self::Value(value) => Ok(ConstReference::handle(value.clone())),
            Self::Get(path) => {
                let scope = frame.scope();
                let env = frame.env();
                let is_local = path.first().is_some_and(|head| scope.has_local(head));
                if !is_local && env.has_helper(scope, path) {
                    return call_helper(frame, path, &[], &[]);
                }
                let (base, consumed) = scope.get_base(path);
                let handle: ReferenceHandle = PathReference::new(base, path[consumed..].to_vec());
                Ok(handle)
            }
            Self::Concat(parts) => {
                let parts = parts
                    .iter()
                    .map(|part| part.evaluate(frame))
                    .collect::<Result<Vec<_>>>()?;
                let handle: ReferenceHandle = ConcatReference::new(parts);
                Ok(handle)
            }
            Self::Helper { path, params, hash } => call_helper(frame, path, params, hash),
        }
    }
}

fn call_helper(
    frame: &Frame,
    path: &[String],
    params: &[Expression],
    hash: &[(String, Expression)],
) -> Result<ReferenceHandle> {
    let name = path.join(".");
    match frame.env().lookup_helper(frame.scope(), path)? {
        Helper::Inline(helper) => {
            let params = evaluate_params(frame, params)?;
            let hash = evaluate_hash(frame, hash)?;
            let handle: ReferenceHandle = HelperReference::new(name, helper, params, hash);
            Ok(handle)
        }
        Helper::Block(_) | Helper::Each => Err(Error::HelperKind {
            path: name,
            expected: "an inline helper",
        }),
    }
}

pub(crate) fn evaluate_params(frame: &Frame, params: &[Expression]) -> Result<Vec<ReferenceHandle>> {
    params.iter().map(|param| param.evaluate(frame)).collect()
}

pub(crate) fn evaluate_hash(
    frame: &Frame,
    hash: &[(String, Expression)],
) -> Result<Vec<(String, ReferenceHandle)>> {
    hash.iter()
        .map(|(name, expr)| Ok((name.clone(), expr.evaluate(frame)?)))
        .collect()
}

/// One statement of a template.
#[derive(Clone)]
pub enum StatementSyntax {
    Text(String),
    Comment(String),
    OpenElement {
        tag: String,
        /// `<div as |x|>` names. Decoded and kept; no element binds them.
        block_params: Vec<String>,
    },
    CloseElement,
    StaticAttr {
        name: String,
        value: String,
        namespace: Option<String>,
    },
    DynamicAttr {
        name: String,
        value: Expression,
        namespace: Option<String>,
    },
    /// `{{value}}`, or `{{{value}}}` when `trusting`.
    Append {
        value: Expression,
        trusting: bool,
    },
    /// A block helper invocation.
    Block {
        path: Vec<String>,
        params: Vec<Expression>,
        hash: HashSyntax,
        template: Option<Rc<Template>>,
        inverse: Option<Rc<Template>>,
    },
    /// A component invocation; `template` becomes the layout's default block.
    Component {
        tag: String,
        hash: HashSyntax,
        template: Option<Rc<Template>>,
    },
    /// Render a named block of the enclosing scope.
    Yield {
        to: String,
        params: Vec<Expression>,
    },
}

impl StatementSyntax {
    /// Whether evaluating the statement produces a morph.
    pub const fn is_dynamic(&self) -> bool {
        matches!(
            self,
            Self::DynamicAttr { .. }
                | Self::Append { .. }
                | Self::Block { .. }
                | Self::Component { .. }
                | Self::Yield { .. }
        )
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Comment(_) => "comment",
            Self::OpenElement { .. } => "open-element",
            Self::CloseElement => "close-element",
            Self::StaticAttr { .. } => "static-attr",
            Self::DynamicAttr { .. } => "dynamic-attr",
            Self::Append { .. } => "append",
            Self::Block { .. } => "block",
            Self::Component { .. } => "component",
            Self::Yield { .. } => "yield",
        }
    }
}
