#![forbid(unsafe_code)]

//! Component invocations.
//!
//! A component renders its registered layout in a fresh root scope whose
//! `self` is the object built from the invocation's hash. The block passed
//! at the call site becomes the layout's `default` block and renders in
//! the caller's scope when the layout yields.

use std::rc::Rc;

use tessel_core::{Error, HashReference, Reference, ReferenceHandle, Result};

use crate::bounds::Bounds;
use crate::builder::ElementStack;
use crate::frame::Frame;
use crate::morph::region::TemplateMorph;
use crate::morph::{Morph, MorphId};
use crate::scope::{Block, Scope};
use crate::syntax::{HashSyntax, StatementSyntax, evaluate_hash};
use crate::template::Template;

pub struct ComponentMorph {
    id: MorphId,
    tag: String,
    layout: Rc<Template>,
    frame: Frame,
    attrs: Rc<HashReference>,
    region: Option<TemplateMorph>,
}

impl ComponentMorph {
    pub fn new(
        frame: &Frame,
        tag: &str,
        hash: &HashSyntax,
        template: Option<&Rc<Template>>,
    ) -> Result<Self> {
        let definition = frame
            .env()
            .component_definition(frame.scope(), tag)
            .ok_or_else(|| Error::ComponentNotFound {
                tag: tag.to_owned(),
            })?;
        validate_layout(tag, &definition.layout)?;

        let attrs = HashReference::new(evaluate_hash(frame, hash)?);
        let self_ref: ReferenceHandle = attrs.clone();
        let scope = Scope::top_level(Some(self_ref), definition.layout.locals());
        if let Some(template) = template {
            scope.bind_block(
                "default",
                Block {
                    template: Rc::clone(template),
                    frame: frame.clone(),
                },
            );
        }

        Ok(Self {
            id: MorphId::next(),
            tag: tag.to_owned(),
            layout: definition.layout,
            frame: frame.with_scope(scope),
            attrs,
            region: None,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// A layout must have exactly one root element and nothing else at the
/// root except whitespace and comments.
pub fn validate_layout(tag: &str, layout: &Template) -> Result<()> {
    let invalid = |reason: String| Error::InvalidComponentLayout {
        tag: tag.to_owned(),
        reason,
    };
    let mut depth = 0usize;
    let mut roots = 0usize;
    for statement in layout.statements() {
        match statement {
            StatementSyntax::OpenElement { tag: element, .. } => {
                if depth == 0 {
                    roots += 1;
                    if roots > 1 {
                        return Err(invalid(format!("second root element <{element}>")));
                    }
                }
                depth += 1;
            }
            StatementSyntax::CloseElement => depth = depth.saturating_sub(1),
            StatementSyntax::Text(text) if depth == 0 && !text.trim().is_empty() => {
                return Err(invalid(format!("text {text:?} outside the root element")));
            }
            other if depth == 0 && other.is_dynamic() => {
                return Err(invalid(format!("`{}` outside the root element", other.name())));
            }
            _ => {}
        }
    }
    if roots == 0 {
        return Err(invalid("no root element".to_owned()));
    }
    Ok(())
}

impl Morph for ComponentMorph {
    fn id(&self) -> MorphId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "component"
    }

    fn append(&mut self, stack: &mut ElementStack) -> Result<()> {
        let mut region = TemplateMorph::new(&self.frame, stack.element(), stack.next_sibling());
        region.replace(&self.layout, &self.frame)?;
        self.region = Some(region);
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        match self.region.as_mut() {
            Some(region) => region.rerender(),
            None => Ok(()),
        }
    }

    fn destroy(&mut self) {
        self.attrs.destroy();
        if let Some(region) = self.region.as_mut() {
            region.destroy();
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        self.region.as_ref().and_then(TemplateMorph::bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Expression;

    fn layout(statements: Vec<StatementSyntax>) -> Rc<Template> {
        Template::new(statements, vec![])
    }

    fn open(tag: &str) -> StatementSyntax {
        StatementSyntax::OpenElement {
            tag: tag.to_owned(),
            block_params: Vec::new(),
        }
    }

    #[test]
    fn single_root_with_whitespace_is_valid() {
        let ok = layout(vec![
            StatementSyntax::Text("\n  ".into()),
            StatementSyntax::Comment("note".into()),
            open("div"),
            StatementSyntax::Append {
                value: Expression::Get(vec!["title".into()]),
                trusting: false,
            },
            StatementSyntax::CloseElement,
            StatementSyntax::Text("\n".into()),
        ]);
        assert!(validate_layout("x-card", &ok).is_ok());
    }

    #[test]
    fn rejects_invalid_roots() {
        let two_roots = layout(vec![
            open("a"),
            StatementSyntax::CloseElement,
            open("b"),
            StatementSyntax::CloseElement,
        ]);
        let stray_text = layout(vec![
            StatementSyntax::Text("hi".into()),
            open("a"),
            StatementSyntax::CloseElement,
        ]);
        let stray_yield = layout(vec![
            open("a"),
            StatementSyntax::CloseElement,
            StatementSyntax::Yield {
                to: "default".into(),
                params: vec![],
            },
        ]);
        for bad in [two_roots, stray_text, stray_yield, layout(vec![])] {
            assert!(matches!(
                validate_layout("x-card", &bad),
                Err(Error::InvalidComponentLayout { .. })
            ));
        }
    }
}
