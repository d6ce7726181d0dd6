#![forbid(unsafe_code)]

//! Templates and their rendered regions.

use std::fmt;
use std::rc::Rc;

use tessel_core::{Error, NodeId, Result};

use crate::bounds::Bounds;
use crate::builder::{Boundary, ElementStack};
use crate::frame::Frame;
use crate::helper::Helper;
use crate::morph::Morph;
use crate::morph::attr::AttrMorph;
use crate::morph::block::BlockHelperMorph;
use crate::morph::component::ComponentMorph;
use crate::morph::content::ContentMorph;
use crate::morph::list::ListMorph;
use crate::morph::yielded::YieldMorph;
use crate::syntax::{Expression, HashSyntax, StatementSyntax};

/// An immutable, shareable list of statements plus the names of the
/// block params it declares.
///
/// Two templates are the same template only if they are the same
/// allocation; see [`Template::same`].
pub struct Template {
    statements: Vec<StatementSyntax>,
    locals: Vec<String>,
}

impl Template {
    pub fn new(statements: Vec<StatementSyntax>, locals: Vec<String>) -> Rc<Self> {
        Rc::new(Self { statements, locals })
    }

    pub fn statements(&self) -> &[StatementSyntax] {
        &self.statements
    }

    /// Block param names, bound positionally when the template is yielded to.
    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    pub fn same(a: &Rc<Self>, b: &Rc<Self>) -> bool {
        Rc::ptr_eq(a, b)
    }

    /// Evaluate every statement, inserting nodes into `parent` before
    /// `next_sibling`.
    pub fn render(
        self: &Rc<Self>,
        frame: &Frame,
        parent: NodeId,
        next_sibling: Option<NodeId>,
    ) -> Result<RenderResult> {
        let span = tessel_core::debug_span!("template.render", statements = self.statements.len());
        let _guard = span.enter();

        let mut stack = ElementStack::new(Rc::clone(frame.dom()), parent, next_sibling);
        let mut morphs: Vec<Box<dyn Morph>> = Vec::new();

        for statement in &self.statements {
            let mut morph: Box<dyn Morph> = match statement {
                StatementSyntax::Text(text) => {
                    stack.append_text(text);
                    continue;
                }
                StatementSyntax::Comment(text) => {
                    stack.append_comment(text);
                    continue;
                }
                StatementSyntax::OpenElement { tag, .. } => {
                    stack.open_element(tag);
                    continue;
                }
                StatementSyntax::CloseElement => {
                    stack.close_element()?;
                    continue;
                }
                StatementSyntax::StaticAttr {
                    name,
                    value,
                    namespace,
                } => {
                    stack.set_attribute(name, value, namespace.as_deref())?;
                    continue;
                }
                StatementSyntax::DynamicAttr {
                    name,
                    value,
                    namespace,
                } => {
                    let element = stack.current_element(name)?;
                    Box::new(AttrMorph::new(
                        frame,
                        element,
                        name,
                        namespace.clone(),
                        value.evaluate(frame)?,
                    ))
                }
                StatementSyntax::Append { value, trusting } => {
                    Box::new(ContentMorph::new(frame, value.evaluate(frame)?, *trusting))
                }
                StatementSyntax::Block {
                    path,
                    params,
                    hash,
                    template,
                    inverse,
                } => block_morph(frame, path, params, hash, template.as_ref(), inverse.as_ref())?,
                StatementSyntax::Component {
                    tag,
                    hash,
                    template,
                } => Box::new(ComponentMorph::new(frame, tag, hash, template.as_ref())?),
                StatementSyntax::Yield { to, params } => Box::new(YieldMorph::new(frame, to, params)?),
            };

            stack.begin_morph();
            morph.append(&mut stack)?;
            stack.end_morph(morphs.len(), morph.bounds().is_some());
            morphs.push(morph);
        }

        let (first, last) = stack.finish()?;
        tessel_core::trace!(morphs = morphs.len(), "template rendered");
        Ok(RenderResult {
            template: Rc::clone(self),
            frame: frame.clone(),
            parent,
            next_sibling,
            first,
            last,
            morphs,
        })
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("statements", &self.statements.len())
            .field("locals", &self.locals)
            .finish()
    }
}

fn block_morph(
    frame: &Frame,
    path: &[String],
    params: &[Expression],
    hash: &HashSyntax,
    template: Option<&Rc<Template>>,
    inverse: Option<&Rc<Template>>,
) -> Result<Box<dyn Morph>> {
    let name = path.join(".");
    match frame.env().lookup_helper(frame.scope(), path)? {
        Helper::Each => Ok(Box::new(ListMorph::new(
            frame, name, params, hash, template, inverse,
        )?)),
        Helper::Block(helper) => Ok(Box::new(BlockHelperMorph::new(
            frame, name, helper, params, hash, template, inverse,
        )?)),
        Helper::Inline(_) => Err(Error::HelperKind {
            path: name,
            expected: "a block helper",
        }),
    }
}

/// The live output of one template render: its morphs and the edges of
/// the region it occupies.
pub struct RenderResult {
    template: Rc<Template>,
    frame: Frame,
    parent: NodeId,
    next_sibling: Option<NodeId>,
    first: Option<Boundary>,
    last: Option<Boundary>,
    morphs: Vec<Box<dyn Morph>>,
}

impl RenderResult {
    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Morphs in statement order.
    pub fn morphs(&self) -> &[Box<dyn Morph>] {
        &self.morphs
    }

    /// Current region, or `None` if the template produced no nodes.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.resolve(self.first?, true)?;
        let last = self.resolve(self.last?, false)?;
        Some(Bounds::new(self.parent, first, last))
    }

    fn resolve(&self, boundary: Boundary, first: bool) -> Option<NodeId> {
        match boundary {
            Boundary::Node(node) => Some(node),
            Boundary::Morph(index) => {
                let bounds = self.morphs.get(index)?.bounds()?;
                Some(if first { bounds.first } else { bounds.last })
            }
        }
    }

    /// Update every morph, in statement order.
    pub fn rerender(&mut self) -> Result<()> {
        let span = tessel_core::trace_span!("template.rerender", morphs = self.morphs.len());
        let _guard = span.enter();
        for morph in &mut self.morphs {
            morph.update()?;
        }
        Ok(())
    }

    /// Show `template` in this region: the same template is re-rendered in
    /// place, a different one replaces the region.
    pub fn render_template(&mut self, template: &Rc<Template>) -> Result<()> {
        if Template::same(&self.template, template) {
            return self.rerender();
        }
        let next = self.clear();
        let fresh = template.render(&self.frame, self.parent, next)?;
        *self = fresh;
        Ok(())
    }

    /// Release every morph and remove the region's nodes. Returns the node
    /// that followed the region.
    pub fn clear(&mut self) -> Option<NodeId> {
        let bounds = self.bounds();
        self.destroy();
        match bounds {
            Some(bounds) => bounds.clear(&**self.frame.dom()),
            None => self.next_sibling,
        }
    }

    /// Release every morph's references. DOM nodes stay where they are.
    pub fn destroy(&mut self) {
        for morph in &mut self.morphs {
            morph.destroy();
        }
    }
}
