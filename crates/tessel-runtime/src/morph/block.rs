#![forbid(unsafe_code)]

//! Block helper invocations: `{{#if}}`, `{{#with}}` and user block helpers.

use std::rc::Rc;

use tessel_core::{Error, Result, ReferenceHandle, Value};

use crate::bounds::Bounds;
use crate::builder::ElementStack;
use crate::frame::Frame;
use crate::helper::{BlockHelperFn, read_hash, read_params};
use crate::morph::region::TemplateMorph;
use crate::morph::{Morph, MorphId};
use crate::syntax::{Expression, HashSyntax, evaluate_hash, evaluate_params};
use crate::template::Template;

/// A template plus the scope its block params are bound in.
///
/// The scope is created once; yielding again re-binds the same locals so
/// the template's morphs update instead of rebuilding.
pub struct YieldableTemplate {
    template: Rc<Template>,
    frame: Frame,
}

impl YieldableTemplate {
    pub fn new(template: &Rc<Template>, caller: &Frame) -> Self {
        Self {
            template: Rc::clone(template),
            frame: caller.child_scope(template.locals()),
        }
    }

    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn bind(&self, params: &[Value]) {
        self.frame.scope().bind_locals(params);
    }
}

/// Which template of a block was yielded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Default,
    Inverse,
}

/// The default and inverse templates of a block sharing one region.
pub(crate) struct Group {
    default: Option<YieldableTemplate>,
    inverse: Option<YieldableTemplate>,
    region: Option<TemplateMorph>,
    shown: Option<Branch>,
    yielded: Option<Branch>,
}

impl Group {
    pub(crate) fn new(frame: &Frame, template: Option<&Rc<Template>>, inverse: Option<&Rc<Template>>) -> Self {
        Self {
            default: template.map(|t| YieldableTemplate::new(t, frame)),
            inverse: inverse.map(|t| YieldableTemplate::new(t, frame)),
            region: None,
            shown: None,
            yielded: None,
        }
    }

    fn yield_branch(&mut self, path: &str, branch: Branch, params: &[Value]) -> Result<()> {
        if self.yielded.is_some() {
            return Err(Error::Helper {
                path: path.to_owned(),
                message: "a block can be yielded to once per render".to_owned(),
            });
        }
        let template = match branch {
            Branch::Default => self.default.as_ref(),
            Branch::Inverse => self.inverse.as_ref(),
        };
        let (Some(region), Some(template)) = (self.region.as_mut(), template) else {
            return Ok(());
        };
        template.bind(params);
        if self.shown == Some(branch) {
            region.rerender()?;
        } else {
            region.replace(template.template(), template.frame())?;
        }
        self.shown = Some(branch);
        self.yielded = Some(branch);
        Ok(())
    }
}

/// Handed to a block helper; decides what the block renders.
///
/// Yielding to a branch the block does not have renders nothing. A
/// helper that yields nothing leaves the block empty.
pub struct BlockOptions<'a> {
    path: &'a str,
    group: &'a mut Group,
}

impl BlockOptions<'_> {
    pub fn has_default(&self) -> bool {
        self.group.default.is_some()
    }

    pub fn has_inverse(&self) -> bool {
        self.group.inverse.is_some()
    }

    /// Render the main template with `params` bound to its block params.
    pub fn yield_default(&mut self, params: &[Value]) -> Result<()> {
        self.group.yield_branch(self.path, Branch::Default, params)
    }

    /// Render the `{{else}}` template.
    pub fn yield_inverse(&mut self, params: &[Value]) -> Result<()> {
        self.group.yield_branch(self.path, Branch::Inverse, params)
    }

    /// The branch yielded to so far in this invocation.
    pub fn yielded(&self) -> Option<Branch> {
        self.group.yielded
    }
}

/// Owns the output of one block helper invocation.
pub struct BlockHelperMorph {
    id: MorphId,
    frame: Frame,
    path: String,
    helper: Rc<BlockHelperFn>,
    params: Vec<ReferenceHandle>,
    hash: Vec<(String, ReferenceHandle)>,
    group: Group,
}

impl BlockHelperMorph {
    pub fn new(
        frame: &Frame,
        path: String,
        helper: Rc<BlockHelperFn>,
        params: &[Expression],
        hash: &HashSyntax,
        template: Option<&Rc<Template>>,
        inverse: Option<&Rc<Template>>,
    ) -> Result<Self> {
        Ok(Self {
            id: MorphId::next(),
            frame: frame.clone(),
            path,
            helper,
            params: evaluate_params(frame, params)?,
            hash: evaluate_hash(frame, hash)?,
            group: Group::new(frame, template, inverse),
        })
    }

    /// The branch currently rendered, if any.
    pub fn shown(&self) -> Option<Branch> {
        self.group.shown
    }

    fn run(&mut self) -> Result<()> {
        let params = read_params(&self.params)?;
        let hash = read_hash(&self.hash)?;
        self.group.yielded = None;
        let mut options = BlockOptions {
            path: &self.path,
            group: &mut self.group,
        };
        (self.helper)(&params, &hash, &mut options)?;

        if self.group.yielded.is_none() {
            if let Some(region) = self.group.region.as_mut() {
                region.empty();
            }
            self.group.shown = None;
        }
        tessel_core::trace!(helper = %self.path, shown = ?self.group.shown, "block helper ran");
        Ok(())
    }
}

impl Morph for BlockHelperMorph {
    fn id(&self) -> MorphId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "block"
    }

    fn append(&mut self, stack: &mut ElementStack) -> Result<()> {
        self.group.region = Some(TemplateMorph::new(
            &self.frame,
            stack.element(),
            stack.next_sibling(),
        ));
        self.run()
    }

    fn update(&mut self) -> Result<()> {
        if self.group.region.is_none() {
            return Ok(());
        }
        self.run()
    }

    fn destroy(&mut self) {
        for param in &self.params {
            param.destroy();
        }
        for (_, reference) in &self.hash {
            reference.destroy();
        }
        if let Some(region) = self.group.region.as_mut() {
            region.destroy();
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        self.group.region.as_ref().and_then(TemplateMorph::bounds)
    }
}
