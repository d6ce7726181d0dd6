#![forbid(unsafe_code)]

//! `{{yield}}`: render a block handed down by the caller.

use tessel_core::{ReferenceHandle, Result};

use crate::bounds::Bounds;
use crate::builder::ElementStack;
use crate::frame::Frame;
use crate::helper::read_params;
use crate::morph::block::YieldableTemplate;
use crate::morph::region::TemplateMorph;
use crate::morph::{Morph, MorphId};
use crate::syntax::{Expression, evaluate_params};

/// Renders the scope's block named `to` in the block's own frame. A
/// missing block renders as an empty region.
pub struct YieldMorph {
    id: MorphId,
    frame: Frame,
    to: String,
    params: Vec<ReferenceHandle>,
    block: Option<YieldableTemplate>,
    region: Option<TemplateMorph>,
}

impl YieldMorph {
    pub fn new(frame: &Frame, to: &str, params: &[Expression]) -> Result<Self> {
        let block = frame
            .scope()
            .get_block(to)
            .map(|block| YieldableTemplate::new(&block.template, &block.frame));
        Ok(Self {
            id: MorphId::next(),
            frame: frame.clone(),
            to: to.to_owned(),
            params: evaluate_params(frame, params)?,
            block,
            region: None,
        })
    }

    pub fn block_name(&self) -> &str {
        &self.to
    }
}

impl Morph for YieldMorph {
    fn id(&self) -> MorphId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "yield"
    }

    fn append(&mut self, stack: &mut ElementStack) -> Result<()> {
        let mut region = TemplateMorph::new(&self.frame, stack.element(), stack.next_sibling());
        match &self.block {
            Some(block) => {
                block.bind(&read_params(&self.params)?);
                region.replace(block.template(), block.frame())?;
            }
            None => {
                tessel_core::debug!(block = %self.to, "yield to missing block");
                region.empty();
            }
        }
        self.region = Some(region);
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let (Some(region), Some(block)) = (self.region.as_mut(), self.block.as_ref()) else {
            return Ok(());
        };
        block.bind(&read_params(&self.params)?);
        region.rerender()
    }

    fn destroy(&mut self) {
        for param in &self.params {
            param.destroy();
        }
        if let Some(region) = self.region.as_mut() {
            region.destroy();
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        self.region.as_ref().and_then(TemplateMorph::bounds)
    }
}
