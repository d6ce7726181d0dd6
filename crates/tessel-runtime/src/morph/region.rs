#![forbid(unsafe_code)]

//! The shared machinery of every morph that renders a nested template.

use std::rc::Rc;

use tessel_core::{NodeId, Result};

use crate::bounds::Bounds;
use crate::frame::Frame;
use crate::morph::emptyable::Emptyable;
use crate::template::{RenderResult, Template};

/// Owns at most one rendered template inside an [`Emptyable`] region.
pub struct TemplateMorph {
    region: Emptyable,
    result: Option<RenderResult>,
}

impl TemplateMorph {
    /// A region anchored before `next` in `parent`, not yet showing anything.
    pub fn new(frame: &Frame, parent: NodeId, next: Option<NodeId>) -> Self {
        Self {
            region: Emptyable::new(
                Rc::clone(frame.dom()),
                frame.config().placeholder.clone(),
                parent,
                next,
            ),
            result: None,
        }
    }

    pub fn template(&self) -> Option<&Rc<Template>> {
        self.result.as_ref().map(RenderResult::template)
    }

    pub fn result(&self) -> Option<&RenderResult> {
        self.result.as_ref()
    }

    pub fn result_mut(&mut self) -> Option<&mut RenderResult> {
        self.result.as_mut()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.region.bounds()
    }

    /// Show `template` rendered in `frame`: the template already shown is
    /// re-rendered in place, anything else is replaced.
    pub fn show(&mut self, template: &Rc<Template>, frame: &Frame) -> Result<()> {
        match self.template() {
            Some(current) if Template::same(current, template) => self.rerender(),
            _ => self.replace(template, frame),
        }
    }

    /// Render `template` fresh, replacing whatever the region showed.
    pub fn replace(&mut self, template: &Rc<Template>, frame: &Frame) -> Result<()> {
        if let Some(mut old) = self.result.take() {
            old.destroy();
        }
        let (parent, next) = self.region.insertion_point();
        let fresh = template.render(frame, parent, next)?;
        match fresh.bounds() {
            Some(bounds) => self.region.did_insert_content(bounds),
            None => self.region.did_become_empty(),
        }
        self.result = Some(fresh);
        Ok(())
    }

    /// Update the current template's morphs in place.
    pub fn rerender(&mut self) -> Result<()> {
        let Some(result) = self.result.as_mut() else {
            return Ok(());
        };
        result.rerender()?;
        if let Some(bounds) = result.bounds() {
            self.region.did_update_content(bounds);
        }
        Ok(())
    }

    /// Drop the current template and show the placeholder.
    pub fn empty(&mut self) {
        if let Some(mut old) = self.result.take() {
            old.destroy();
        }
        self.region.did_become_empty();
    }

    /// Release the current template's references.
    pub fn destroy(&mut self) {
        if let Some(result) = self.result.as_mut() {
            result.destroy();
        }
    }

    /// Destroy and remove every node, placeholder included. Returns the
    /// node that followed the region.
    pub fn teardown(&mut self) -> Option<NodeId> {
        if let Some(mut old) = self.result.take() {
            old.destroy();
        }
        self.region.clear()
    }
}
