#![forbid(unsafe_code)]

//! tessel public facade crate.
//!
//! Re-exports the types a host needs from the internal crates and offers
//! [`View`], which pairs a rendered template with the data it reads, plus
//! a lightweight prelude.
//!
//! ```
//! use serde_json::json;
//!
//! let html = tessel::render_to_string(
//!     &json!({"statements": [
//!         ["open-element", "b", null],
//!         ["append", ["get", ["who"]], false],
//!         ["close-element"]
//!     ]}),
//!     json!({"who": "world"}),
//! )
//! .unwrap();
//! assert_eq!(html, "<b>world</b>");
//! ```

use std::rc::Rc;

// --- Core re-exports -------------------------------------------------------

pub use tessel_core::{
    ConcatReference, ConstReference, Error, HashReference, NodeId, PathReference, Reference,
    ReferenceHandle, Result, RootReference, SafeString, Value,
};

// --- DOM re-exports --------------------------------------------------------

pub use tessel_dom::{CountingDom, Document, DomHelper, DomStats, Namespace};

// --- Runtime re-exports ----------------------------------------------------

pub use tessel_runtime::{
    BlockOptions, Bounds, Branch, ComponentDefinition, ConfigError, ConfigParse,
    DefaultEnvironment, Environment, Frame, Helper, KeyStrategy, ListMorph, Morph, MorphId,
    ReconcileStats, RenderConfig, RenderResult, Scope, Template, wire,
};

// --- View -----------------------------------------------------------------

/// A rendered template together with the root reference it reads from.
///
/// Changing the data through the view rerenders immediately.
pub struct View {
    data: Rc<RootReference>,
    result: RenderResult,
}

impl View {
    /// Render `template` with `data` as `this`, appending to `parent`.
    pub fn render(
        env: Rc<dyn Environment>,
        template: &Rc<Template>,
        data: impl Into<Value>,
        parent: NodeId,
    ) -> Result<Self> {
        let data = RootReference::new(data.into());
        let self_ref: ReferenceHandle = data.clone();
        let frame = Frame::new(env, Scope::top_level(Some(self_ref), &[]));
        let result = template.render(&frame, parent, None)?;
        Ok(Self { data, result })
    }

    pub fn data(&self) -> Value {
        self.data.peek()
    }

    pub fn result(&self) -> &RenderResult {
        &self.result
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.result.bounds()
    }

    /// Replace the whole data value and rerender.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        self.data.update(value);
        self.result.rerender()
    }

    /// Replace one field of the data and rerender.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S], value: impl Into<Value>) -> Result<()> {
        self.data.update_path(path, value);
        self.result.rerender()
    }

    /// Rerender after outside changes, e.g. to a helper's inputs.
    pub fn rerender(&mut self) -> Result<()> {
        self.result.rerender()
    }

    /// Swap in a different template, reusing the region.
    pub fn render_template(&mut self, template: &Rc<Template>) -> Result<()> {
        self.result.render_template(template)
    }

    /// Remove the rendered nodes and release every reference.
    pub fn destroy(mut self) {
        self.result.clear();
    }
}

/// Render a wire-format program once into a fresh in-memory document and
/// return its markup.
pub fn render_to_string(program: &serde_json::Value, data: serde_json::Value) -> Result<String> {
    let doc = Rc::new(Document::new());
    let root = doc.create_root("body");
    let dom: Rc<dyn DomHelper> = doc.clone();
    let env = DefaultEnvironment::new(dom).into_shared();
    let template = wire::decode_entry(program)?;
    let view = View::render(env, &template, data, root)?;
    let html = doc.inner_html(root);
    view.destroy();
    Ok(html)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DefaultEnvironment, Document, DomHelper, Environment, Error, RenderConfig, Result,
        Template, Value, View,
    };

    pub use crate::{core, dom, runtime};
}

pub use tessel_core as core;
pub use tessel_dom as dom;
pub use tessel_runtime as runtime;
