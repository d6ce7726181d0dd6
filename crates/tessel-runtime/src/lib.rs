#![forbid(unsafe_code)]

//! Incremental template evaluation for tessel.
//!
//! A [`Template`] is rendered once into a DOM region, producing a
//! [`RenderResult`] that owns one [`Morph`](morph::Morph) per dynamic
//! statement. Later, [`RenderResult::rerender`] walks those morphs and
//! touches only the nodes whose inputs changed; `each` blocks reconcile
//! their items by key so surviving items keep their DOM nodes.
//!
//! ```
//! use std::rc::Rc;
//! use serde_json::json;
//! use tessel_core::{ReferenceHandle, RootReference, Value};
//! use tessel_dom::{Document, DomHelper};
//! use tessel_runtime::{DefaultEnvironment, Frame, Scope, wire};
//!
//! let doc = Rc::new(Document::new());
//! let root = doc.create_root("body");
//! let dom: Rc<dyn DomHelper> = doc.clone();
//! let env = DefaultEnvironment::new(dom).into_shared();
//!
//! let template = wire::decode_entry(&json!({"statements": [
//!     ["open-element", "p", null],
//!     ["append", ["get", ["name"]], false],
//!     ["close-element"]
//! ]}))
//! .unwrap();
//!
//! let data = RootReference::new(Value::from(json!({"name": "ada"})));
//! let self_ref: ReferenceHandle = data.clone();
//! let frame = Frame::new(env, Scope::top_level(Some(self_ref), &[]));
//! let mut result = template.render(&frame, root, None).unwrap();
//! assert_eq!(doc.inner_html(root), "<p>ada</p>");
//!
//! data.update_path(&["name"], "grace");
//! result.rerender().unwrap();
//! assert_eq!(doc.inner_html(root), "<p>grace</p>");
//! ```

pub mod bounds;
pub mod builder;
mod builtins;
pub mod config;
pub mod environment;
pub mod frame;
pub mod helper;
pub mod morph;
pub mod scope;
pub mod syntax;
pub mod template;
pub mod wire;

pub use bounds::Bounds;
pub use builder::{Boundary, ElementStack};
pub use config::{ConfigError, ConfigParse, RenderConfig};
pub use environment::{ComponentDefinition, DefaultEnvironment, Environment};
pub use frame::Frame;
pub use helper::{Helper, HelperReference};
pub use morph::block::{BlockOptions, Branch};
pub use morph::list::{KeyStrategy, ListMorph, ReconcileStats};
pub use morph::{Morph, MorphId};
pub use scope::{Block, Scope};
pub use syntax::{Expression, StatementSyntax};
pub use template::{RenderResult, Template};
