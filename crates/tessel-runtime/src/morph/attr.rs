#![forbid(unsafe_code)]

use std::rc::Rc;

use tessel_core::{Error, NodeId, ReferenceHandle, Result, Value};
use tessel_dom::DomHelper;

use crate::bounds::Bounds;
use crate::builder::ElementStack;
use crate::frame::Frame;
use crate::morph::{Morph, MorphId};

/// One dynamic attribute of one element.
///
/// `Null` and `false` remove the attribute; `true` sets it empty.
pub struct AttrMorph {
    id: MorphId,
    dom: Rc<dyn DomHelper>,
    element: NodeId,
    name: String,
    namespace: Option<String>,
    reference: ReferenceHandle,
    last: Option<Option<String>>,
}

impl AttrMorph {
    pub fn new(
        frame: &Frame,
        element: NodeId,
        name: &str,
        namespace: Option<String>,
        reference: ReferenceHandle,
    ) -> Self {
        Self {
            id: MorphId::next(),
            dom: Rc::clone(frame.dom()),
            element,
            name: name.to_owned(),
            namespace,
            reference,
            last: None,
        }
    }

    fn write(&mut self, value: Option<String>) {
        if self.last.as_ref() == Some(&value) {
            return;
        }
        match (&value, &self.namespace) {
            (None, _) => self.dom.remove_attribute(self.element, &self.name),
            (Some(text), Some(ns)) => self.dom.set_attribute_ns(self.element, &self.name, text, ns),
            (Some(text), None) => self.dom.set_attribute(self.element, &self.name, text),
        }
        self.last = Some(value);
    }
}

fn attribute_value(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some(String::new())),
        other => other
            .to_text()
            .map(Some)
            .ok_or(Error::UnsupportedValue {
                context: "an attribute value",
                kind: other.kind(),
            }),
    }
}

impl Morph for AttrMorph {
    fn id(&self) -> MorphId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "attribute"
    }

    fn append(&mut self, _stack: &mut ElementStack) -> Result<()> {
        let value = attribute_value(&self.reference.value()?)?;
        if value.is_some() {
            self.write(value);
        } else {
            self.last = Some(None);
        }
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        if self.last.is_none() || !self.reference.is_dirty() {
            return Ok(());
        }
        let value = attribute_value(&self.reference.value()?)?;
        self.write(value);
        Ok(())
    }

    fn destroy(&mut self) {
        self.reference.destroy();
    }

    fn bounds(&self) -> Option<Bounds> {
        None
    }
}
