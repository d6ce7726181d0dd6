#![forbid(unsafe_code)]

//! `{{value}}` and `{{{value}}}`.

use std::rc::Rc;

use tessel_core::{Error, NodeId, ReferenceHandle, Result, Value};
use tessel_dom::DomHelper;

use crate::bounds::Bounds;
use crate::builder::ElementStack;
use crate::frame::Frame;
use crate::morph::{Morph, MorphId};

/// What a value turns into when appended.
enum Insert {
    Text(String),
    Html(String),
    Node(NodeId),
}

/// What the morph currently owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    Text(NodeId),
    Html(Bounds),
    Node(NodeId),
}

/// Owns the output of one append statement.
///
/// Plain strings become escaped text unless the call site is trusting;
/// safe strings always insert as markup; node values insert the node.
pub struct ContentMorph {
    id: MorphId,
    dom: Rc<dyn DomHelper>,
    reference: ReferenceHandle,
    trusting: bool,
    parent: Option<NodeId>,
    content: Option<Content>,
    last: Value,
}

impl ContentMorph {
    pub fn new(frame: &Frame, reference: ReferenceHandle, trusting: bool) -> Self {
        Self {
            id: MorphId::next(),
            dom: Rc::clone(frame.dom()),
            reference,
            trusting,
            parent: None,
            content: None,
            last: Value::Null,
        }
    }

    fn classify(&self, value: &Value) -> Result<Insert> {
        match value {
            Value::Safe(html) => Ok(Insert::Html(html.as_str().to_owned())),
            Value::String(s) if self.trusting => Ok(Insert::Html(s.to_string())),
            Value::Node(node) => Ok(Insert::Node(*node)),
            other => other
                .to_text()
                .map(Insert::Text)
                .ok_or(Error::UnsupportedValue {
                    context: "content",
                    kind: other.kind(),
                }),
        }
    }

    /// Insert at `next` in `parent` without an element stack.
    fn insert(&self, parent: NodeId, next: Option<NodeId>, insert: Insert) -> Content {
        match insert {
            Insert::Text(text) => {
                let node = self.dom.create_text_node(&text);
                self.dom.insert_before(parent, node, next);
                Content::Text(node)
            }
            Insert::Html(html) => match self.dom.insert_html_before(parent, &html, next) {
                Some((first, last)) => Content::Html(Bounds::new(parent, first, last)),
                None => {
                    let node = self.dom.create_text_node("");
                    self.dom.insert_before(parent, node, next);
                    Content::Text(node)
                }
            },
            Insert::Node(node) => {
                self.dom.insert_before(parent, node, next);
                Content::Node(node)
            }
        }
    }
}

impl Morph for ContentMorph {
    fn id(&self) -> MorphId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "content"
    }

    fn append(&mut self, stack: &mut ElementStack) -> Result<()> {
        let value = self.reference.value()?;
        let insert = self.classify(&value)?;
        let parent = stack.element();
        self.content = Some(self.insert(parent, stack.next_sibling(), insert));
        self.parent = Some(parent);
        self.last = value;
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        let (Some(parent), Some(content)) = (self.parent, self.content) else {
            return Ok(());
        };
        if !self.reference.is_dirty() {
            return Ok(());
        }
        let value = self.reference.value()?;
        if value == self.last {
            return Ok(());
        }
        let insert = self.classify(&value)?;
        self.content = Some(match (content, insert) {
            (Content::Text(node), Insert::Text(text)) => {
                self.dom.set_node_value(node, &text);
                content
            }
            (Content::Node(old), Insert::Node(new)) if old == new => content,
            (_, insert) => {
                let next = bounds_of(parent, content).clear(&*self.dom);
                self.insert(parent, next, insert)
            }
        });
        self.last = value;
        Ok(())
    }

    fn destroy(&mut self) {
        self.reference.destroy();
    }

    fn bounds(&self) -> Option<Bounds> {
        Some(bounds_of(self.parent?, self.content?))
    }
}

fn bounds_of(parent: NodeId, content: Content) -> Bounds {
    match content {
        Content::Text(node) | Content::Node(node) => Bounds::single(parent, node),
        Content::Html(bounds) => bounds,
    }
}
