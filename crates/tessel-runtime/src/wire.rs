#![forbid(unsafe_code)]

//! JSON wire format for precompiled templates.
//!
//! A program is an array of templates, each
//! `{"statements": [...], "locals": [...]}`. Nested templates are named by
//! their index in the array and must come before the template that uses
//! them; the last template is the entry point.
//!
//! Statements are tagged arrays:
//!
//! ```text
//! ["text", "hello"]
//! ["comment", "note"]
//! ["open-element", "div", null]
//! ["close-element"]
//! ["static-attr", "class", "box", null]
//! ["dynamic-attr", "href", <expr>, null]
//! ["append", <expr>, false]
//! ["block", ["if"], [<expr>...], {"key": <expr>}, 0, 1]
//! ["component", "x-card", {"title": <expr>}, 2]
//! ["yield", "default", [<expr>...]]
//! ```
//!
//! Expressions are `["value", json]`, `["get", ["a", "b"]]`,
//! `["concat", [<expr>...]]` and `["helper", ["name"], [<expr>...], {..}]`.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as Json;
use tessel_core::{Error, Result, Value};

use crate::syntax::{Expression, HashSyntax, StatementSyntax};
use crate::template::Template;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireTemplate {
    statements: Vec<Json>,
    #[serde(default)]
    locals: Vec<String>,
}

/// Decode every template of a program, in order.
pub fn decode_program(json: &Json) -> Result<Vec<Rc<Template>>> {
    let entries: Vec<Json> = match json {
        Json::Array(items) => items.clone(),
        Json::Object(_) => vec![json.clone()],
        other => {
            return Err(Error::spec(
                0,
                None,
                format!("expected a template or an array of templates, found {}", json_kind(other)),
            ));
        }
    };
    if entries.is_empty() {
        return Err(Error::spec(0, None, "program has no templates"));
    }

    let mut built: Vec<Rc<Template>> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let wire: WireTemplate =
            serde_json::from_value(entry).map_err(|e| Error::spec(index, None, e.to_string()))?;
        let decoder = Decoder {
            built: &built,
            template: index,
        };
        let statements = wire
            .statements
            .iter()
            .enumerate()
            .map(|(i, statement)| decoder.statement(statement).map_err(|e| e.at(index, i)))
            .collect::<Result<Vec<_>>>()?;
        built.push(Template::new(statements, wire.locals));
    }
    Ok(built)
}

/// Decode a program and return its entry point.
pub fn decode_entry(json: &Json) -> Result<Rc<Template>> {
    let mut templates = decode_program(json)?;
    templates
        .pop()
        .ok_or_else(|| Error::spec(0, None, "program has no templates"))
}

/// Parse and decode program text.
pub fn decode_str(text: &str) -> Result<Rc<Template>> {
    let json: Json = serde_json::from_str(text).map_err(|e| Error::spec(0, None, e.to_string()))?;
    decode_entry(&json)
}

/// Failure inside one statement, positioned by the caller.
struct Malformed(String);

impl Malformed {
    fn at(self, template: usize, statement: usize) -> Error {
        Error::spec(template, Some(statement), self.0)
    }
}

type Decoded<T> = std::result::Result<T, Malformed>;

fn malformed<T>(message: impl Into<String>) -> Decoded<T> {
    Err(Malformed(message.into()))
}

struct Decoder<'a> {
    built: &'a [Rc<Template>],
    template: usize,
}

impl Decoder<'_> {
    fn statement(&self, json: &Json) -> Decoded<StatementSyntax> {
        let Some(parts) = json.as_array() else {
            return malformed(format!("statement must be an array, found {}", json_kind(json)));
        };
        let Some(tag) = parts.first().and_then(Json::as_str) else {
            return malformed("statement is missing its tag");
        };
        let arg = |i: usize| parts.get(i).unwrap_or(&Json::Null);

        let statement = match tag {
            "text" => StatementSyntax::Text(string(arg(1), "text")?),
            "comment" => StatementSyntax::Comment(string(arg(1), "comment")?),
            "open-element" => StatementSyntax::OpenElement {
                tag: string(arg(1), "tag name")?,
                block_params: block_params(arg(2))?,
            },
            "close-element" => StatementSyntax::CloseElement,
            "static-attr" => StatementSyntax::StaticAttr {
                name: string(arg(1), "attribute name")?,
                value: string(arg(2), "attribute value")?,
                namespace: optional_string(arg(3), "namespace")?,
            },
            "dynamic-attr" => StatementSyntax::DynamicAttr {
                name: string(arg(1), "attribute name")?,
                value: self.expression(arg(2))?,
                namespace: optional_string(arg(3), "namespace")?,
            },
            "append" => StatementSyntax::Append {
                value: self.expression(arg(1))?,
                trusting: match arg(2) {
                    Json::Null => false,
                    Json::Bool(b) => *b,
                    other => return malformed(format!("trusting flag must be a bool, found {}", json_kind(other))),
                },
            },
            "block" => StatementSyntax::Block {
                path: path(arg(1))?,
                params: self.params(arg(2))?,
                hash: self.hash(arg(3))?,
                template: self.template_ref(arg(4))?,
                inverse: self.template_ref(arg(5))?,
            },
            "component" => StatementSyntax::Component {
                tag: string(arg(1), "component tag")?,
                hash: self.hash(arg(2))?,
                template: self.template_ref(arg(3))?,
            },
            "yield" => StatementSyntax::Yield {
                to: optional_string(arg(1), "block name")?.unwrap_or_else(|| "default".to_owned()),
                params: self.params(arg(2))?,
            },
            other => return malformed(format!("unknown statement `{other}`")),
        };
        Ok(statement)
    }

    fn expression(&self, json: &Json) -> Decoded<Expression> {
        let Some(parts) = json.as_array() else {
            return malformed(format!("expression must be an array, found {}", json_kind(json)));
        };
        let arg = |i: usize| parts.get(i).unwrap_or(&Json::Null);
        match parts.first().and_then(Json::as_str) {
            Some("value") => Ok(Expression::Value(Value::from(arg(1).clone()))),
            Some("get") => Ok(Expression::Get(path(arg(1))?)),
            Some("concat") => Ok(Expression::Concat(self.params(arg(1))?)),
            Some("helper") => Ok(Expression::Helper {
                path: path(arg(1))?,
                params: self.params(arg(2))?,
                hash: self.hash(arg(3))?,
            }),
            Some(other) => malformed(format!("unknown expression `{other}`")),
            None => malformed("expression is missing its tag"),
        }
    }

    fn params(&self, json: &Json) -> Decoded<Vec<Expression>> {
        match json {
            Json::Null => Ok(Vec::new()),
            Json::Array(items) => items.iter().map(|item| self.expression(item)).collect(),
            other => malformed(format!("params must be an array, found {}", json_kind(other))),
        }
    }

    fn hash(&self, json: &Json) -> Decoded<HashSyntax> {
        match json {
            Json::Null => Ok(Vec::new()),
            Json::Object(entries) => entries
                .iter()
                .map(|(name, expr)| Ok((name.clone(), self.expression(expr)?)))
                .collect(),
            other => malformed(format!("hash must be an object, found {}", json_kind(other))),
        }
    }

    fn template_ref(&self, json: &Json) -> Decoded<Option<Rc<Template>>> {
        match json {
            Json::Null => Ok(None),
            Json::Number(n) => {
                let Some(index) = n.as_u64().and_then(|i| usize::try_from(i).ok()) else {
                    return malformed(format!("template index {n} is not an index"));
                };
                match self.built.get(index) {
                    Some(template) => Ok(Some(Rc::clone(template))),
                    None => malformed(format!(
                        "template {} refers to template {index}, which is not defined before it",
                        self.template
                    )),
                }
            }
            other => malformed(format!("template index must be a number, found {}", json_kind(other))),
        }
    }
}

fn string(json: &Json, what: &str) -> Decoded<String> {
    match json {
        Json::String(s) => Ok(s.clone()),
        other => malformed(format!("{what} must be a string, found {}", json_kind(other))),
    }
}

fn optional_string(json: &Json, what: &str) -> Decoded<Option<String>> {
    match json {
        Json::Null => Ok(None),
        other => string(other, what).map(Some),
    }
}

/// Element block params are accepted for compatibility and must be a
/// list of names.
fn block_params(json: &Json) -> Decoded<Vec<String>> {
    match json {
        Json::Null => Ok(Vec::new()),
        Json::Array(items) => items.iter().map(|item| string(item, "block param")).collect(),
        other => malformed(format!("element block params must be names, found {}", json_kind(other))),
    }
}

/// A path is an array of segments or a dotted string.
fn path(json: &Json) -> Decoded<Vec<String>> {
    let segments: Vec<String> = match json {
        Json::String(s) => s.split('.').map(str::to_owned).collect(),
        Json::Array(items) => items
            .iter()
            .map(|item| string(item, "path segment"))
            .collect::<Decoded<_>>()?,
        other => return malformed(format!("path must be an array or a string, found {}", json_kind(other))),
    };
    if segments.is_empty() || segments.iter().any(String::is_empty) {
        return malformed("path has an empty segment");
    }
    Ok(segments)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a bool",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
