#![forbid(unsafe_code)]

//! Dynamic values flowing through references into the DOM.
//!
//! Scalars compare by content. Lists and objects are shared behind `Rc`
//! and compare by identity, which is what the `@identity` key strategy
//! and the "skip unchanged value" checks in morphs rely on.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::node::NodeId;

/// Markup the host vouches for. Inserted as parsed HTML, never escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeString(Rc<str>);

impl SafeString {
    /// Wrap trusted markup.
    pub fn new(html: impl Into<Rc<str>>) -> Self {
        Self(html.into())
    }

    /// The wrapped markup.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field map of an object value.
pub type Fields = BTreeMap<String, Value>;

/// A template value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / undefined.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (all numbers are `f64`).
    Number(f64),
    /// Plain text, escaped on insertion.
    String(Rc<str>),
    /// Trusted markup.
    Safe(SafeString),
    /// Shared list, compared by identity.
    List(Rc<Vec<Value>>),
    /// Shared record, compared by identity.
    Object(Rc<Fields>),
    /// A node produced by a helper.
    Node(NodeId),
}

impl Value {
    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(Rc::new(items.into_iter().collect()))
    }

    /// Build an object value.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Object(Rc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a safe-string value.
    pub fn safe(html: impl Into<Rc<str>>) -> Self {
        Self::Safe(SafeString::new(html))
    }

    /// Short name of the variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Safe(_) => "safe string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Node(_) => "node",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Items of a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Read a field.
    ///
    /// Objects yield the named field, lists answer `length` and numeric
    /// indices. Anything else reads as `Null`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Self::Object(fields) => fields.get(key).cloned().unwrap_or_default(),
            Self::List(items) => {
                if key == "length" {
                    return Self::Number(items.len() as f64);
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default()
            }
            Self::String(s) if key == "length" => Self::Number(s.chars().count() as f64),
            _ => Self::Null,
        }
    }

    /// Read a dotted path, one segment at a time.
    pub fn get_path<S: AsRef<str>>(&self, parts: &[S]) -> Value {
        let mut current = self.clone();
        for part in parts {
            if current.is_null() {
                break;
            }
            current = current.get(part.as_ref());
        }
        current
    }

    /// Text form of a scalar, as printed by `{{value}}`.
    ///
    /// `Null` prints as the empty string. Lists, objects and nodes have
    /// no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::String(s) => Some(s.to_string()),
            Self::Safe(s) => Some(s.as_str().to_owned()),
            Self::List(_) | Self::Object(_) | Self::Node(_) => None,
        }
    }

    /// Handlebars truthiness: `Null`, `false`, `0`, `""` and `[]` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Safe(s) => !s.as_str().is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Object(_) | Self::Node(_) => true,
        }
    }

    /// Stable identity string.
    ///
    /// Lists and objects are identified by allocation, scalars by content
    /// (tagged with their kind so `1` and `"1"` differ).
    pub fn identity_key(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(b) => format!("b:{b}"),
            Self::Number(n) => format!("n:{}", format_number(*n)),
            Self::String(s) => format!("s:{s}"),
            Self::Safe(s) => format!("h:{s}"),
            Self::List(items) => format!("l:{:p}", Rc::as_ptr(items)),
            Self::Object(fields) => format!("o:{:p}", Rc::as_ptr(fields)),
            Self::Node(id) => format!("node:{}", id.raw()),
        }
    }
}

/// Print integral numbers without a fractional part.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Safe(a), Self::Safe(b)) => a == b,
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Node(a), Self::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<SafeString> for Value {
    fn from(s: SafeString) -> Self {
        Self::Safe(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(Rc::new(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s.into()),
            serde_json::Value::Array(items) => Self::list(items.into_iter().map(Value::from)),
            serde_json::Value::Object(fields) => {
                Self::object(fields.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}
