use crate::level::Level;
use serde::{Serialize, Serializer};
use std::fmt;

/// The value of a single log field.
///
/// A closed set of variants. Every variant has exactly one JSON rendering
/// (see [`render_value`](crate::render::render_value)), so rendering can never
/// fail. Reading a value as the wrong variant through the `as_*` accessors
/// returns `None` instead of panicking.
///
/// # Examples
///
/// ```
/// use eventtally::Value;
///
/// let port = Value::from(22);
/// assert_eq!(port.as_i64(), Some(22));
/// assert_eq!(port.as_str(), None);
///
/// let host = Value::from("example.com");
/// assert_eq!(host.as_str(), Some("example.com"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text.
    Text(String),
    /// UTF-16 text, converted to UTF-8 when rendered.
    Wide(Vec<u16>),
    Int(i64),
    UInt(u64),
    Double(f64),
    Float(f32),
    Bool(bool),
}

/// The variant tag of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Wide,
    Int,
    UInt,
    Double,
    Float,
    Bool,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Wide => "wide text",
            ValueKind::Int => "int",
            ValueKind::UInt => "unsigned int",
            ValueKind::Double => "double",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Build a wide-text value from a UTF-8 string.
    pub fn wide(text: &str) -> Self {
        Value::Wide(text.encode_utf16().collect())
    }

    /// Returns the variant tag.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Wide(_) => ValueKind::Wide,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Double(_) => ValueKind::Double,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    /// Returns the UTF-8 text if this is a `Text` value.
    ///
    /// Wide text is not converted here; use [`Value::to_text`] for that.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a `Text` or `Wide` value as UTF-8.
    ///
    /// Unpaired surrogates in wide text are replaced with U+FFFD.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Wide(w) => Some(String::from_utf16_lossy(w)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the value of a `Double` or `Float`, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Float(f) => Some(f64::from(*f)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Vec<u16>> for Value {
    fn from(w: Vec<u16>) -> Self {
        Value::Wide(w)
    }
}

impl From<&[u16]> for Value {
    fn from(w: &[u16]) -> Self {
        Value::Wide(w.to_vec())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::UInt(u64::from(u))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::UInt(u as u64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Level> for Value {
    fn from(level: Level) -> Self {
        Value::Int(i64::from(level.code()))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Wide(w) => serializer.serialize_str(&String::from_utf16_lossy(w)),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Double(d) if d.is_finite() => serializer.serialize_f64(*d),
            Value::Float(f) if f.is_finite() => serializer.serialize_f32(*f),
            Value::Double(_) | Value::Float(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}
