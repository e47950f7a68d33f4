use crate::render;
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One named value in a [`Fields`] sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered sequence of named values.
///
/// Order is significant. It is kept when rendering to JSON, and it is part of
/// the sequence's identity: two sequences with the same fields in a different
/// order are different events. Duplicate names are allowed and are rendered
/// in order.
///
/// # Examples
///
/// ```
/// use eventtally::{fields, Fields};
///
/// let mut a = Fields::new();
/// a.push("port", 22);
/// a.push("proto", "tcp");
///
/// let b = fields! { "port" => 22, "proto" => "tcp" };
/// assert_eq!(a.to_json(), b.to_json());
/// assert_eq!(a.to_json(), r#""port":22,"proto":"tcp""#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    fields: Vec<Field>,
}

impl Fields {
    pub fn new() -> Self {
        Fields { fields: Vec::new() }
    }

    /// Append a field at the end of the sequence.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push(Field::new(name, value));
    }

    /// Builder-style [`push`](Fields::push).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    /// Returns the value of the first field with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Render the sequence as a JSON object body: `"a":1,"b":"x"`, without
    /// the surrounding braces.
    pub fn to_json(&self) -> String {
        render::render_fields(self)
    }
}

impl From<Vec<Field>> for Fields {
    fn from(fields: Vec<Field>) -> Self {
        Fields { fields }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields {
            fields: iter.into_iter().map(|(k, v)| Field::new(k, v)).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.fields
            .extend(iter.into_iter().map(|(k, v)| Field::new(k, v)));
    }
}

impl IntoIterator for Fields {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// Serialized as a map in sequence order. Duplicate names are emitted as-is.
impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

/// Build a [`Fields`] sequence from `name => value` pairs, in order.
///
/// ```
/// use eventtally::fields;
///
/// let f = fields! { "host" => "example.com", "open" => true, "duration" => 1.3 };
/// assert_eq!(f.len(), 3);
/// assert!(fields! {}.is_empty());
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $( fields.push($name, $value); )+
        fields
    }};
}
