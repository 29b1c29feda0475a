//! Dynamic values stored in the cache
//!
//! A [`Value`] is a tree of scalars, ordered containers, maps, named records
//! and numeric arrays. Lists and tuples are the only shapes the chunk
//! planner splits.

mod numeric;

pub use numeric::{Dtype, NumericArray};

use serde::{Deserialize, Serialize};

/// A cacheable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered key/value pairs; keys may be any value
    Map(Vec<(Value, Value)>),
    /// A named record with ordered fields
    Object {
        class: String,
        fields: Vec<(String, Value)>,
    },
    Array(NumericArray),
}

impl Value {
    /// Build a bytes value
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Build a record value
    pub fn object(class: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self::Object {
            class: class.into(),
            fields,
        }
    }

    /// Elements of a list or tuple
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        self.as_sequence().is_some()
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NumericArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Object { .. } => "object",
            Self::Array(_) => "array",
        }
    }

    /// Join decoded chunks, in order, into one flat sequence.
    ///
    /// The result is a tuple when every chunk is a tuple and a list
    /// otherwise. A chunk that is not a sequence contributes itself as a
    /// single element.
    pub fn concat(chunks: Vec<Value>) -> Value {
        let all_tuples = !chunks.is_empty() && chunks.iter().all(|c| matches!(c, Self::Tuple(_)));
        let mut items = Vec::new();
        for chunk in chunks {
            match chunk {
                Self::List(mut inner) | Self::Tuple(mut inner) => items.append(&mut inner),
                other => items.push(other),
            }
        }
        if all_tuples {
            Self::Tuple(items)
        } else {
            Self::List(items)
        }
    }

    /// Map a JSON document into a value.
    ///
    /// Integers that fit in `i64` stay integers; every other number becomes
    /// a float. Objects become maps with string keys.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Self::Str(k), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the value as JSON for display.
    ///
    /// Lossy: tuples and byte strings become arrays, maps with non-string
    /// keys become arrays of pairs, records gain a `__class__` field.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::None => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Str(s) => Json::String(s.clone()),
            Self::Bytes(b) => Json::Array(b.iter().map(|x| Json::from(*x)).collect()),
            Self::List(items) | Self::Tuple(items) => {
                Json::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(pairs) => {
                if pairs.iter().all(|(k, _)| k.as_str().is_some()) {
                    let mut map = serde_json::Map::new();
                    for (k, v) in pairs {
                        if let Some(key) = k.as_str() {
                            map.insert(key.to_string(), v.to_json());
                        }
                    }
                    Json::Object(map)
                } else {
                    Json::Array(
                        pairs
                            .iter()
                            .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                            .collect(),
                    )
                }
            }
            Self::Object { class, fields } => {
                let mut map = serde_json::Map::new();
                map.insert("__class__".to_string(), Json::String(class.clone()));
                for (name, v) in fields {
                    map.insert(name.clone(), v.to_json());
                }
                Json::Object(map)
            }
            Self::Array(arr) => arr.to_json(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NumericArray> for Value {
    fn from(v: NumericArray) -> Self {
        Self::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}
