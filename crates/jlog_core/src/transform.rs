//! Value transformation engine
//!
//! Rewrites an arbitrary [`Value`] into a JSON-safe [`Transformed`] tree.
//! Dispatch is by kind, in fixed priority order:
//!
//! 1. null passes through
//! 2. errors become `{"[Error]": {message, stack}}`
//! 3. arrays become sequences
//! 4. dates become ISO-8601 text
//! 5. maps become records (optionally `{"[Map]": ..}`)
//! 6. sets become sequences (optionally `{"[Set]": ..}`)
//! 7. any other composite is a generic object
//! 8. big integers become `{"type": "bigint", "value": ".."}`
//!
//! Before recursing into a composite the engine checks whether it refers to
//! itself; if so the inspector rendering is returned verbatim for that value.
//! The engine is total: no input makes it fail or loop.

use crate::cycle::is_self_referential;
use crate::inspect::{has_circular_marker, inspect};
use crate::value::{iso_timestamp, unsafe_integer, ArrayRef, ErrorValue, MapRef, SetRef, Value};
use jlog_config::{InspectOptions, TransformConfig};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Number;

/// Marker key for errors, used both in messages and in the envelope
pub const ERROR_MARKER: &str = "[Error]";

/// Collection kinds that can carry a type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Map,
    Set,
}

impl CollectionKind {
    pub fn marker(self) -> &'static str {
        match self {
            CollectionKind::Map => "[Map]",
            CollectionKind::Set => "[Set]",
        }
    }
}

/// Error message and stack as written to the log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub stack: String,
}

impl From<&ErrorValue> for ErrorDetail {
    fn from(err: &ErrorValue) -> Self {
        Self {
            message: err.message().to_string(),
            stack: err.stack().to_string(),
        }
    }
}

/// Text-keyed record in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(Vec<(String, Transformed)>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its first position
    pub fn insert(&mut self, key: String, value: Transformed) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Transformed> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Transformed)> {
        self.0.iter().map(|(k, v)| (k, v))
    }
}

/// JSON-safe output of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Transformed>),
    Record(Record),
    /// `{"[Map]": ..}` or `{"[Set]": ..}`
    Marked(CollectionKind, Box<Transformed>),
    /// `{"[Error]": {message, stack}}`
    Error(ErrorDetail),
    /// `{"type": "bigint", "value": ".."}`
    BigInt(String),
    /// Inspector rendering of a self-referential value
    Circular(String),
}

impl Transformed {
    /// Convert into a `serde_json::Value`, keeping key order
    pub fn into_json(self) -> serde_json::Value {
        use serde_json::{Map, Value as Json};

        fn single(key: &str, value: Json) -> Json {
            let mut map = Map::new();
            map.insert(key.to_string(), value);
            Json::Object(map)
        }

        match self {
            Transformed::Null => Json::Null,
            Transformed::Bool(b) => Json::Bool(b),
            Transformed::Number(n) => Json::Number(n),
            Transformed::String(s) | Transformed::Circular(s) => Json::String(s),
            Transformed::Sequence(items) => {
                Json::Array(items.into_iter().map(Transformed::into_json).collect())
            }
            Transformed::Record(record) => Json::Object(
                record
                    .0
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
            Transformed::Marked(kind, inner) => single(kind.marker(), inner.into_json()),
            Transformed::Error(detail) => {
                let mut inner = Map::new();
                inner.insert("message".to_string(), Json::String(detail.message));
                inner.insert("stack".to_string(), Json::String(detail.stack));
                single(ERROR_MARKER, Json::Object(inner))
            }
            Transformed::BigInt(digits) => {
                let mut map = Map::new();
                map.insert("type".to_string(), Json::String("bigint".to_string()));
                map.insert("value".to_string(), Json::String(digits));
                Json::Object(map)
            }
        }
    }
}

impl Serialize for Transformed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Transformed::Null => serializer.serialize_unit(),
            Transformed::Bool(b) => serializer.serialize_bool(*b),
            Transformed::Number(n) => n.serialize(serializer),
            Transformed::String(s) | Transformed::Circular(s) => serializer.serialize_str(s),
            Transformed::Sequence(items) => serializer.collect_seq(items),
            Transformed::Record(record) => serializer.collect_map(record.iter()),
            Transformed::Marked(kind, inner) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(kind.marker(), inner)?;
                map.end()
            }
            Transformed::Error(detail) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ERROR_MARKER, detail)?;
                map.end()
            }
            Transformed::BigInt(digits) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "bigint")?;
                map.serialize_entry("value", digits)?;
                map.end()
            }
        }
    }
}

/// The transformation engine
#[derive(Debug, Clone, Default)]
pub struct Transform {
    config: TransformConfig,
}

impl Transform {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform any value
    pub fn transform(&self, value: &Value) -> Transformed {
        match value {
            Value::Null => Transformed::Null,
            Value::Bool(b) => Transformed::Bool(*b),
            Value::Number(n) => match unsafe_integer(n) {
                Some(big) => Transformed::BigInt(big.to_string()),
                None => Transformed::Number(n.clone()),
            },
            Value::String(s) => Transformed::String(s.clone()),
            Value::Error(e) => self.err(e),
            Value::Array(a) => self.arr(a),
            Value::Date(d) => Transformed::String(iso_timestamp(d)),
            Value::Map(m) => self.map(m),
            Value::Set(s) => self.set(s),
            Value::Object(_) | Value::Bytes(_) => self.obj(value),
            Value::BigInt(n) => Transformed::BigInt(n.to_string()),
        }
    }

    /// Arrays: element-wise transform, never marked
    pub fn arr(&self, arr: &ArrayRef) -> Transformed {
        let value = Value::Array(arr.clone());
        if let Some(fallback) = self.circular_fallback(&value) {
            return fallback;
        }
        Transformed::Sequence(arr.entries().iter().map(|v| self.transform(v)).collect())
    }

    /// Maps: record keyed by the text form of each key
    pub fn map(&self, map: &MapRef) -> Transformed {
        let value = Value::Map(map.clone());
        if let Some(fallback) = self.circular_fallback(&value) {
            return fallback;
        }
        let mut record = Record::new();
        for (k, v) in map.entries().iter() {
            record.insert(k.key_text(), self.transform(v));
        }
        self.mark(CollectionKind::Map, Transformed::Record(record))
    }

    /// Sets: sequence in iteration order
    pub fn set(&self, set: &SetRef) -> Transformed {
        let value = Value::Set(set.clone());
        if let Some(fallback) = self.circular_fallback(&value) {
            return fallback;
        }
        let items = set.entries().iter().map(|v| self.transform(v)).collect();
        self.mark(CollectionKind::Set, Transformed::Sequence(items))
    }

    /// Generic objects: field-wise transform, never marked
    ///
    /// Binary buffers land here too and become `{"0": byte, "1": byte, ..}`.
    /// Non-composite input is transformed by kind.
    pub fn obj(&self, value: &Value) -> Transformed {
        match value {
            Value::Object(o) => {
                if let Some(fallback) = self.circular_fallback(value) {
                    return fallback;
                }
                let mut record = Record::new();
                for (k, v) in o.entries().iter() {
                    record.insert(k.clone(), self.transform(v));
                }
                Transformed::Record(record)
            }
            Value::Bytes(bytes) => {
                let mut record = Record::new();
                for (index, byte) in bytes.iter().enumerate() {
                    record.insert(index.to_string(), Transformed::Number(Number::from(*byte)));
                }
                Transformed::Record(record)
            }
            other => self.transform(other),
        }
    }

    /// Errors look the same under every configuration
    pub fn err(&self, err: &ErrorValue) -> Transformed {
        Transformed::Error(ErrorDetail::from(err))
    }

    fn circular_fallback(&self, value: &Value) -> Option<Transformed> {
        if is_self_referential(value) {
            tracing::trace!("self-referential value, falling back to inspector text");
            let mut text = inspect(value, &self.config.inspect);
            // A cycle longer than the depth limit collapses before it closes
            if !has_circular_marker(&text) {
                let unbounded = InspectOptions {
                    depth: None,
                    ..self.config.inspect.clone()
                };
                text = inspect(value, &unbounded);
            }
            Some(Transformed::Circular(text))
        } else {
            None
        }
    }

    fn mark(&self, kind: CollectionKind, inner: Transformed) -> Transformed {
        if self.config.print_collection_type_markers {
            Transformed::Marked(kind, Box::new(inner))
        } else {
            inner
        }
    }
}
