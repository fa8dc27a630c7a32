//! Dynamic value model
//!
//! Log payloads come from arbitrary caller code, so the engine accepts a
//! runtime-inspected [`Value`] rather than a fixed Rust type. Composite values
//! (arrays, maps, sets, objects) are shared, interior-mutable nodes compared by
//! identity, which lets callers build the self-referential graphs the
//! transformer has to survive.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Number;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Largest integer magnitude a JSON consumer can hold without precision loss (2^53 - 1)
pub const MAX_SAFE_INTEGER: i128 = 9_007_199_254_740_991;

/// A runtime value of any supported kind
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Arbitrary-precision integer
    BigInt(i128),
    /// Point in time
    Date(DateTime<Utc>),
    Error(Rc<ErrorValue>),
    Array(ArrayRef),
    Map(MapRef),
    Set(SetRef),
    Object(ObjectRef),
    /// Binary buffer
    Bytes(Rc<[u8]>),
}

/// An error-like value: a message plus the textual trace it was raised with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    name: String,
    message: String,
    stack: String,
}

impl ErrorValue {
    /// Create an `Error` with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_name("Error", message)
    }

    /// Create an error with a custom name (e.g. `TypeError`)
    ///
    /// The stack starts with `"{name}: {message}"`; when backtraces are enabled
    /// for the process (`RUST_BACKTRACE`) the captured frames follow.
    pub fn with_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let mut stack = format!("{}: {}", name, message);
        append_backtrace(&mut stack);
        Self {
            name,
            message,
            stack,
        }
    }

    /// Capture a Rust error together with its `source()` chain
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let message = err.to_string();
        let mut stack = format!("Error: {}", message);
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        append_backtrace(&mut stack);
        Self {
            name: "Error".to_string(),
            message,
            stack,
        }
    }

    /// Replace the stack text
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }
}

fn append_backtrace(stack: &mut String) {
    let backtrace = std::backtrace::Backtrace::capture();
    if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
        stack.push('\n');
        stack.push_str(&backtrace.to_string());
    }
}

macro_rules! shared_node {
    ($(#[$meta:meta])* $name:ident, $entry:ty) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $name(Rc<RefCell<Vec<$entry>>>);

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Identity of the node, stable for its lifetime
            pub fn id(&self) -> usize {
                Rc::as_ptr(&self.0) as *const () as usize
            }

            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }

            pub fn len(&self) -> usize {
                self.0.borrow().len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.borrow().is_empty()
            }

            /// Borrow the entries in insertion order
            pub fn entries(&self) -> Ref<'_, Vec<$entry>> {
                self.0.borrow()
            }
        }
    };
}

shared_node!(
    /// Ordered sequence
    ArrayRef,
    Value
);
shared_node!(
    /// Key-value mapping with keys of any kind, in insertion order
    MapRef,
    (Value, Value)
);
shared_node!(
    /// Collection of unique elements, in insertion order
    SetRef,
    Value
);
shared_node!(
    /// Plain structured object with text keys, in insertion order
    ObjectRef,
    (String, Value)
);

impl ArrayRef {
    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }
}

impl MapRef {
    /// Insert or replace; keys compare with [`Value::same_value_zero`]
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.0.borrow_mut();
        match entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }
}

impl SetRef {
    /// Add an element unless an equal one is present; returns whether it was added
    pub fn add(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let mut entries = self.0.borrow_mut();
        if entries.iter().any(|v| v.same_value_zero(&value)) {
            return false;
        }
        entries.push(value);
        true
    }
}

impl ObjectRef {
    /// Insert or replace a field, keeping the original position on replace
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.0.borrow_mut();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

impl Value {
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let node = ArrayRef::new();
        for item in items {
            node.push(item);
        }
        Value::Array(node)
    }

    pub fn object<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let node = ObjectRef::new();
        for (k, v) in fields {
            node.insert(k, v);
        }
        Value::Object(node)
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let node = MapRef::new();
        for (k, v) in entries {
            node.insert(k, v);
        }
        Value::Map(node)
    }

    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let node = SetRef::new();
        for item in items {
            node.add(item);
        }
        Value::Set(node)
    }

    pub fn bytes(data: impl AsRef<[u8]>) -> Self {
        Value::Bytes(Rc::from(data.as_ref()))
    }

    pub fn error(err: ErrorValue) -> Self {
        Value::Error(Rc::new(err))
    }

    /// A plain number inside the safe range, a [`Value::BigInt`] outside it
    pub fn integer(n: i128) -> Self {
        if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n) {
            // Safe-range integers always fit in i64
            Value::Number(Number::from(n as i64))
        } else {
            Value::BigInt(n)
        }
    }

    /// Composite values are the ones the transformer recurses into
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Map(_) | Value::Set(_) | Value::Object(_) | Value::Bytes(_)
        )
    }

    /// Identity of a shared node, `None` for plain values
    pub fn node_id(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.id()),
            Value::Map(m) => Some(m.id()),
            Value::Set(s) => Some(s.id()),
            Value::Object(o) => Some(o.id()),
            _ => None,
        }
    }

    /// Direct children, map keys included
    pub fn children(&self) -> Vec<Value> {
        match self {
            Value::Array(a) => a.entries().clone(),
            Value::Set(s) => s.entries().clone(),
            Value::Object(o) => o.entries().iter().map(|(_, v)| v.clone()).collect(),
            Value::Map(m) => m
                .entries()
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Equality used for set membership and map keys
    ///
    /// Scalars compare by value (`0 == -0`), shared nodes and errors by identity.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if a.is_f64() || b.is_f64() => x == y,
                _ => a == b,
            },
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            (Value::Bytes(a), Value::Bytes(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Text form of a value used as a record key
    pub fn key_text(&self) -> String {
        let mut joining = HashSet::new();
        self.key_text_inner(&mut joining)
    }

    fn key_text_inner(&self, joining: &mut HashSet<usize>) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_text(n),
            Value::String(s) => s.clone(),
            Value::BigInt(n) => n.to_string(),
            Value::Date(d) => iso_timestamp(d),
            Value::Error(e) => format!("{}: {}", e.name(), e.message()),
            Value::Array(a) => {
                // Arrays already being joined further up contribute nothing
                if !joining.insert(a.id()) {
                    return String::new();
                }
                let parts: Vec<String> = a
                    .entries()
                    .iter()
                    .map(|v| match v {
                        Value::Null => String::new(),
                        other => other.key_text_inner(joining),
                    })
                    .collect();
                joining.remove(&a.id());
                parts.join(",")
            }
            Value::Map(_) => "[object Map]".to_string(),
            Value::Set(_) => "[object Set]".to_string(),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

/// ISO-8601 UTC text with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
pub fn iso_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The value of an integral number outside ±(2^53 - 1), `None` otherwise
pub fn unsafe_integer(n: &Number) -> Option<i128> {
    let wide = match (n.as_i64(), n.as_u64()) {
        (Some(i), _) => i128::from(i),
        (None, Some(u)) => i128::from(u),
        _ => return None,
    };
    (!(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&wide)).then_some(wide)
}

/// Shortest decimal text for a number; integral floats drop the `.0`
pub fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i128),
        _ => n.to_string(),
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = crate::inspect::inspect(self, &jlog_config::InspectOptions::default());
        f.write_str(&rendered)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::integer(n as i128)
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Value::BigInt(n)
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::error(e)
    }
}

impl From<ArrayRef> for Value {
    fn from(a: ArrayRef) -> Self {
        Value::Array(a)
    }
}

impl From<MapRef> for Value {
    fn from(m: MapRef) -> Self {
        Value::Map(m)
    }
}

impl From<SetRef> for Value {
    fn from(s: SetRef) -> Self {
        Value::Set(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match unsafe_integer(&n) {
                Some(big) => Value::BigInt(big),
                None => Value::Number(n),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items),
            serde_json::Value::Object(fields) => Value::object(fields),
        }
    }
}
