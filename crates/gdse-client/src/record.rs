use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a persisted record.
///
/// The backend emits integer keys; synthetic graph nodes use string keys such
/// as `stock-5`. Equality and hashing go through the `Display` form, so `1`
/// and `"1"` address the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Int),
            Value::String(s) => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Int(a), RecordId::Int(b)) => a == b,
            _ => self.key() == other.key(),
        }
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Str(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Str(value)
    }
}

/// One JSON object as delivered by the REST API. No schema is enforced here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` before the first save, or when the backend sent `"id": null`.
    pub fn id(&self) -> Option<RecordId> {
        self.fields.get("id").and_then(RecordId::from_value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Overwrite local fields with everything in `other` (server response after a save).
    pub fn merge(&mut self, other: Map<String, Value>) {
        for (key, value) in other {
            self.fields.insert(key, value);
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl TryFrom<Value> for Record {
    type Error = crate::error::ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(crate::error::ApiError::Decode(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }
}

/// String coercion with the semantics of JavaScript's `String(value)`.
///
/// A missing attribute is `"undefined"`, objects are `"[object Object]"` and
/// arrays join their coerced elements with `,` (null elements become empty).
pub fn coerce_to_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_to_string(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64's Display drops a zero fraction ("1" for 1.0), like JS does
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}
