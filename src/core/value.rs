//! Records and resolved values

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

/// A value of a core type
///
/// Records are produced by root and field fetchers. The executor composes
/// output records by appending declared fields to a core record's own
/// attributes, in declaration order. `type_name` always names the core type
/// the record was produced as.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    attributes: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record of the given core type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Build a record from a JSON object, one scalar attribute per key
    ///
    /// Returns `None` if `json` is not an object.
    pub fn from_json(type_name: impl Into<String>, json: Json) -> Option<Self> {
        let Json::Object(map) = json else {
            return None;
        };

        Some(Self {
            type_name: type_name.into(),
            attributes: map
                .into_iter()
                .map(|(key, value)| (key, Value::Scalar(value)))
                .collect(),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Get an attribute by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Get a scalar attribute by name
    pub fn scalar(&self, name: &str) -> Option<&Json> {
        self.get(name).and_then(Value::as_scalar)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        self.attributes.insert(name, value);
    }
}

/// Serializes as a map of its attributes, in order; the type tag is not written
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

/// A resolved value
///
/// Field fetchers return one `Value` per parent. `List` marks one level of
/// nesting that the executor flattens to batch the next level of fields;
/// `Scalar` and `Record` are leaves. A JSON array wrapped in `Scalar` stays a
/// leaf: a list of tags is a single value, not a nesting level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Json),
    Record(Record),
    List(Vec<Value>),
}

impl Value {
    /// Convenience for a JSON `null` leaf
    pub fn null() -> Self {
        Value::Scalar(Json::Null)
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    pub fn as_scalar(&self) -> Option<&Json> {
        match self {
            Value::Scalar(json) => Some(json),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Take the record out of a `Record` value, handing other values back
    pub fn into_record(self) -> Result<Record, Value> {
        match self {
            Value::Record(record) => Ok(record),
            other => Err(other),
        }
    }

    /// Short type label used in diagnostics
    pub fn kind(&self) -> &str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Record(record) => record.type_name(),
            Value::List(_) => "list",
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::Scalar(json)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<Record>> for Value {
    fn from(records: Vec<Record>) -> Self {
        Value::List(records.into_iter().map(Value::Record).collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Json::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Json::String(s))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Json::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Json::Bool(b))
    }
}
