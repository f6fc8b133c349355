//! The normalized value model.
//!
//! Two generations of a service rarely share types, so both response graphs
//! are materialized into [`Value`] trees before comparison. The engine then
//! dispatches on the closed set of variants instead of inspecting application
//! types at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A single node of a normalized object graph.
///
/// Scalar variants cover the leaf types seen in service payloads; `Sequence`,
/// `Map`, and `Record` are the composite variants the walker recurses into.
/// `Symbol` is an enumerated value carried by name, so that enum-vs-string
/// comparisons collapse into text comparisons.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Symbol(String),
    Uuid(Uuid),
    Instant(DateTime<Utc>),
    Date(NaiveDate),
    Duration(Duration),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(Record),
}

impl Value {
    /// Build a record value with the given type name and ordered fields.
    pub fn record<N, F, I>(type_name: N, fields: I) -> Value
    where
        N: Into<String>,
        F: Into<String>,
        I: IntoIterator<Item = (F, Value)>,
    {
        Value::Record(Record::new(type_name, fields))
    }

    /// Build a symbolic (enumerated) value carried by name.
    pub fn symbol(name: impl Into<String>) -> Value {
        Value::Symbol(name.into())
    }

    /// Returns `true` if this is the null/zero/empty default for its variant.
    ///
    /// Used to suppress `MissingInReference` noise for optional-only fields
    /// added by the candidate schema.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Int(v) => *v == 0,
            Value::UInt(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Decimal(d) => d.is_zero(),
            Value::Text(t) | Value::Symbol(t) => t.is_empty(),
            Value::Uuid(u) => u.is_nil(),
            Value::Instant(_) | Value::Date(_) => false,
            Value::Duration(d) => d.is_zero(),
            Value::Sequence(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Record(r) => r.fields.iter().all(|(_, v)| v.is_default()),
        }
    }

    /// Returns `true` for leaf variants (everything except null and the
    /// composite variants).
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::Null | Value::Sequence(_) | Value::Map(_) | Value::Record(_)
        )
    }

    /// Returns `true` for `Text` and `Symbol`.
    pub fn is_textual(&self) -> bool {
        matches!(self, Value::Text(_) | Value::Symbol(_))
    }

    /// Returns `true` for the numeric variants.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Decimal(_)
        )
    }

    /// Widened numeric view of this value.
    ///
    /// Lets an `Int(90)` on one side equal a `Decimal(90.00)` on the other
    /// when the two schemas disagree on numeric representation. Returns
    /// `None` for non-numeric values and for floats a `Decimal` cannot hold.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(v) => Some(Decimal::from(*v)),
            Value::UInt(v) => Some(Decimal::from(*v)),
            Value::Float(v) => Decimal::from_f64_retain(*v),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Short variant name, used in log lines and mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Symbol(_) => "symbol",
            Value::Uuid(_) => "uuid",
            Value::Instant(_) => "instant",
            Value::Date(_) => "date",
            Value::Duration(_) => "duration",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    /// Normalize a decoded JSON payload into a value tree.
    ///
    /// This is the bridge for the external HTTP layer: objects become `Map`
    /// (not `Record`), since raw JSON carries no type names for rule
    /// resolution.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Value::Int(v)
                } else if let Some(v) = n.as_u64() {
                    Value::UInt(v)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// A complex object: a type name plus its fields in declaration order.
///
/// Field order drives walk order, so reports stay stable across runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// The schema type name this record was materialized from. Rules and
    /// collection strategies are registered against this name.
    pub type_name: String,
    /// Ordered `(field name, value)` pairs.
    pub fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record from an ordered field list.
    pub fn new<N, F, I>(type_name: N, fields: I) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        I: IntoIterator<Item = (F, Value)>,
    {
        Self {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Look up a field value by exact name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            // Decimal has an inherent byte-level `serialize`, so the trait
            // call must be fully qualified.
            Value::Decimal(d) => Serialize::serialize(d, serializer),
            Value::Text(t) | Value::Symbol(t) => serializer.serialize_str(t),
            Value::Uuid(u) => u.serialize(serializer),
            Value::Instant(t) => t.serialize(serializer),
            Value::Date(d) => d.serialize(serializer),
            Value::Duration(d) => d.serialize(serializer),
            Value::Sequence(items) => items.serialize(serializer),
            Value::Map(entries) => entries.serialize(serializer),
            Value::Record(r) => {
                let mut map = serializer.serialize_map(Some(r.fields.len()))?;
                for (name, value) in &r.fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    /// Scalar rendering, used for identity annotations (`[uuid=...]`) and
    /// human-readable difference output. Composites render as placeholders.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(t) | Value::Symbol(t) => write!(f, "{t}"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Instant(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Date(d) => write!(f, "{d}"),
            Value::Duration(d) => write!(f, "{d:?}"),
            Value::Sequence(items) => write!(f, "<sequence[{}]>", items.len()),
            Value::Map(entries) => write!(f, "<map[{}]>", entries.len()),
            Value::Record(r) => write!(f, "<{}>", r.type_name),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Instant(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
