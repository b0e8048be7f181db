//! The value model carried through the field pipeline
//!
//! `FieldValue` holds both raw shapes (lists and maps lifted from a
//! loosely-typed tree) and canonical shapes (temporal values, decimals,
//! typed collections, nested models). Converters map the former onto the
//! latter; validators only ever look at the latter.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use url::Url;
use uuid::Uuid;

use super::collections::{TypedMapping, TypedSequence, TypedSet};
use super::errors::{FieldError, FieldResult};
use crate::model::Model;

/// Type tag of a `FieldValue`, used by the type check and in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Date,
    DateTime,
    Time,
    Decimal,
    Uuid,
    Url,
    Child,
    Sequence,
    Set,
    Mapping,
}

impl ValueType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "string",
            ValueType::List => "list",
            ValueType::Map => "map",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::Time => "time",
            ValueType::Decimal => "decimal",
            ValueType::Uuid => "uuid",
            ValueType::Url => "url",
            ValueType::Child => "child",
            ValueType::Sequence => "sequence",
            ValueType::Set => "set",
            ValueType::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A raw or canonical field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Raw, untyped list
    List(Vec<FieldValue>),
    /// Raw, untyped map in insertion order
    Map(Vec<(String, FieldValue)>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Decimal(Decimal),
    Uuid(Uuid),
    Url(Url),
    Child(Model),
    Sequence(TypedSequence),
    Set(TypedSet),
    Mapping(TypedMapping),
}

impl FieldValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldValue::Null => ValueType::Null,
            FieldValue::Bool(_) => ValueType::Bool,
            FieldValue::Int(_) => ValueType::Int,
            FieldValue::Float(_) => ValueType::Float,
            FieldValue::Str(_) => ValueType::Str,
            FieldValue::List(_) => ValueType::List,
            FieldValue::Map(_) => ValueType::Map,
            FieldValue::Date(_) => ValueType::Date,
            FieldValue::DateTime(_) => ValueType::DateTime,
            FieldValue::Time(_) => ValueType::Time,
            FieldValue::Decimal(_) => ValueType::Decimal,
            FieldValue::Uuid(_) => ValueType::Uuid,
            FieldValue::Url(_) => ValueType::Url,
            FieldValue::Child(_) => ValueType::Child,
            FieldValue::Sequence(_) => ValueType::Sequence,
            FieldValue::Set(_) => ValueType::Set,
            FieldValue::Mapping(_) => ValueType::Mapping,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_child(&self) -> Option<&Model> {
        match self {
            FieldValue::Child(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&TypedSequence> {
        match self {
            FieldValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&TypedSet> {
        match self {
            FieldValue::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&TypedMapping> {
        match self {
            FieldValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Short rendering of the value for error messages.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(n) => n.to_string(),
            FieldValue::Str(s) => format!("{:?}", s),
            FieldValue::Date(d) => d.to_string(),
            FieldValue::DateTime(dt) => dt.to_string(),
            FieldValue::Time(t) => t.to_string(),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Uuid(u) => u.to_string(),
            FieldValue::Url(u) => u.to_string(),
            FieldValue::Child(m) => format!("<{}>", m.model_type().name()),
            other => format!("<{}>", other.value_type()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                // u64 beyond i64 and real floats both land here
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Str(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        FieldValue::from(value.clone())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Float(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(dt: NaiveDateTime) -> Self {
        FieldValue::DateTime(dt)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(t: NaiveTime) -> Self {
        FieldValue::Time(t)
    }
}

impl From<Decimal> for FieldValue {
    fn from(d: Decimal) -> Self {
        FieldValue::Decimal(d)
    }
}

impl From<Uuid> for FieldValue {
    fn from(u: Uuid) -> Self {
        FieldValue::Uuid(u)
    }
}

impl From<Url> for FieldValue {
    fn from(u: Url) -> Self {
        FieldValue::Url(u)
    }
}

impl From<Model> for FieldValue {
    fn from(m: Model) -> Self {
        FieldValue::Child(m)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::List(items)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Key of a `TypedMapping`, derived from a child attribute.
///
/// Only the hashable canonical shapes qualify.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Str(String),
    Uuid(Uuid),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl MapKey {
    /// Derive a key from a canonical value.
    pub fn from_value(value: &FieldValue) -> FieldResult<Self> {
        match value {
            FieldValue::Bool(b) => Ok(MapKey::Bool(*b)),
            FieldValue::Int(n) => Ok(MapKey::Int(*n)),
            FieldValue::Str(s) => Ok(MapKey::Str(s.clone())),
            FieldValue::Uuid(u) => Ok(MapKey::Uuid(*u)),
            FieldValue::Decimal(d) => Ok(MapKey::Decimal(d.normalize())),
            FieldValue::Date(d) => Ok(MapKey::Date(*d)),
            FieldValue::DateTime(dt) => Ok(MapKey::DateTime(*dt)),
            FieldValue::Time(t) => Ok(MapKey::Time(*t)),
            other => Err(FieldError::conversion(
                other.render(),
                format!("a {} cannot be used as a mapping key", other.value_type()),
            )),
        }
    }

    pub fn to_value(&self) -> FieldValue {
        match self {
            MapKey::Bool(b) => FieldValue::Bool(*b),
            MapKey::Int(n) => FieldValue::Int(*n),
            MapKey::Str(s) => FieldValue::Str(s.clone()),
            MapKey::Uuid(u) => FieldValue::Uuid(*u),
            MapKey::Decimal(d) => FieldValue::Decimal(*d),
            MapKey::Date(d) => FieldValue::Date(*d),
            MapKey::DateTime(dt) => FieldValue::DateTime(*dt),
            MapKey::Time(t) => FieldValue::Time(*t),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{}", b),
            MapKey::Int(n) => write!(f, "{}", n),
            MapKey::Str(s) => write!(f, "{}", s),
            MapKey::Uuid(u) => write!(f, "{}", u),
            MapKey::Decimal(d) => write!(f, "{}", d),
            MapKey::Date(d) => write!(f, "{}", d.format(super::DEFAULT_DATE_FORMAT)),
            MapKey::DateTime(dt) => write!(f, "{}", dt.format(super::ISO_EMIT_FORMAT)),
            MapKey::Time(t) => write!(f, "{}", t.format(super::DEFAULT_TIME_FORMAT)),
        }
    }
}

impl From<i64> for MapKey {
    fn from(n: i64) -> Self {
        MapKey::Int(n)
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_lifts_to_raw_shapes() {
        let value = FieldValue::from(json!({
            "name": "Alice",
            "age": 30,
            "score": 9.5,
            "tags": ["a", "b"],
            "active": true,
            "nothing": null
        }));

        let FieldValue::Map(entries) = value else {
            panic!("expected a raw map");
        };
        let get = |k: &str| entries.iter().find(|(key, _)| key == k).map(|(_, v)| v.clone());
        assert_eq!(get("name"), Some(FieldValue::Str("Alice".into())));
        assert_eq!(get("age"), Some(FieldValue::Int(30)));
        assert_eq!(get("score"), Some(FieldValue::Float(9.5)));
        assert_eq!(get("active"), Some(FieldValue::Bool(true)));
        assert_eq!(get("nothing"), Some(FieldValue::Null));
        assert_eq!(
            get("tags"),
            Some(FieldValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(FieldValue::Null.value_type().type_name(), "null");
        assert_eq!(FieldValue::Int(1).value_type().type_name(), "int");
        assert_eq!(FieldValue::from("x").value_type().type_name(), "string");
        assert_eq!(FieldValue::List(vec![]).value_type().type_name(), "list");
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(3i64)), FieldValue::Int(3));
    }

    #[test]
    fn test_map_key_rejects_floats() {
        let err = MapKey::from_value(&FieldValue::Float(1.5)).unwrap_err();
        assert_eq!(err.code(), "RELATED_CONVERSION_FAILED");
    }

    #[test]
    fn test_map_key_decimal_normalized() {
        let a = MapKey::from_value(&FieldValue::Decimal(Decimal::new(10, 1))).unwrap();
        let b = MapKey::from_value(&FieldValue::Decimal(Decimal::new(1, 0))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_map_key_display() {
        assert_eq!(MapKey::Int(7).to_string(), "7");
        assert_eq!(MapKey::Str("id".into()).to_string(), "id");
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(MapKey::Date(date).to_string(), "2024-01-31");
    }
}
