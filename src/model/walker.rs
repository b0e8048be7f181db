//! Tree walkers
//!
//! Move models to and from loosely-typed trees (`serde_json::Value`) and
//! their JSON and YAML text forms.
//!
//! Writing: each non-excluded field lands under its output key. Temporal
//! values use the field's formatter; decimals, UUIDs and URLs become
//! strings; sets become arrays; mappings become objects keyed by the
//! rendered child key.
//!
//! Reading: the root must be an object. Keys are matched back to fields
//! through their output keys and every value runs through the field's
//! pipeline, so a tree produced by `to_value` reads back into an equal
//! model (excluded fields take their default).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

use super::types::{Model, ModelType};
use crate::config::WalkerConfig;
use crate::field::{
    FieldError, FieldResult, FieldValue, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, ISO_EMIT_FORMAT,
    ISO_FORMAT,
};
use crate::observability::{log_event, Event};

/// Write `model` as a JSON value tree.
pub fn to_value(model: &Model) -> Value {
    let mut object = Map::new();
    for (field, value) in model.iter() {
        let descriptor = field.descriptor();
        if descriptor.is_excluded() {
            continue;
        }
        object.insert(
            field.output_key().to_string(),
            encode(value, descriptor.formatter()),
        );
    }
    Value::Object(object)
}

fn encode(value: &FieldValue, formatter: Option<&str>) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(n) => Value::Number((*n).into()),
        // Non-finite floats have no JSON form
        FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Str(s) => Value::String(s.clone()),
        FieldValue::List(items) => Value::Array(items.iter().map(|v| encode(v, None)).collect()),
        FieldValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), encode(v, None)))
                .collect(),
        ),
        FieldValue::Date(d) => Value::String(format_date(d, formatter)),
        FieldValue::DateTime(dt) => Value::String(format_datetime(dt, formatter)),
        FieldValue::Time(t) => Value::String(format_time(t, formatter)),
        FieldValue::Decimal(d) => Value::String(d.to_string()),
        FieldValue::Uuid(u) => Value::String(u.to_string()),
        FieldValue::Url(u) => Value::String(u.to_string()),
        FieldValue::Child(child) => to_value(child),
        FieldValue::Sequence(seq) => Value::Array(seq.iter().map(|v| encode(v, None)).collect()),
        FieldValue::Set(set) => Value::Array(set.iter().map(|v| encode(v, None)).collect()),
        FieldValue::Mapping(mapping) => Value::Object(
            mapping
                .iter()
                .map(|(k, v)| (k.to_string(), encode(v, None)))
                .collect(),
        ),
    }
}

fn format_date(d: &NaiveDate, formatter: Option<&str>) -> String {
    d.format(formatter.unwrap_or(DEFAULT_DATE_FORMAT)).to_string()
}

fn format_datetime(dt: &NaiveDateTime, formatter: Option<&str>) -> String {
    match formatter {
        Some(f) if f != ISO_FORMAT => dt.format(f).to_string(),
        _ => dt.format(ISO_EMIT_FORMAT).to_string(),
    }
}

fn format_time(t: &NaiveTime, formatter: Option<&str>) -> String {
    t.format(formatter.unwrap_or(DEFAULT_TIME_FORMAT)).to_string()
}

/// Read a model of `model_type` from a JSON value tree with the default
/// configuration.
pub fn from_value(model_type: &Arc<ModelType>, value: &Value) -> FieldResult<Model> {
    from_value_with(model_type, value, &WalkerConfig::default())
}

/// Read a model of `model_type` from a JSON value tree.
///
/// # Errors
///
/// - `Decode` when the root is not an object
/// - `UnknownField` for an unclaimed root key under
///   `reject_unknown_keys`
/// - any field pipeline error
pub fn from_value_with(
    model_type: &Arc<ModelType>,
    value: &Value,
    config: &WalkerConfig,
) -> FieldResult<Model> {
    let entries = match FieldValue::from(value) {
        FieldValue::Map(entries) => entries,
        other => {
            let err = FieldError::Decode {
                reason: format!(
                    "{} expects an object at the root, got {}",
                    model_type.name(),
                    other.value_type()
                ),
            };
            return Err(report(model_type, config, err));
        }
    };

    if config.reject_unknown_keys {
        if let Some(key) = model_type.unknown_keys(&entries).first() {
            if config.log_failures {
                log_event(
                    Event::WalkerUnknownKey,
                    &[("key", *key), ("model", model_type.name())],
                );
            }
            return Err(FieldError::UnknownField {
                field: key.to_string(),
            });
        }
    }

    model_type
        .from_map(&entries)
        .map_err(|err| report(model_type, config, err))
}

fn report(model_type: &ModelType, config: &WalkerConfig, err: FieldError) -> FieldError {
    if config.log_failures {
        log_event(
            Event::WalkerDecodeFailed,
            &[
                ("code", err.code()),
                ("field", err.field().unwrap_or("")),
                ("model", model_type.name()),
            ],
        );
    }
    err
}

pub fn to_json(model: &Model) -> FieldResult<String> {
    serde_json::to_string(&to_value(model)).map_err(|e| FieldError::Encode {
        reason: e.to_string(),
    })
}

pub fn to_json_pretty(model: &Model) -> FieldResult<String> {
    serde_json::to_string_pretty(&to_value(model)).map_err(|e| FieldError::Encode {
        reason: e.to_string(),
    })
}

pub fn from_json(model_type: &Arc<ModelType>, text: &str) -> FieldResult<Model> {
    let value: Value = serde_json::from_str(text).map_err(|e| FieldError::Decode {
        reason: format!("invalid JSON: {}", e),
    })?;
    from_value(model_type, &value)
}

pub fn to_yaml(model: &Model) -> FieldResult<String> {
    serde_yaml::to_string(&to_value(model)).map_err(|e| FieldError::Encode {
        reason: e.to_string(),
    })
}

pub fn from_yaml(model_type: &Arc<ModelType>, text: &str) -> FieldResult<Model> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| FieldError::Decode {
        reason: format!("invalid YAML: {}", e),
    })?;
    from_value(model_type, &value)
}
