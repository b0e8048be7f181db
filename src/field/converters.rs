//! Per-kind value converters
//!
//! Conversion semantics:
//! - One converter per field kind, chosen when the field is declared
//! - Pure: the only side effect is UUID generation for a null input
//! - Idempotent on canonical input: `convert(convert(x)) == convert(x)`
//! - Null passes through for scalar kinds; collections turn it into an
//!   empty collection
//!
//! Booleans are never coerced from strings.

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use super::collections::{ElementType, TypedMapping, TypedSequence, TypedSet};
use super::errors::{FieldError, FieldResult};
use super::value::FieldValue;
use super::ISO_FORMAT;
use crate::model::ModelRef;

/// Conversion function for one field kind
#[derive(Debug, Clone)]
pub enum Converter {
    Boolean,
    Integer,
    Float,
    /// Used by both string and regex fields
    String,
    Date { formatter: String },
    DateTime { formatter: String },
    Time { formatter: String },
    Decimal,
    Uuid,
    Url,
    Child(ModelRef),
    Sequence(ElementType),
    Set(ElementType),
    Mapping { element: ElementType, child_key: String },
}

impl Converter {
    /// Convert a raw value to this kind's canonical form.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::Conversion` when the raw shape is not accepted,
    /// or the nested error of a child model or collection element.
    pub fn convert(&self, raw: &FieldValue) -> FieldResult<FieldValue> {
        match self {
            Converter::Boolean => to_bool(raw),
            Converter::Integer => to_int(raw),
            Converter::Float => to_float(raw),
            Converter::String => to_string(raw),
            Converter::Date { formatter } => to_date(raw, formatter),
            Converter::DateTime { formatter } => to_datetime(raw, formatter),
            Converter::Time { formatter } => to_time(raw, formatter),
            Converter::Decimal => to_decimal(raw),
            Converter::Uuid => to_uuid(raw),
            Converter::Url => to_url(raw),
            Converter::Child(model) => to_child(raw, model),
            Converter::Sequence(element) => to_sequence(raw, element),
            Converter::Set(element) => to_set(raw, element),
            Converter::Mapping { element, child_key } => to_mapping(raw, element, child_key),
        }
    }
}

fn reject(raw: &FieldValue, expected: &str) -> FieldError {
    FieldError::conversion(
        raw.render(),
        format!("expected {}, got {}", expected, raw.value_type()),
    )
}

fn to_bool(raw: &FieldValue) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Bool(_) => Ok(raw.clone()),
        other => Err(reject(other, "bool")),
    }
}

const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn to_int(raw: &FieldValue) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Int(_) => Ok(raw.clone()),
        FieldValue::Float(f) => {
            let truncated = f.trunc();
            // i64::MAX rounds up to 2^63 as a float, so the upper bound is exclusive
            if truncated >= I64_LOWER && truncated < I64_UPPER {
                Ok(FieldValue::Int(truncated as i64))
            } else {
                Err(FieldError::conversion(raw.render(), "float out of integer range"))
            }
        }
        FieldValue::Decimal(d) => d
            .trunc()
            .to_i64()
            .map(FieldValue::Int)
            .ok_or_else(|| FieldError::conversion(raw.render(), "decimal out of integer range")),
        FieldValue::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|e| FieldError::conversion(raw.render(), format!("invalid integer: {}", e))),
        other => Err(reject(other, "integer")),
    }
}

fn to_float(raw: &FieldValue) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Float(_) => Ok(raw.clone()),
        FieldValue::Int(n) => Ok(FieldValue::Float(*n as f64)),
        FieldValue::Decimal(d) => d
            .to_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| FieldError::conversion(raw.render(), "decimal out of float range")),
        FieldValue::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|e| FieldError::conversion(raw.render(), format!("invalid float: {}", e))),
        other => Err(reject(other, "float")),
    }
}

/// Renders a float the way a loosely-typed host would (`1.0`, not `1`).
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn to_string(raw: &FieldValue) -> FieldResult<FieldValue> {
    let text = match raw {
        FieldValue::Null | FieldValue::Str(_) => return Ok(raw.clone()),
        FieldValue::Bool(true) => "True".to_string(),
        FieldValue::Bool(false) => "False".to_string(),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Float(f) => float_text(*f),
        FieldValue::Decimal(d) => d.to_string(),
        FieldValue::Uuid(u) => u.to_string(),
        FieldValue::Url(u) => u.to_string(),
        FieldValue::Date(d) => d.to_string(),
        FieldValue::DateTime(dt) => dt.to_string(),
        FieldValue::Time(t) => t.to_string(),
        other => return Err(reject(other, "a string-like value")),
    };
    Ok(FieldValue::Str(text))
}

fn to_date(raw: &FieldValue, formatter: &str) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Date(_) => Ok(raw.clone()),
        FieldValue::DateTime(dt) => Ok(FieldValue::Date(dt.date())),
        FieldValue::Str(s) => parse_formatted(s, formatter)
            .map(|dt| FieldValue::Date(dt.date()))
            .ok_or_else(|| mismatch(raw, formatter)),
        other => Err(reject(other, "date")),
    }
}

fn mismatch(raw: &FieldValue, formatter: &str) -> FieldError {
    FieldError::conversion(raw.render(), format!("does not match '{}'", formatter))
}

/// Parses `s` against a strftime `formatter` that may name only part of a
/// timestamp.
///
/// Missing date parts default to 1900-01-01 piecewise and a missing time to
/// midnight, so `%Y-%m` and `%Y-%m-%d` datetimes parse.
fn parse_formatted(s: &str, formatter: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, s, StrftimeItems::new(formatter)).ok()?;

    // Setters refuse to overwrite a parsed value, so only gaps are filled
    let date = match parsed.to_naive_date() {
        Ok(date) => date,
        Err(_) => {
            let _ = parsed.set_year(1900);
            let _ = parsed.set_month(1);
            let _ = parsed.set_day(1);
            parsed.to_naive_date().ok()?
        }
    };
    let time = match parsed.to_naive_time() {
        Ok(time) => time,
        Err(_) => {
            let _ = parsed.set_hour(0);
            let _ = parsed.set_minute(0);
            parsed.to_naive_time().ok()?
        }
    };
    Some(date.and_time(time))
}

/// Parses the ISO-8601 forms accepted for `ISO_FORMAT` datetimes.
///
/// Naive forms keep their wall time; offsets are normalized to UTC.
fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn to_datetime(raw: &FieldValue, formatter: &str) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::DateTime(_) => Ok(raw.clone()),
        FieldValue::Str(s) => {
            let parsed = if formatter == ISO_FORMAT {
                parse_iso_datetime(s.trim())
            } else {
                parse_formatted(s, formatter)
            };
            parsed
                .map(FieldValue::DateTime)
                .ok_or_else(|| mismatch(raw, formatter))
        }
        other => Err(reject(other, "datetime")),
    }
}

fn to_time(raw: &FieldValue, formatter: &str) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Time(_) => Ok(raw.clone()),
        FieldValue::DateTime(dt) => Ok(FieldValue::Time(dt.time())),
        FieldValue::Str(s) => parse_formatted(s, formatter)
            .map(|dt| FieldValue::Time(dt.time()))
            .ok_or_else(|| mismatch(raw, formatter)),
        other => Err(reject(other, "time")),
    }
}

fn to_decimal(raw: &FieldValue) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Decimal(_) => Ok(raw.clone()),
        FieldValue::Int(n) => Ok(FieldValue::Decimal(Decimal::from(*n))),
        FieldValue::Float(f) => Decimal::from_f64(*f)
            .map(FieldValue::Decimal)
            .ok_or_else(|| FieldError::conversion(raw.render(), "float has no decimal form")),
        FieldValue::Str(s) => {
            let text = s.trim();
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .map(FieldValue::Decimal)
                .map_err(|e| FieldError::conversion(raw.render(), format!("invalid decimal: {}", e)))
        }
        other => Err(reject(other, "decimal")),
    }
}

fn to_uuid(raw: &FieldValue) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null => Ok(FieldValue::Uuid(Uuid::new_v4())),
        FieldValue::Uuid(_) => Ok(raw.clone()),
        FieldValue::Str(s) => Uuid::parse_str(s.trim())
            .map(FieldValue::Uuid)
            .map_err(|e| FieldError::conversion(raw.render(), format!("invalid uuid: {}", e))),
        other => Err(reject(other, "uuid")),
    }
}

fn to_url(raw: &FieldValue) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Url(_) => Ok(raw.clone()),
        FieldValue::Str(s) => Url::parse(s)
            .map(FieldValue::Url)
            .map_err(|e| FieldError::conversion(raw.render(), format!("invalid url: {}", e))),
        other => Err(reject(other, "url")),
    }
}

fn to_child(raw: &FieldValue, model: &ModelRef) -> FieldResult<FieldValue> {
    match raw {
        FieldValue::Null | FieldValue::Child(_) => Ok(raw.clone()),
        FieldValue::Map(entries) => {
            let model_type = model.resolve()?;
            model_type.from_map(entries).map(FieldValue::Child)
        }
        other => Err(reject(other, model.name())),
    }
}

fn to_sequence(raw: &FieldValue, element: &ElementType) -> FieldResult<FieldValue> {
    let sequence = match raw {
        FieldValue::Null => TypedSequence::empty(element.clone()),
        FieldValue::List(items) => TypedSequence::new(element.clone(), items)?,
        FieldValue::Sequence(seq) => TypedSequence::new(element.clone(), seq.iter())?,
        FieldValue::Set(set) => TypedSequence::new(element.clone(), set.iter())?,
        other => return Err(reject(other, "a list")),
    };
    Ok(FieldValue::Sequence(sequence))
}

fn to_set(raw: &FieldValue, element: &ElementType) -> FieldResult<FieldValue> {
    let set = match raw {
        FieldValue::Null => TypedSet::empty(element.clone()),
        FieldValue::List(items) => TypedSet::new(element.clone(), items)?,
        FieldValue::Set(set) => TypedSet::new(element.clone(), set.iter())?,
        FieldValue::Sequence(seq) => TypedSet::new(element.clone(), seq.iter())?,
        other => return Err(reject(other, "a list or set")),
    };
    Ok(FieldValue::Set(set))
}

fn to_mapping(raw: &FieldValue, element: &ElementType, child_key: &str) -> FieldResult<FieldValue> {
    let mapping = match raw {
        FieldValue::Null => TypedMapping::empty(element.clone(), child_key),
        FieldValue::Map(entries) => {
            TypedMapping::new(element.clone(), child_key, entries.iter().map(|(_, v)| v))?
        }
        FieldValue::List(children) => TypedMapping::new(element.clone(), child_key, children)?,
        FieldValue::Mapping(mapping) => {
            TypedMapping::new(element.clone(), child_key, mapping.values())?
        }
        other => return Err(reject(other, "a mapping or list of children")),
    };
    Ok(FieldValue::Mapping(mapping))
}
