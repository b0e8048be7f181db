//! Field constructors, one per kind
//!
//! Each function returns a `FieldSpec` preset for its kind. Fields are
//! required unless the builder is marked optional or given a default; UUID
//! fields are the exception and generate a fresh identifier by default.
//!
//! ```ignore
//! use related::fields;
//!
//! let email = fields::regex("[^@]+@[^@]+").key("mail").build()?;
//! let tags = fields::set(ElementType::String).optional().build()?;
//! ```

use std::sync::Arc;
use uuid::Uuid;

use super::collections::ElementType;
use super::converters::Converter;
use super::descriptor::{FieldKind, FieldSpec};
use super::value::FieldValue;
use super::{DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, DEFAULT_TIME_FORMAT};
use crate::model::ModelRef;

pub fn boolean() -> FieldSpec {
    FieldSpec::new(FieldKind::Boolean, Converter::Boolean)
}

/// A nested model. `model` may be a forward reference.
pub fn child(model: impl Into<ModelRef>) -> FieldSpec {
    FieldSpec::new(FieldKind::Child, Converter::Child(model.into()))
}

pub fn date() -> FieldSpec {
    date_with(DEFAULT_DATE_FORMAT)
}

/// A date parsed and emitted with `formatter` (strftime syntax).
pub fn date_with(formatter: &str) -> FieldSpec {
    FieldSpec::new(
        FieldKind::Date,
        Converter::Date {
            formatter: formatter.to_string(),
        },
    )
    .with_formatter(formatter)
}

/// A datetime in ISO-8601 form.
pub fn date_time() -> FieldSpec {
    date_time_with(DEFAULT_DATETIME_FORMAT)
}

pub fn date_time_with(formatter: &str) -> FieldSpec {
    FieldSpec::new(
        FieldKind::DateTime,
        Converter::DateTime {
            formatter: formatter.to_string(),
        },
    )
    .with_formatter(formatter)
}

pub fn time() -> FieldSpec {
    time_with(DEFAULT_TIME_FORMAT)
}

pub fn time_with(formatter: &str) -> FieldSpec {
    FieldSpec::new(
        FieldKind::Time,
        Converter::Time {
            formatter: formatter.to_string(),
        },
    )
    .with_formatter(formatter)
}

pub fn float() -> FieldSpec {
    FieldSpec::new(FieldKind::Float, Converter::Float)
}

pub fn integer() -> FieldSpec {
    FieldSpec::new(FieldKind::Integer, Converter::Integer)
}

/// Children keyed by their `child_key` attribute.
///
/// Defaults to an empty mapping when optional.
pub fn mapping(element: impl Into<ElementType>, child_key: &str) -> FieldSpec {
    FieldSpec::new(
        FieldKind::Mapping,
        Converter::Mapping {
            element: element.into(),
            child_key: child_key.to_string(),
        },
    )
    .with_empty(FieldValue::Map(Vec::new()))
}

/// A string that must match `pattern` at its start.
pub fn regex(pattern: &str) -> FieldSpec {
    FieldSpec::new(FieldKind::Regex, Converter::String).with_pattern(pattern)
}

/// Defaults to an empty sequence when optional.
pub fn sequence(element: impl Into<ElementType>) -> FieldSpec {
    FieldSpec::new(FieldKind::Sequence, Converter::Sequence(element.into()))
        .with_empty(FieldValue::List(Vec::new()))
}

/// Defaults to an empty set when optional.
pub fn set(element: impl Into<ElementType>) -> FieldSpec {
    FieldSpec::new(FieldKind::Set, Converter::Set(element.into()))
        .with_empty(FieldValue::List(Vec::new()))
}

pub fn string() -> FieldSpec {
    FieldSpec::new(FieldKind::String, Converter::String)
}

pub fn url() -> FieldSpec {
    FieldSpec::new(FieldKind::Url, Converter::Url)
}

/// Optional by default; an absent value is a freshly generated v4 UUID.
pub fn uuid() -> FieldSpec {
    FieldSpec::new(FieldKind::Uuid, Converter::Uuid)
        .with_implicit_default(Arc::new(|| FieldValue::Uuid(Uuid::new_v4())))
        .optional()
}

pub fn decimal() -> FieldSpec {
    FieldSpec::new(FieldKind::Decimal, Converter::Decimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DefaultPolicy, FieldDescriptor};
    use crate::model::ModelType;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn all_kinds() -> Vec<FieldSpec> {
        let child_type = ModelType::builder("Leaf")
            .field("id", integer().build().unwrap())
            .build()
            .unwrap();
        let leaf = ModelRef::direct(child_type);
        vec![
            boolean(),
            child(leaf.clone()),
            date(),
            date_time(),
            time(),
            float(),
            integer(),
            mapping(leaf, "id"),
            regex("[^@]+@[^@]+"),
            sequence(ElementType::String),
            set(ElementType::String),
            string(),
            url(),
            uuid(),
            decimal(),
        ]
    }

    #[test]
    fn test_every_kind_honors_key_and_exclude() {
        for spec in all_kinds() {
            let kind = spec.kind();
            let descriptor: FieldDescriptor = spec
                .optional()
                .key(kind.name())
                .metadata("exclude", true)
                .build()
                .unwrap();
            assert!(descriptor.is_excluded(), "{} not excluded", kind);
            assert_eq!(descriptor.metadata().output_key.as_deref(), Some(kind.name()));
        }
    }

    #[test]
    fn test_every_optional_kind_accepts_its_default() {
        for spec in all_kinds() {
            let kind = spec.kind();
            let descriptor = spec.optional().build().unwrap();
            let value = descriptor.resolve_value(None);
            assert!(value.is_ok(), "{} default rejected: {:?}", kind, value);
        }
    }

    #[test]
    fn test_boolean_optional_defaults_to_null() {
        let descriptor = boolean().optional().build().unwrap();
        assert_eq!(descriptor.resolve_value(None).unwrap(), FieldValue::Null);
        assert!(descriptor.resolve_value(Some(&"true".into())).is_err());
    }

    #[test]
    fn test_uuid_default_is_factory() {
        let descriptor = uuid().build().unwrap();
        assert!(!descriptor.is_required());
        assert!(matches!(descriptor.default_policy(), DefaultPolicy::Factory(_)));

        let a = descriptor.resolve_value(None).unwrap();
        let b = descriptor.resolve_value(None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_uuid_required_has_no_default() {
        let descriptor = uuid().required(true).build().unwrap();
        assert!(descriptor.default_policy().is_none());
    }

    #[test]
    fn test_temporal_formatter_preset() {
        let descriptor = date_with("%d/%m/%Y")
            .metadata("formatter", "%Y")
            .build()
            .unwrap();
        assert_eq!(descriptor.formatter(), Some("%d/%m/%Y"));
        assert_eq!(date_time().build().unwrap().formatter(), Some("ISO_FORMAT"));
        assert_eq!(time().build().unwrap().formatter(), Some("%H:%M:%S"));
        assert_eq!(string().build().unwrap().formatter(), None);
    }

    #[test]
    fn test_regex_field_validates_pattern() {
        let descriptor = regex("[^@]+@[^@]+").build().unwrap();
        assert!(descriptor.resolve_value(Some(&"a@b.c".into())).is_ok());
        let err = descriptor.resolve_value(Some(&"nobody".into())).unwrap_err();
        assert_eq!(err.code(), "RELATED_VALIDATION_FAILED");
    }

    #[test]
    fn test_regex_invalid_pattern_rejected_at_build() {
        assert!(regex("[").build().is_err());
    }

    #[test]
    fn test_decimal_scenarios() {
        let descriptor = decimal().build().unwrap();
        let zero = descriptor.resolve_value(Some(&FieldValue::Float(0.0))).unwrap();
        assert_eq!(zero.as_decimal(), Some(Decimal::ZERO));
        let err = descriptor.resolve_value(Some(&"abc".into())).unwrap_err();
        assert_eq!(err.code(), "RELATED_CONVERSION_FAILED");
    }

    #[test]
    fn test_required_with_default_rejected() {
        let err = integer().default(1).required(true).build().unwrap_err();
        assert_eq!(err.code(), "RELATED_INVALID_DECLARATION");
    }

    #[test]
    fn test_collections_hidden_from_repr_by_default() {
        assert!(!sequence(ElementType::Integer).build().unwrap().in_repr());
        assert!(!set(ElementType::Integer).build().unwrap().in_repr());
        assert!(string().build().unwrap().in_repr());
        assert!(!string().repr(false).build().unwrap().in_repr());
    }

    #[test]
    fn test_extra_metadata_preserved() {
        let descriptor = string()
            .metadata("owner", json!({"team": "billing"}))
            .build()
            .unwrap();
        assert_eq!(
            descriptor.metadata().get("owner"),
            Some(&json!({"team": "billing"}))
        );
    }
}
