//! Default value policy for fields
//!
//! A field's `(required, default)` pair is resolved once, when the field is
//! declared, into a `DefaultPolicy`. The policy is consulted on every
//! instantiation where the field's raw value is absent.

use std::fmt;
use std::sync::Arc;

use super::errors::{FieldError, FieldResult};
use super::value::FieldValue;

/// Zero-argument generator for per-instance defaults
pub type DefaultFactory = Arc<dyn Fn() -> FieldValue + Send + Sync>;

/// A default supplied by the caller when declaring a field
#[derive(Clone)]
pub enum FieldDefault {
    /// The same value for every instance
    Value(FieldValue),
    /// Invoked once per instantiation
    Factory(DefaultFactory),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Factory(_) => write!(f, "Factory(<fn>)"),
        }
    }
}

/// What fills a field when its raw value is absent
#[derive(Clone)]
pub enum DefaultPolicy {
    /// No default; the field must be supplied
    None,
    Fixed(FieldValue),
    Factory(DefaultFactory),
}

impl DefaultPolicy {
    /// Produce the default for one instantiation.
    ///
    /// Returns `None` for fields without a default. Factories are called on
    /// every invocation and never memoized.
    pub fn produce(&self) -> Option<FieldValue> {
        match self {
            DefaultPolicy::None => None,
            DefaultPolicy::Fixed(value) => Some(value.clone()),
            DefaultPolicy::Factory(factory) => Some(factory()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DefaultPolicy::None)
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, DefaultPolicy::Factory(_))
    }
}

impl fmt::Debug for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultPolicy::None => write!(f, "None"),
            DefaultPolicy::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            DefaultPolicy::Factory(_) => write!(f, "Factory(<fn>)"),
        }
    }
}

/// Resolve a field's default policy.
///
/// # Arguments
///
/// * `required` - whether the field must be supplied
/// * `default` - the caller's default, if any
/// * `empty` - the kind's empty-container sentinel, if it has one
///
/// # Errors
///
/// A required field may not carry a default.
pub fn resolve(
    required: bool,
    default: Option<FieldDefault>,
    empty: Option<FieldValue>,
) -> FieldResult<DefaultPolicy> {
    match (required, default) {
        (true, Some(_)) => Err(FieldError::invalid_declaration(
            "a required field cannot declare a default",
        )),
        (true, None) => Ok(DefaultPolicy::None),
        (false, None) => Ok(DefaultPolicy::Fixed(empty.unwrap_or(FieldValue::Null))),
        (false, Some(FieldDefault::Factory(factory))) => Ok(DefaultPolicy::Factory(factory)),
        (false, Some(FieldDefault::Value(value))) => Ok(DefaultPolicy::Fixed(value)),
    }
}
