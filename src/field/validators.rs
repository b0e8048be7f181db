//! Validator composition
//!
//! A `Validator` is an AND-chain of checks run against a canonical value,
//! always after conversion. Links run in the order they were added (required,
//! then type, then any extra predicate) and the first failing link is the
//! reported error.

use regex::Regex;

use super::errors::{FieldError, FieldResult};
use super::value::{FieldValue, ValueType};
use crate::model::ModelRef;

/// One link of a validator chain
#[derive(Debug, Clone)]
pub enum Check {
    /// Value must not be null
    Required,
    /// A non-null value must have this canonical type
    InstanceOf(ValueType),
    /// A non-null value must be a model of this type or one implementing it
    ChildOf(ModelRef),
    /// A non-null string must match at its start
    Pattern(Pattern),
}

/// A compiled regex with its source text
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Regex,
}

impl Pattern {
    /// Compile `source`, anchored at the start of the input.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::InvalidDeclaration` for an invalid pattern.
    pub fn new(source: &str) -> FieldResult<Self> {
        let compiled = Regex::new(&format!(r"\A(?:{})", source)).map_err(|e| {
            FieldError::invalid_declaration(format!("invalid regex '{}': {}", source, e))
        })?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl Check {
    fn run(&self, value: &FieldValue) -> FieldResult<()> {
        match (self, value) {
            (Check::Required, FieldValue::Null) => Err(FieldError::missing()),
            (Check::Required, _) => Ok(()),
            // Type and pattern checks only apply to present values
            (_, FieldValue::Null) => Ok(()),
            (Check::InstanceOf(expected), v) => {
                if v.value_type() == *expected {
                    Ok(())
                } else {
                    Err(FieldError::validation(format!(
                        "expected {}, got {}",
                        expected,
                        v.value_type()
                    )))
                }
            }
            (Check::ChildOf(model), v) => match v.as_child() {
                Some(child) if child.model_type().is_a(model.name()) => Ok(()),
                Some(child) => Err(FieldError::validation(format!(
                    "expected {}, got {}",
                    model.name(),
                    child.model_type().name()
                ))),
                None => Err(FieldError::validation(format!(
                    "expected {}, got {}",
                    model.name(),
                    v.value_type()
                ))),
            },
            (Check::Pattern(pattern), v) => match v.as_str() {
                Some(text) if pattern.is_match(text) => Ok(()),
                Some(text) => Err(FieldError::validation(format!(
                    "{:?} does not match '{}'",
                    text,
                    pattern.source()
                ))),
                None => Err(FieldError::validation(format!(
                    "pattern '{}' needs a string, got {}",
                    pattern.source(),
                    v.value_type()
                ))),
            },
        }
    }
}

/// AND-composed chain of checks
#[derive(Debug, Clone, Default)]
pub struct Validator {
    checks: Vec<Check>,
}

impl Validator {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Append a link to the chain.
    pub fn with(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Standard chain for a field: required (when set) then type.
    pub fn for_field(required: bool, type_check: Check) -> Self {
        let validator = if required {
            Self::new().with(Check::Required)
        } else {
            Self::new()
        };
        validator.with(type_check)
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn is_required(&self) -> bool {
        self.checks.iter().any(|c| matches!(c, Check::Required))
    }

    /// Run every link in order, stopping at the first failure.
    pub fn validate(&self, value: &FieldValue) -> FieldResult<()> {
        self.checks.iter().try_for_each(|check| check.run(value))
    }
}
