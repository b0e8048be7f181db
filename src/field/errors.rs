//! Field pipeline error types
//!
//! Error codes:
//! - RELATED_MISSING_REQUIRED_FIELD
//! - RELATED_CONVERSION_FAILED
//! - RELATED_VALIDATION_FAILED
//! - RELATED_ELEMENT_FAILED
//! - RELATED_INVALID_DECLARATION
//! - RELATED_UNRESOLVED_TYPE
//! - RELATED_UNKNOWN_FIELD
//! - RELATED_DUPLICATE_FIELD
//! - RELATED_ABSTRACT_MODEL
//! - RELATED_DECODE_FAILED
//! - RELATED_ENCODE_FAILED

use thiserror::Error;

/// Result type for field pipeline operations
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised while declaring fields or constructing models.
///
/// Every error is local to one field's pipeline. The `field` carried by the
/// variants is a path (`address.city`, `tags[1]`) that grows as the error
/// propagates out of nested models and collections. It is empty while the
/// error is still inside a bare converter or validator.
#[derive(Debug, Clone, Error)]
pub enum FieldError {
    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },

    #[error("cannot convert {value} for field '{field}': {reason}")]
    Conversion {
        field: String,
        value: String,
        reason: String,
    },

    #[error("field '{field}' failed validation: {reason}")]
    Validation { field: String, reason: String },

    #[error("element {index} of '{field}' rejected: {source}")]
    Element {
        field: String,
        index: usize,
        #[source]
        source: Box<FieldError>,
    },

    #[error("invalid field declaration: {reason}")]
    InvalidDeclaration { reason: String },

    #[error("model type '{name}' is not registered")]
    UnresolvedType { name: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' supplied more than once")]
    DuplicateField { field: String },

    #[error("model type '{name}' is abstract and cannot be constructed")]
    AbstractModel { name: String },

    #[error("decode failed: {reason}")]
    Decode { reason: String },

    #[error("encode failed: {reason}")]
    Encode { reason: String },
}

impl FieldError {
    /// Create a conversion error for a raw value that has no field context yet.
    pub fn conversion(value: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError::Conversion {
            field: String::new(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error without field context.
    pub fn validation(reason: impl Into<String>) -> Self {
        FieldError::Validation {
            field: String::new(),
            reason: reason.into(),
        }
    }

    pub fn missing() -> Self {
        FieldError::MissingRequiredField {
            field: String::new(),
        }
    }

    pub fn element(index: usize, source: FieldError) -> Self {
        FieldError::Element {
            field: String::new(),
            index,
            source: Box::new(source),
        }
    }

    pub fn invalid_declaration(reason: impl Into<String>) -> Self {
        FieldError::InvalidDeclaration {
            reason: reason.into(),
        }
    }

    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::MissingRequiredField { .. } => "RELATED_MISSING_REQUIRED_FIELD",
            FieldError::Conversion { .. } => "RELATED_CONVERSION_FAILED",
            FieldError::Validation { .. } => "RELATED_VALIDATION_FAILED",
            FieldError::Element { .. } => "RELATED_ELEMENT_FAILED",
            FieldError::InvalidDeclaration { .. } => "RELATED_INVALID_DECLARATION",
            FieldError::UnresolvedType { .. } => "RELATED_UNRESOLVED_TYPE",
            FieldError::UnknownField { .. } => "RELATED_UNKNOWN_FIELD",
            FieldError::DuplicateField { .. } => "RELATED_DUPLICATE_FIELD",
            FieldError::AbstractModel { .. } => "RELATED_ABSTRACT_MODEL",
            FieldError::Decode { .. } => "RELATED_DECODE_FAILED",
            FieldError::Encode { .. } => "RELATED_ENCODE_FAILED",
        }
    }

    /// Returns the field path this error is attached to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            FieldError::MissingRequiredField { field }
            | FieldError::Conversion { field, .. }
            | FieldError::Validation { field, .. }
            | FieldError::Element { field, .. }
            | FieldError::UnknownField { field }
            | FieldError::DuplicateField { field } => Some(field),
            _ => None,
        }
    }

    /// Returns the innermost cause, unwrapping element errors.
    pub fn root_cause(&self) -> &FieldError {
        match self {
            FieldError::Element { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Prefix the error's field path with `name`.
    ///
    /// `""` becomes `name`, `"[2]"` becomes `name[2]`, `"city"` becomes
    /// `name.city`. Errors without a field path are returned unchanged.
    pub fn in_field(mut self, name: &str) -> Self {
        match &mut self {
            FieldError::MissingRequiredField { field }
            | FieldError::Conversion { field, .. }
            | FieldError::Validation { field, .. }
            | FieldError::Element { field, .. }
            | FieldError::UnknownField { field }
            | FieldError::DuplicateField { field } => {
                *field = make_path(name, field);
            }
            _ => {}
        }
        self
    }
}

/// Creates a field path from a prefix and the path below it.
fn make_path(prefix: &str, rest: &str) -> String {
    if rest.is_empty() {
        prefix.to_string()
    } else if prefix.is_empty() || rest.starts_with('[') {
        format!("{}{}", prefix, rest)
    } else {
        format!("{}.{}", prefix, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(FieldError::missing().code(), "RELATED_MISSING_REQUIRED_FIELD");
        assert_eq!(
            FieldError::conversion("\"abc\"", "not a number").code(),
            "RELATED_CONVERSION_FAILED"
        );
        assert_eq!(FieldError::validation("bad").code(), "RELATED_VALIDATION_FAILED");
        assert_eq!(
            FieldError::element(0, FieldError::missing()).code(),
            "RELATED_ELEMENT_FAILED"
        );
        assert_eq!(
            FieldError::DuplicateField { field: "a".to_string() }.code(),
            "RELATED_DUPLICATE_FIELD"
        );
    }

    #[test]
    fn test_in_field_builds_paths() {
        let err = FieldError::missing().in_field("city").in_field("address");
        assert_eq!(err.field(), Some("address.city"));

        let err = FieldError::element(1, FieldError::validation("bad")).in_field("tags");
        assert_eq!(err.field(), Some("tags"));

        let err = FieldError::validation("bad")
            .in_field("tags[1]")
            .in_field("post");
        assert_eq!(err.field(), Some("post.tags[1]"));
    }

    #[test]
    fn test_root_cause_unwraps_elements() {
        let err = FieldError::element(
            2,
            FieldError::element(0, FieldError::conversion("x", "nope")),
        );
        assert_eq!(err.root_cause().code(), "RELATED_CONVERSION_FAILED");
    }

    #[test]
    fn test_display_includes_field_and_reason() {
        let err = FieldError::conversion("\"abc\"", "invalid decimal").in_field("price");
        let display = format!("{}", err);
        assert!(display.contains("price"));
        assert!(display.contains("invalid decimal"));
        assert!(display.contains("abc"));
    }

    #[test]
    fn test_declaration_errors_have_no_field() {
        let err = FieldError::invalid_declaration("bad regex").in_field("email");
        assert!(err.field().is_none());
    }
}
