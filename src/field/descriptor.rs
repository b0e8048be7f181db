//! Field descriptors
//!
//! A `FieldDescriptor` bundles everything the model assembler and the tree
//! walkers need to know about one attribute: its kind, default policy,
//! converter, validator and serialization metadata. Descriptors are built
//! once through a `FieldSpec` and are read-only afterwards.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::collections::ElementType;
use super::converters::Converter;
use super::defaults::{self, DefaultFactory, DefaultPolicy, FieldDefault};
use super::errors::{FieldError, FieldResult};
use super::validators::{Check, Pattern, Validator};
use super::value::{FieldValue, ValueType};

/// Metadata keys this crate reads itself
const KEY_META: &str = "key";
const EXCLUDE_META: &str = "exclude";
const FORMATTER_META: &str = "formatter";

/// The kind of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Boolean,
    Child,
    Date,
    DateTime,
    Time,
    Float,
    Integer,
    Mapping,
    Regex,
    Sequence,
    Set,
    String,
    Url,
    Uuid,
    Decimal,
}

impl FieldKind {
    /// Returns the kind name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Child => "child",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Time => "time",
            FieldKind::Float => "float",
            FieldKind::Integer => "integer",
            FieldKind::Mapping => "mapping",
            FieldKind::Regex => "regex",
            FieldKind::Sequence => "sequence",
            FieldKind::Set => "set",
            FieldKind::String => "string",
            FieldKind::Url => "url",
            FieldKind::Uuid => "uuid",
            FieldKind::Decimal => "decimal",
        }
    }

    /// The canonical type every converted value of this kind has
    pub fn canonical_type(&self) -> ValueType {
        match self {
            FieldKind::Boolean => ValueType::Bool,
            FieldKind::Child => ValueType::Child,
            FieldKind::Date => ValueType::Date,
            FieldKind::DateTime => ValueType::DateTime,
            FieldKind::Time => ValueType::Time,
            FieldKind::Float => ValueType::Float,
            FieldKind::Integer => ValueType::Int,
            FieldKind::Mapping => ValueType::Mapping,
            FieldKind::Regex | FieldKind::String => ValueType::Str,
            FieldKind::Sequence => ValueType::Sequence,
            FieldKind::Set => ValueType::Set,
            FieldKind::Url => ValueType::Url,
            FieldKind::Uuid => ValueType::Uuid,
            FieldKind::Decimal => ValueType::Decimal,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::Sequence | FieldKind::Set | FieldKind::Mapping)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Serialization metadata of a field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMetadata {
    /// External name; the declared name is used when unset
    pub output_key: Option<String>,
    /// Omit the field from external representations
    pub exclude: bool,
    /// strftime-style pattern for temporal kinds
    pub formatter: Option<String>,
    /// Caller extensions this crate does not interpret
    pub extra: BTreeMap<String, Value>,
}

impl FieldMetadata {
    /// The external key for a field declared as `name`.
    pub fn output_key_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.output_key.as_deref().unwrap_or(name)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Immutable description of one model attribute
#[derive(Clone)]
pub struct FieldDescriptor {
    kind: FieldKind,
    required: bool,
    default: DefaultPolicy,
    converter: Converter,
    validator: Validator,
    metadata: FieldMetadata,
    repr: bool,
    cmp: bool,
}

impl FieldDescriptor {
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_policy(&self) -> &DefaultPolicy {
        &self.default
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }

    pub fn formatter(&self) -> Option<&str> {
        self.metadata.formatter.as_deref()
    }

    pub fn is_excluded(&self) -> bool {
        self.metadata.exclude
    }

    /// Whether the field appears in the model's representation
    pub fn in_repr(&self) -> bool {
        self.repr
    }

    /// Whether the field takes part in model equality
    pub fn in_cmp(&self) -> bool {
        self.cmp
    }

    /// Run the full pipeline for one field.
    ///
    /// An absent raw value is replaced by the default; then the value is
    /// converted and the result validated.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredField` when absent and there is no default
    /// - `Conversion` / `Validation` / `Element` from the pipeline
    pub fn resolve_value(&self, raw: Option<&FieldValue>) -> FieldResult<FieldValue> {
        let defaulted;
        let raw = match raw {
            Some(value) => value,
            None => {
                defaulted = self.default.produce().ok_or_else(FieldError::missing)?;
                &defaulted
            }
        };
        let value = self.converter.convert(raw)?;
        self.validator.validate(&value)?;
        Ok(value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Builder for a `FieldDescriptor`.
///
/// Obtained from one of the constructors in `field::constructors`.
#[derive(Clone)]
pub struct FieldSpec {
    kind: FieldKind,
    converter: Converter,
    type_check: Check,
    pattern: Option<String>,
    empty: Option<FieldValue>,
    implicit_default: Option<DefaultFactory>,
    formatter: Option<String>,
    required: bool,
    default: Option<FieldDefault>,
    key: Option<String>,
    metadata: BTreeMap<String, Value>,
    repr: bool,
    cmp: bool,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("key", &self.key)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl FieldSpec {
    pub(crate) fn new(kind: FieldKind, converter: Converter) -> Self {
        let type_check = match &converter {
            Converter::Child(model) => Check::ChildOf(model.clone()),
            _ => Check::InstanceOf(kind.canonical_type()),
        };
        Self {
            kind,
            converter,
            type_check,
            pattern: None,
            empty: None,
            implicit_default: None,
            formatter: None,
            required: true,
            default: None,
            key: None,
            metadata: BTreeMap::new(),
            repr: !kind.is_collection(),
            cmp: true,
        }
    }

    pub(crate) fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub(crate) fn with_empty(mut self, empty: FieldValue) -> Self {
        self.empty = Some(empty);
        self
    }

    pub(crate) fn with_implicit_default(mut self, factory: DefaultFactory) -> Self {
        self.implicit_default = Some(factory);
        self
    }

    pub(crate) fn with_formatter(mut self, formatter: &str) -> Self {
        self.formatter = Some(formatter.to_string());
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Set whether the field must be supplied.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Shorthand for `required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// A fixed default. Marks the field optional.
    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self.required = false;
        self
    }

    /// A default generated per instance. Marks the field optional.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Factory(Arc::new(factory)));
        self.required = false;
        self
    }

    /// Override the external name of the field.
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Omit the field from external representations.
    pub fn exclude(self) -> Self {
        self.metadata(EXCLUDE_META, Value::Bool(true))
    }

    /// Attach an arbitrary metadata entry.
    pub fn metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = repr;
        self
    }

    pub fn cmp(mut self, cmp: bool) -> Self {
        self.cmp = cmp;
        self
    }

    /// Finish the declaration.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::InvalidDeclaration` if a required field carries a
    /// default, the regex does not compile, a mapping is declared over a
    /// non-model element type, or a preset metadata entry has the wrong type.
    pub fn build(self) -> FieldResult<FieldDescriptor> {
        if let Converter::Mapping { element, .. } = &self.converter {
            if !element.is_model() {
                return Err(FieldError::invalid_declaration(format!(
                    "mapping elements must be models, got {}",
                    element.name()
                )));
            }
        }

        let default = match (self.required, self.default, self.implicit_default) {
            (false, None, Some(factory)) => Some(FieldDefault::Factory(factory)),
            (_, default, _) => default,
        };
        let default = defaults::resolve(self.required, default, self.empty)?;

        let mut validator = Validator::for_field(self.required, self.type_check);
        if let Some(source) = &self.pattern {
            validator = validator.with(Check::Pattern(Pattern::new(source)?));
        }

        let metadata = fold_metadata(self.metadata, self.key, self.formatter)?;

        Ok(FieldDescriptor {
            kind: self.kind,
            required: self.required,
            default,
            converter: self.converter,
            validator,
            metadata,
            repr: self.repr,
            cmp: self.cmp,
        })
    }
}

/// Fold caller metadata with the kind's presets.
///
/// The formatter preset wins over a caller entry; the explicit key wins over
/// a caller `"key"` entry.
fn fold_metadata(
    mut caller: BTreeMap<String, Value>,
    key: Option<String>,
    formatter: Option<String>,
) -> FieldResult<FieldMetadata> {
    let caller_key = match caller.remove(KEY_META) {
        None | Some(Value::Null) => None,
        Some(Value::String(k)) => Some(k),
        Some(other) => {
            return Err(FieldError::invalid_declaration(format!(
                "metadata '{}' must be a string, got {}",
                KEY_META, other
            )))
        }
    };

    let exclude = match caller.remove(EXCLUDE_META) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            return Err(FieldError::invalid_declaration(format!(
                "metadata '{}' must be a bool, got {}",
                EXCLUDE_META, other
            )))
        }
    };

    let caller_formatter = caller.remove(FORMATTER_META);
    let formatter = match (formatter, caller_formatter) {
        (Some(preset), _) => Some(preset),
        (None, Some(Value::String(f))) => Some(f),
        (None, Some(other)) => {
            // Not a temporal field: keep the caller's entry untouched
            caller.insert(FORMATTER_META.to_string(), other);
            None
        }
        (None, None) => None,
    };

    Ok(FieldMetadata {
        output_key: key.or(caller_key),
        exclude,
        formatter,
        extra: caller,
    })
}
