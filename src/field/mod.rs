//! Field descriptor pipeline
//!
//! Every declared field runs the same pipeline when a model is built:
//!
//! 1. raw value, or the default policy's value when absent
//! 2. converter: raw shape to canonical shape
//! 3. validator: required, then type, then any extra predicate
//!
//! # Design Principles
//!
//! - Descriptors are immutable once built and shared by every instance
//! - Converters are idempotent on canonical input
//! - Validation never runs before conversion
//! - The first failure aborts; nothing partially valid is observable

mod collections;
pub mod constructors;
mod converters;
mod defaults;
mod descriptor;
mod errors;
mod validators;
mod value;

pub use collections::{ElementType, TypedMapping, TypedSequence, TypedSet};
pub use converters::Converter;
pub use defaults::{resolve as resolve_default, DefaultFactory, DefaultPolicy, FieldDefault};
pub use descriptor::{FieldDescriptor, FieldKind, FieldMetadata, FieldSpec};
pub use errors::{FieldError, FieldResult};
pub use validators::{Check, Pattern, Validator};
pub use value::{FieldValue, MapKey, ValueType};

/// Default pattern for date fields
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default pattern for time fields
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Marker formatter for ISO-8601 datetimes
pub const ISO_FORMAT: &str = "ISO_FORMAT";

/// Default pattern for datetime fields
pub const DEFAULT_DATETIME_FORMAT: &str = ISO_FORMAT;

/// strftime pattern used to emit `ISO_FORMAT` datetimes
pub const ISO_EMIT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
