//! related - Declarative, strongly-typed fields for data models
//!
//! Declare a model as named, typed fields; every instance is converted and
//! validated field by field, and round-trips through JSON and YAML.
//!
//! ```ignore
//! use related::{fields, walker, ElementType, ModelType};
//!
//! let person = ModelType::builder("Person")
//!     .field("name", fields::string().build()?)
//!     .field("tags", fields::set(ElementType::String).optional().build()?)
//!     .build()?;
//! let ada = walker::from_json(&person, r#"{"name": "Ada"}"#)?;
//! ```

pub mod config;
pub mod field;
pub mod model;
pub mod observability;

pub use config::WalkerConfig;
pub use field::constructors as fields;
pub use field::{ElementType, FieldDescriptor, FieldError, FieldResult, FieldValue, MapKey};
pub use model::walker;
pub use model::{Model, ModelRef, ModelRegistry, ModelType};
