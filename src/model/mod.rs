//! Model assembly
//!
//! - `ModelType` wires field descriptors into a record type
//! - `Model` is the immutable, validated instance
//! - `ModelRegistry` / `ModelRef` resolve model types by name, lazily
//! - `walker` moves models to and from JSON / YAML trees

mod registry;
mod types;
pub mod walker;

pub use registry::{ModelRef, ModelRegistry};
pub use types::{Model, ModelField, ModelType, ModelTypeBuilder};
