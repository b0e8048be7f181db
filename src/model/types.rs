//! Model types and instances
//!
//! A `ModelType` is an ordered list of named field descriptors. Building
//! a `Model` runs every field's pipeline in declaration order and stops at
//! the first failure, so an instance either exists fully valid or not at
//! all.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::registry::ModelRegistry;
use crate::field::{FieldDescriptor, FieldError, FieldResult, FieldValue};
use crate::observability::{log_event, Event};

/// One declared attribute of a model type
#[derive(Debug, Clone)]
pub struct ModelField {
    name: String,
    descriptor: FieldDescriptor,
}

impl ModelField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// External key: the metadata key, or the declared name
    pub fn output_key(&self) -> &str {
        self.descriptor.metadata().output_key_or(&self.name)
    }
}

/// A model type: ordered field descriptors plus the names it answers to
#[derive(Debug)]
pub struct ModelType {
    name: String,
    fields: Vec<ModelField>,
    interfaces: Vec<String>,
    is_abstract: bool,
}

impl ModelType {
    pub fn builder(name: &str) -> ModelTypeBuilder {
        ModelTypeBuilder::new(name, false)
    }

    /// An abstract type. Child fields declared with it accept any model
    /// type that lists it via `implements`; it cannot be constructed.
    pub fn interface(name: &str) -> ModelTypeBuilder {
        ModelTypeBuilder::new(name, true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[ModelField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether instances of this type satisfy a field declared as `name`
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.interfaces.iter().any(|i| i == name)
    }

    /// Construct an instance from values keyed by attribute name.
    ///
    /// Absent fields take their default; an explicit `Null` is passed to the
    /// converter as supplied. A failure is logged once here, not at every
    /// nested model it passes through.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for a name no field declares
    /// - `DuplicateField` for a name supplied twice
    /// - `AbstractModel` for an interface type
    /// - the first field pipeline error, tagged with the field path
    pub fn construct(self: &Arc<Self>, raw: Vec<(String, FieldValue)>) -> FieldResult<Model> {
        self.fill_slots(raw)
            .and_then(|slots| self.instantiate(slots))
            .map_err(|err| {
                log_event(
                    Event::ConstructionFailed,
                    &[
                        ("code", err.code()),
                        ("field", err.field().unwrap_or("")),
                        ("model", self.name.as_str()),
                    ],
                );
                err
            })
    }

    fn fill_slots(&self, raw: Vec<(String, FieldValue)>) -> FieldResult<Vec<Option<FieldValue>>> {
        let mut slots: Vec<Option<FieldValue>> = vec![None; self.fields.len()];
        for (name, value) in raw {
            let index = self
                .fields
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| FieldError::UnknownField { field: name.clone() })?;
            if slots[index].is_some() {
                return Err(FieldError::DuplicateField { field: name });
            }
            slots[index] = Some(value);
        }
        Ok(slots)
    }

    /// Construct an instance from a raw map as read from an external tree.
    ///
    /// Each field is looked up by its output key. A renamed field also
    /// answers to its declared name, unless another field writes under that
    /// name. Keys no field claims are ignored here; see `unknown_keys`.
    ///
    /// Failures are returned unlogged; the walkers report them.
    pub fn from_map(self: &Arc<Self>, entries: &[(String, FieldValue)]) -> FieldResult<Model> {
        let claimed: HashSet<&str> = self.fields.iter().map(|f| f.output_key()).collect();
        let slots = self
            .fields
            .iter()
            .map(|field| {
                lookup(entries, field.output_key())
                    .or_else(|| {
                        if claimed.contains(field.name.as_str()) {
                            None
                        } else {
                            lookup(entries, &field.name)
                        }
                    })
                    .cloned()
            })
            .collect();
        self.instantiate(slots)
    }

    /// Keys of `entries` that match neither an output key nor a declared name
    pub fn unknown_keys<'a>(&self, entries: &'a [(String, FieldValue)]) -> Vec<&'a str> {
        let known: HashSet<&str> = self
            .fields
            .iter()
            .flat_map(|f| [f.name.as_str(), f.output_key()])
            .collect();
        entries
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(|key| !known.contains(key))
            .collect()
    }

    fn instantiate(self: &Arc<Self>, slots: Vec<Option<FieldValue>>) -> FieldResult<Model> {
        if self.is_abstract {
            return Err(FieldError::AbstractModel {
                name: self.name.clone(),
            });
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for (field, raw) in self.fields.iter().zip(slots) {
            let value = field
                .descriptor
                .resolve_value(raw.as_ref())
                .map_err(|e| e.in_field(&field.name))?;
            values.push(value);
        }

        Ok(Model {
            model_type: Arc::clone(self),
            values,
        })
    }
}

fn lookup<'a>(entries: &'a [(String, FieldValue)], key: &str) -> Option<&'a FieldValue> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// Builder for a `ModelType`
#[derive(Debug)]
pub struct ModelTypeBuilder {
    name: String,
    fields: Vec<ModelField>,
    interfaces: Vec<String>,
    is_abstract: bool,
}

impl ModelTypeBuilder {
    fn new(name: &str, is_abstract: bool) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            interfaces: Vec::new(),
            is_abstract,
        }
    }

    /// Declare the next field. Declaration order is construction order.
    pub fn field(mut self, name: &str, descriptor: FieldDescriptor) -> Self {
        self.fields.push(ModelField {
            name: name.to_string(),
            descriptor,
        });
        self
    }

    /// Mark the type as satisfying the interface `name`.
    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    /// # Errors
    ///
    /// Returns `FieldError::InvalidDeclaration` for an empty type name, or
    /// when two fields share a declared name or an output key.
    pub fn build(self) -> FieldResult<Arc<ModelType>> {
        if self.name.is_empty() {
            return Err(FieldError::invalid_declaration("model type name is empty"));
        }

        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(FieldError::invalid_declaration(format!(
                    "{}: field '{}' declared twice",
                    self.name, field.name
                )));
            }
            if !keys.insert(field.output_key()) {
                return Err(FieldError::invalid_declaration(format!(
                    "{}: output key '{}' used by more than one field",
                    self.name,
                    field.output_key()
                )));
            }
        }

        Ok(Arc::new(ModelType {
            name: self.name,
            fields: self.fields,
            interfaces: self.interfaces,
            is_abstract: self.is_abstract,
        }))
    }

    /// Build and register in one step.
    pub fn register(self, registry: &ModelRegistry) -> FieldResult<Arc<ModelType>> {
        registry.register(self.build()?)
    }
}

/// An immutable model instance.
///
/// Values are aligned with the type's declared fields and have all passed
/// their field's converter and validator.
#[derive(Clone)]
pub struct Model {
    model_type: Arc<ModelType>,
    values: Vec<FieldValue>,
}

impl Model {
    pub fn model_type(&self) -> &Arc<ModelType> {
        &self.model_type
    }

    /// Value of the field declared as `name`
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.model_type
            .fields
            .iter()
            .position(|f| f.name == name)
            .map(|index| &self.values[index])
    }

    /// Fields with their values, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&ModelField, &FieldValue)> {
        self.model_type.fields.iter().zip(self.values.iter())
    }

    fn repr_fields(&self) -> impl Iterator<Item = (&ModelField, &FieldValue)> {
        self.iter().filter(|(field, _)| field.descriptor.in_repr())
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.model_type.name == other.model_type.name
            && self.model_type.fields.len() == other.model_type.fields.len()
            && self
                .iter()
                .zip(other.values.iter())
                .all(|((field, a), b)| !field.descriptor.in_cmp() || a == b)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(&self.model_type.name);
        for (field, value) in self.repr_fields() {
            out.field(&field.name, value);
        }
        out.finish()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.model_type.name)?;
        for (i, (field, value)) in self.repr_fields().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                FieldValue::Child(child) => write!(f, "{}={}", field.name, child)?,
                other => write!(f, "{}={}", field.name, other.render())?,
            }
        }
        write!(f, ")")
    }
}
