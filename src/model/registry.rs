//! Model type registry and forward references
//!
//! A `ModelRef` names the model type a child, sequence, set or mapping
//! field holds. A direct reference wraps the type itself; a named reference
//! is resolved against a `ModelRegistry` the first time a value is
//! converted, so a type may refer to one registered after it (or to
//! itself).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use super::types::ModelType;
use crate::field::{FieldError, FieldResult};
use crate::observability::{log_event, Event};

/// Name-indexed set of model types.
///
/// Names are unique; a type is never replaced once registered.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    types: RwLock<HashMap<String, Arc<ModelType>>>,
}

impl ModelRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `model_type` under its name.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::InvalidDeclaration` if the name is taken.
    pub fn register(&self, model_type: Arc<ModelType>) -> FieldResult<Arc<ModelType>> {
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        let name = model_type.name().to_string();
        if types.contains_key(&name) {
            return Err(FieldError::invalid_declaration(format!(
                "model type '{}' is already registered",
                name
            )));
        }
        types.insert(name.clone(), Arc::clone(&model_type));
        drop(types);

        let field_count = model_type.fields().len().to_string();
        log_event(
            Event::ModelRegistered,
            &[("fields", field_count.as_str()), ("model", name.as_str())],
        );
        Ok(model_type)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelType>> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let types = self.types.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = types.keys().cloned().collect();
        names.sort();
        names
    }

    /// A forward reference to `name`, resolved on first use.
    pub fn reference(self: &Arc<Self>, name: &str) -> ModelRef {
        ModelRef::named(self, name)
    }
}

enum Target {
    Direct,
    Named(Arc<ModelRegistry>),
}

struct RefInner {
    name: String,
    target: Target,
    resolved: OnceLock<Arc<ModelType>>,
}

/// Reference to a model type, possibly not yet registered.
///
/// Clones share the memoized resolution.
#[derive(Clone)]
pub struct ModelRef {
    inner: Arc<RefInner>,
}

impl ModelRef {
    /// Reference an already built type.
    pub fn direct(model_type: Arc<ModelType>) -> Self {
        let resolved = OnceLock::new();
        let name = model_type.name().to_string();
        // Fresh cell: cannot already be set
        let _ = resolved.set(model_type);
        Self {
            inner: Arc::new(RefInner {
                name,
                target: Target::Direct,
                resolved,
            }),
        }
    }

    /// Reference a type by name, looked up in `registry` on first use.
    pub fn named(registry: &Arc<ModelRegistry>, name: &str) -> Self {
        Self {
            inner: Arc::new(RefInner {
                name: name.to_string(),
                target: Target::Named(Arc::clone(registry)),
                resolved: OnceLock::new(),
            }),
        }
    }

    /// Declared name of the referenced type
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.get().is_some()
    }

    /// Resolve to the model type.
    ///
    /// A successful lookup is memoized; a failed one is retried next time.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::UnresolvedType` if no type of this name is
    /// registered.
    pub fn resolve(&self) -> FieldResult<Arc<ModelType>> {
        if let Some(model_type) = self.inner.resolved.get() {
            return Ok(Arc::clone(model_type));
        }
        let registry = match &self.inner.target {
            Target::Named(registry) => registry,
            // Direct refs are set at construction
            Target::Direct => return Err(self.unresolved()),
        };
        match registry.get(&self.inner.name) {
            Some(model_type) => {
                let model_type = Arc::clone(self.inner.resolved.get_or_init(|| model_type));
                log_event(Event::ForwardRefResolved, &[("model", self.name())]);
                Ok(model_type)
            }
            None => {
                log_event(Event::ForwardRefUnresolved, &[("model", self.name())]);
                Err(self.unresolved())
            }
        }
    }

    fn unresolved(&self) -> FieldError {
        FieldError::UnresolvedType {
            name: self.inner.name.clone(),
        }
    }
}

impl From<Arc<ModelType>> for ModelRef {
    fn from(model_type: Arc<ModelType>) -> Self {
        ModelRef::direct(model_type)
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("name", &self.inner.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::constructors as fields;

    fn named_type(name: &str) -> Arc<ModelType> {
        ModelType::builder(name)
            .field("id", fields::integer().build().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ModelRegistry::new();
        registry.register(named_type("User")).unwrap();

        assert!(registry.contains("User"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("User").unwrap().name(), "User");
        assert!(registry.get("Missing").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = ModelRegistry::new();
        registry.register(named_type("User")).unwrap();
        let err = registry.register(named_type("User")).unwrap_err();
        assert_eq!(err.code(), "RELATED_INVALID_DECLARATION");
    }

    #[test]
    fn test_names_sorted() {
        let registry = ModelRegistry::new();
        registry.register(named_type("b")).unwrap();
        registry.register(named_type("a")).unwrap();
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_direct_ref_is_resolved() {
        let model_ref = ModelRef::direct(named_type("User"));
        assert!(model_ref.is_resolved());
        assert_eq!(model_ref.resolve().unwrap().name(), "User");
    }

    #[test]
    fn test_forward_ref_resolves_after_registration() {
        let registry = ModelRegistry::new();
        let model_ref = registry.reference("Later");

        let err = model_ref.resolve().unwrap_err();
        assert_eq!(err.code(), "RELATED_UNRESOLVED_TYPE");
        assert!(!model_ref.is_resolved());

        registry.register(named_type("Later")).unwrap();
        assert_eq!(model_ref.resolve().unwrap().name(), "Later");
        assert!(model_ref.clone().is_resolved());
    }
}
