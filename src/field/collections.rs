//! Typed collections
//!
//! Homogeneous containers whose elements have all passed the element type's
//! converter and validator. Construction is all-or-nothing: the first bad
//! element aborts it and no partial collection is ever returned. There is no
//! mutation API once a collection is built.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::converters::Converter;
use super::errors::{FieldError, FieldResult};
use super::validators::{Check, Validator};
use super::value::{FieldValue, MapKey, ValueType};
use super::{DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, ISO_FORMAT};
use crate::model::{ModelRef, ModelType};

/// The type held by a typed collection
#[derive(Debug, Clone)]
pub enum ElementType {
    Bool,
    Integer,
    Float,
    String,
    Decimal,
    Uuid,
    Url,
    Date,
    DateTime,
    Time,
    Model(ModelRef),
}

impl ElementType {
    /// Name of the element type for error messages
    pub fn name(&self) -> &str {
        match self {
            ElementType::Model(model) => model.name(),
            other => other.value_type().type_name(),
        }
    }

    /// Canonical type of a converted element
    pub fn value_type(&self) -> ValueType {
        match self {
            ElementType::Bool => ValueType::Bool,
            ElementType::Integer => ValueType::Int,
            ElementType::Float => ValueType::Float,
            ElementType::String => ValueType::Str,
            ElementType::Decimal => ValueType::Decimal,
            ElementType::Uuid => ValueType::Uuid,
            ElementType::Url => ValueType::Url,
            ElementType::Date => ValueType::Date,
            ElementType::DateTime => ValueType::DateTime,
            ElementType::Time => ValueType::Time,
            ElementType::Model(_) => ValueType::Child,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, ElementType::Model(_))
    }

    /// The converter applied to each raw element
    pub fn converter(&self) -> Converter {
        match self {
            ElementType::Bool => Converter::Boolean,
            ElementType::Integer => Converter::Integer,
            ElementType::Float => Converter::Float,
            ElementType::String => Converter::String,
            ElementType::Decimal => Converter::Decimal,
            ElementType::Uuid => Converter::Uuid,
            ElementType::Url => Converter::Url,
            ElementType::Date => Converter::Date {
                formatter: DEFAULT_DATE_FORMAT.to_string(),
            },
            ElementType::DateTime => Converter::DateTime {
                formatter: ISO_FORMAT.to_string(),
            },
            ElementType::Time => Converter::Time {
                formatter: DEFAULT_TIME_FORMAT.to_string(),
            },
            ElementType::Model(model) => Converter::Child(model.clone()),
        }
    }

    /// The validator applied to each converted element. Elements are always
    /// required.
    pub fn validator(&self) -> Validator {
        let type_check = match self {
            ElementType::Model(model) => Check::ChildOf(model.clone()),
            other => Check::InstanceOf(other.value_type()),
        };
        Validator::new().with(Check::Required).with(type_check)
    }
}

impl From<ModelRef> for ElementType {
    fn from(model: ModelRef) -> Self {
        ElementType::Model(model)
    }
}

impl From<Arc<ModelType>> for ElementType {
    fn from(model: Arc<ModelType>) -> Self {
        ElementType::Model(ModelRef::direct(model))
    }
}

/// Converter and validator pair for one element type
struct ElementPipeline {
    converter: Converter,
    validator: Validator,
}

impl ElementPipeline {
    fn new(element: &ElementType) -> Self {
        Self {
            converter: element.converter(),
            validator: element.validator(),
        }
    }

    fn run(&self, index: usize, raw: &FieldValue) -> FieldResult<FieldValue> {
        if raw.is_null() {
            return Err(FieldError::element(index, FieldError::missing()));
        }
        let value = self
            .converter
            .convert(raw)
            .map_err(|e| FieldError::element(index, e))?;
        self.validator
            .validate(&value)
            .map_err(|e| FieldError::element(index, e))?;
        Ok(value)
    }
}

/// Ordered, immutable sequence of canonical elements
#[derive(Clone)]
pub struct TypedSequence {
    element: ElementType,
    items: Vec<FieldValue>,
}

impl TypedSequence {
    /// Convert and validate every raw item, in order.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::Element` for the first item that fails.
    pub fn new<'a, I>(element: ElementType, raw: I) -> FieldResult<Self>
    where
        I: IntoIterator<Item = &'a FieldValue>,
    {
        let pipeline = ElementPipeline::new(&element);
        let items = raw
            .into_iter()
            .enumerate()
            .map(|(i, item)| pipeline.run(i, item))
            .collect::<FieldResult<Vec<_>>>()?;
        Ok(Self { element, items })
    }

    pub fn empty(element: ElementType) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    pub fn element_type(&self) -> &ElementType {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldValue> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[FieldValue] {
        &self.items
    }
}

impl PartialEq for TypedSequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl fmt::Debug for TypedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a TypedSequence {
    type Item = &'a FieldValue;
    type IntoIter = std::slice::Iter<'a, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// De-duplicated collection of canonical elements.
///
/// Iteration follows first insertion; equality ignores order.
#[derive(Clone)]
pub struct TypedSet {
    element: ElementType,
    items: Vec<FieldValue>,
    keys: HashSet<SetKey>,
}

/// Hashable projection of a set element. Models and NaN have none and are
/// compared one by one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SetKey {
    Scalar(MapKey),
    Float(u64),
    Url(String),
}

impl SetKey {
    fn of(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(f) if f.is_nan() => None,
            // 0.0 == -0.0
            FieldValue::Float(f) if *f == 0.0 => Some(SetKey::Float(0)),
            FieldValue::Float(f) => Some(SetKey::Float(f.to_bits())),
            FieldValue::Url(u) => Some(SetKey::Url(u.as_str().to_string())),
            other => MapKey::from_value(other).ok().map(SetKey::Scalar),
        }
    }
}

impl TypedSet {
    /// Convert and validate every raw item; equal elements collapse.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::Element` for the first item that fails.
    pub fn new<'a, I>(element: ElementType, raw: I) -> FieldResult<Self>
    where
        I: IntoIterator<Item = &'a FieldValue>,
    {
        let pipeline = ElementPipeline::new(&element);
        let mut set = Self::empty(element);
        for (i, item) in raw.into_iter().enumerate() {
            let value = pipeline.run(i, item)?;
            set.insert(value);
        }
        Ok(set)
    }

    pub fn empty(element: ElementType) -> Self {
        Self {
            element,
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }

    fn insert(&mut self, value: FieldValue) {
        let fresh = match SetKey::of(&value) {
            Some(key) => self.keys.insert(key),
            None => !self.items.contains(&value),
        };
        if fresh {
            self.items.push(value);
        }
    }

    pub fn element_type(&self) -> &ElementType {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &FieldValue) -> bool {
        match SetKey::of(value) {
            Some(key) => self.keys.contains(&key),
            None => self.items.contains(value),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldValue> {
        self.items.iter()
    }
}

impl PartialEq for TypedSet {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().all(|v| other.contains(v))
    }
}

impl fmt::Debug for TypedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

/// Mapping of child models keyed by one of their own attributes
#[derive(Clone)]
pub struct TypedMapping {
    element: ElementType,
    child_key: String,
    entries: Vec<(MapKey, FieldValue)>,
    index: HashMap<MapKey, usize>,
}

impl TypedMapping {
    /// Convert and validate every raw child, then key it by its `child_key`
    /// attribute.
    ///
    /// A later child with an equal key replaces the earlier one in place.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::Element` for the first child that fails
    /// conversion or validation, or whose key cannot be derived.
    pub fn new<'a, I>(element: ElementType, child_key: &str, raw: I) -> FieldResult<Self>
    where
        I: IntoIterator<Item = &'a FieldValue>,
    {
        let pipeline = ElementPipeline::new(&element);
        let mut mapping = Self::empty(element, child_key);

        for (i, item) in raw.into_iter().enumerate() {
            let child = pipeline.run(i, item)?;
            let key = derive_key(&child, child_key).map_err(|e| FieldError::element(i, e))?;
            let existing = mapping.index.get(&key).copied();
            match existing {
                Some(pos) => mapping.entries[pos].1 = child,
                None => {
                    mapping.index.insert(key.clone(), mapping.entries.len());
                    mapping.entries.push((key, child));
                }
            }
        }

        Ok(mapping)
    }

    pub fn empty(element: ElementType, child_key: &str) -> Self {
        Self {
            element,
            child_key: child_key.to_string(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn element_type(&self) -> &ElementType {
        &self.element
    }

    pub fn child_key(&self) -> &str {
        &self.child_key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<&FieldValue> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &MapKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// Reads the key attribute off a converted child.
fn derive_key(child: &FieldValue, child_key: &str) -> FieldResult<MapKey> {
    let model = child.as_child().ok_or_else(|| {
        FieldError::conversion(child.render(), "mapping elements must be models")
    })?;
    let value = model.get(child_key).ok_or_else(|| {
        FieldError::conversion(
            child.render(),
            format!("child has no attribute '{}'", child_key),
        )
    })?;
    MapKey::from_value(value).map_err(|e| e.in_field(child_key))
}

impl PartialEq for TypedMapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |o| o == v))
    }
}

impl fmt::Debug for TypedMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
