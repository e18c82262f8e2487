//! Shared record behaviour.
//!
//! A `Model` is the read-only descriptor every record produced by one root
//! collection points at. It supplies the identity property and default
//! field values, so records carry only their own fields and delegate the
//! rest to the shared table.

use crate::record::Record;
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;

/// Identity property used when a model does not name one.
pub const DEFAULT_ID_PROPERTY: &str = "id";

/// Shared behaviour table for records.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    name: String,
    id_property: String,
    defaults: BTreeMap<String, Value>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new("record")
    }
}

impl Model {
    /// Creates a model with no defaults and the `id` identity property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_property: String::from(DEFAULT_ID_PROPERTY),
            defaults: BTreeMap::new(),
        }
    }

    /// Sets the identity property.
    pub fn with_id_property(mut self, property: impl Into<String>) -> Self {
        self.id_property = property.into();
        self
    }

    /// Adds a default value returned for records that do not set `field`.
    pub fn with_default(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(field.into(), value.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    /// Returns the default for `field`, if any.
    #[inline]
    pub fn default_value(&self, field: &str) -> Option<&Value> {
        self.defaults.get(field)
    }

    #[inline]
    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    /// Builds a record from `fields` bound to this model.
    pub fn instantiate(self: &Rc<Self>, fields: BTreeMap<String, Value>) -> Record {
        Record::from_fields(fields).bind(Rc::clone(self))
    }
}
