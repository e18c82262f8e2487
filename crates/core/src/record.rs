//! Record structure for Stowage collections.
//!
//! A `Record` is an ordered map of named fields plus an optional reference
//! to the shared `Model` of the collection that produced it.

use crate::model::Model;
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;

/// A structured record.
#[derive(Clone, Debug, Default)]
pub struct Record {
    /// Fields set directly on this record.
    fields: BTreeMap<String, Value>,
    /// Shared behaviour table; unset fields are looked up here.
    model: Option<Rc<Model>>,
}

impl Record {
    /// Creates an empty, unbound record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unbound record from a field map.
    pub fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        Self {
            fields,
            model: None,
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Gets a field, falling back to the model default when unset.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .get(field)
            .or_else(|| self.model.as_ref().and_then(|m| m.default_value(field)))
    }

    /// Gets a field set directly on this record.
    #[inline]
    pub fn get_own(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns true if `field` is set directly on this record.
    #[inline]
    pub fn has_own(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a field and returns the previous own value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Removes an own field, exposing the model default again.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Returns the own fields.
    #[inline]
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Consumes the record, returning its own fields.
    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }

    /// Returns the number of own fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the bound model, if any.
    #[inline]
    pub fn model(&self) -> Option<&Rc<Model>> {
        self.model.as_ref()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.model.is_some()
    }

    /// Binds the record to a model, replacing any previous binding.
    pub fn bind(mut self, model: Rc<Model>) -> Self {
        self.model = Some(model);
        self
    }

    /// Drops the model binding.
    pub fn unbind(mut self) -> Self {
        self.model = None;
        self
    }

    /// Returns the identity value using the bound model's identity property.
    pub fn id(&self) -> Option<&Value> {
        let model = self.model.as_ref()?;
        self.get(model.id_property())
    }
}

impl PartialEq for Record {
    /// Records compare by their own fields; the model binding is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_fields(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
