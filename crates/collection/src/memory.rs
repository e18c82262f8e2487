//! In-memory backend.
//!
//! `MemoryBackend` keeps records in insertion order with a hash index from
//! identity to array position. Writes emit primitive change events on the
//! backend notifier; the indices they carry are positions in the backing
//! array, not in any derived view.

use crate::backend::{Backend, BackendResults};
use crate::deferred::{Deferred, YieldOnce};
use crate::hierarchy::Hierarchy;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;
use stowage_core::{Error, Record, Result, Value, DEFAULT_ID_PROPERTY};
use stowage_query::Query;
use stowage_reactive::{ChangeEvent, Notifier};

/// How reads are answered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Results are ready when returned.
    #[default]
    Immediate,
    /// Results resolve after one suspension point.
    Deferred,
}

/// Configuration for [`MemoryBackend`].
#[derive(Clone, Debug)]
pub struct MemoryOptions {
    pub id_property: String,
    pub fetch_mode: FetchMode,
    pub hierarchy: Option<Hierarchy>,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            id_property: String::from(DEFAULT_ID_PROPERTY),
            fetch_mode: FetchMode::Immediate,
            hierarchy: None,
        }
    }
}

impl MemoryOptions {
    pub fn with_id_property(mut self, id_property: impl Into<String>) -> Self {
        self.id_property = id_property.into();
        self
    }

    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    pub fn with_hierarchy(mut self, hierarchy: Hierarchy) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }
}

#[derive(Default)]
struct Store {
    records: Vec<Record>,
    index: HashMap<Value, usize>,
}

impl Store {
    fn reindex_from(&mut self, start: usize, id_property: &str) {
        for (pos, record) in self.records.iter().enumerate().skip(start) {
            if let Some(id) = record.get(id_property) {
                self.index.insert(id.clone(), pos);
            }
        }
    }
}

/// Reference backend over a vector of records.
pub struct MemoryBackend {
    options: MemoryOptions,
    store: RefCell<Store>,
    notifier: Notifier,
}

impl MemoryBackend {
    /// Creates a backend with default options.
    pub fn new(records: Vec<Record>) -> Self {
        Self::with_options(records, MemoryOptions::default())
    }

    /// Creates a backend from `records`. A later record replaces an earlier
    /// one with the same identity.
    pub fn with_options(records: Vec<Record>, options: MemoryOptions) -> Self {
        let backend = Self {
            options,
            store: RefCell::new(Store::default()),
            notifier: Notifier::new(),
        };
        backend.set_data(records);
        backend
    }

    #[inline]
    pub fn options(&self) -> &MemoryOptions {
        &self.options
    }

    /// Replaces the whole data set without emitting events.
    pub fn set_data(&self, records: Vec<Record>) {
        let id_property = self.options.id_property.as_str();
        let mut store = self.store.borrow_mut();
        store.records.clear();
        store.index.clear();
        for record in records {
            match record.get(id_property).cloned() {
                Some(id) => match store.index.get(&id).copied() {
                    Some(pos) => store.records[pos] = record,
                    None => {
                        let pos = store.records.len();
                        store.records.push(record);
                        store.index.insert(id, pos);
                    }
                },
                None => store.records.push(record),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.store.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().records.is_empty()
    }

    /// Copy of every stored record, in storage order.
    pub fn records(&self) -> Vec<Record> {
        self.store.borrow().records.clone()
    }

    /// Synchronous lookup by identity.
    pub fn get_now(&self, id: &Value) -> Option<Record> {
        let store = self.store.borrow();
        store.index.get(id).map(|&pos| store.records[pos].clone())
    }

    fn identity(&self, record: &Record) -> Result<Value> {
        match record.get(&self.options.id_property) {
            Some(id) if !id.is_null() => Ok(id.clone()),
            _ => Err(Error::invalid_operation(format!(
                "record has no `{}` property",
                self.options.id_property
            ))),
        }
    }

    /// Stores `record`, replacing any record with the same identity.
    ///
    /// Emits `update` for a replacement and `add` otherwise. The write is
    /// applied even if a listener fails; the failure is returned.
    pub fn put(&self, record: Record) -> Result<()> {
        let id = self.identity(&record)?;
        let event = {
            let mut store = self.store.borrow_mut();
            match store.index.get(&id).copied() {
                Some(pos) => {
                    store.records[pos] = record.clone();
                    ChangeEvent::update(record, Some(pos), Some(pos))
                }
                None => {
                    let pos = store.records.len();
                    store.records.push(record.clone());
                    store.index.insert(id.clone(), pos);
                    ChangeEvent::add(record, Some(pos))
                }
            }
        };
        self.dispatch(event.with_id(id))
    }

    /// Stores a new record; fails if the identity is already taken.
    pub fn add(&self, record: Record) -> Result<()> {
        let id = self.identity(&record)?;
        if self.store.borrow().index.contains_key(&id) {
            return Err(Error::invalid_operation(format!(
                "record with id {} already exists",
                id
            )));
        }
        self.put(record)
    }

    /// Removes the record with identity `id`, returning it.
    pub fn remove(&self, id: &Value) -> Result<Option<Record>> {
        let removed = {
            let mut store = self.store.borrow_mut();
            match store.index.remove(id) {
                Some(pos) => {
                    let record = store.records.remove(pos);
                    store.reindex_from(pos, &self.options.id_property);
                    Some((pos, record))
                }
                None => None,
            }
        };

        match removed {
            Some((pos, record)) => {
                let event = ChangeEvent::remove(Some(record.clone()), Some(pos)).with_id(id.clone());
                self.dispatch(event)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn dispatch(&self, event: ChangeEvent) -> Result<()> {
        let Some(event_type) = event.event_type() else {
            return Ok(());
        };
        tracing::trace!(event = %event_type, id = ?event.id, "memory backend write");
        self.notifier.emit(event_type, event).map(|_| ())
    }

    fn answer<T: 'static>(&self, value: T) -> Deferred<'static, T> {
        match self.options.fetch_mode {
            FetchMode::Immediate => Deferred::ready(value),
            FetchMode::Deferred => Deferred::pending(async move {
                YieldOnce::default().await;
                value
            }),
        }
    }
}

impl Backend for MemoryBackend {
    fn fetch_data(&self, _query: &Query) -> Deferred<'static, Result<BackendResults>> {
        self.answer(Ok(BackendResults::raw(self.records())))
    }

    fn get(&self, id: &Value) -> Deferred<'static, Result<Option<Record>>> {
        self.answer(Ok(self.get_now(id)))
    }

    fn id_property(&self) -> &str {
        &self.options.id_property
    }

    fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn hierarchy(&self) -> Option<&Hierarchy> {
        self.options.hierarchy.as_ref()
    }
}

impl core::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("options", &self.options)
            .field("len", &self.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}
