//! Change events.
//!
//! A `ChangeEvent` describes one structural change to a result sequence:
//! a record added, updated, removed, or the whole sequence invalidated
//! (`Refresh`). Events are built at the moment a mutation is detected,
//! dispatched synchronously and then dropped.

use core::cell::Cell;
use core::fmt;
use stowage_core::{Record, Value};

/// Kind of change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Add,
    Update,
    Remove,
    /// Previously observed data is stale (e.g. after a re-sort).
    Refresh,
}

impl EventType {
    /// Event types produced by backend mutations.
    pub const MUTATIONS: [EventType; 3] = [EventType::Add, EventType::Update, EventType::Remove];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Add => "add",
            EventType::Update => "update",
            EventType::Remove => "remove",
            EventType::Refresh => "refresh",
        }
    }

    /// True for add/update/remove.
    #[inline]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, EventType::Refresh)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural change notification.
///
/// `index` and `previous_index` are `None` when the record is not (or was not)
/// inside the observed window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeEvent {
    /// Stamped by `Notifier::emit` when left unset.
    pub event_type: Option<EventType>,
    pub target: Option<Record>,
    pub id: Option<Value>,
    pub index: Option<usize>,
    pub previous_index: Option<usize>,
    default_prevented: Cell<bool>,
}

impl ChangeEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record entered the sequence at `index`.
    pub fn add(target: Record, index: Option<usize>) -> Self {
        Self {
            event_type: Some(EventType::Add),
            target: Some(target),
            index,
            ..Self::default()
        }
    }

    /// Record changed; it moved from `previous_index` to `index`.
    pub fn update(target: Record, previous_index: Option<usize>, index: Option<usize>) -> Self {
        Self {
            event_type: Some(EventType::Update),
            target: Some(target),
            index,
            previous_index,
            ..Self::default()
        }
    }

    /// Record left the sequence from `previous_index`.
    pub fn remove(target: Option<Record>, previous_index: Option<usize>) -> Self {
        Self {
            event_type: Some(EventType::Remove),
            target,
            previous_index,
            ..Self::default()
        }
    }

    pub fn refresh() -> Self {
        Self {
            event_type: Some(EventType::Refresh),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: Value) -> Self {
        self.id = Some(id);
        self
    }

    /// Returns the event type, if stamped.
    #[inline]
    pub fn event_type(&self) -> Option<EventType> {
        self.event_type
    }

    /// Asks the emitter to skip its default behaviour.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    #[inline]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Observer position encoding: `-1` for "not in the window".
#[inline]
pub fn position(index: Option<usize>) -> isize {
    index.map_or(-1, |i| i as isize)
}
