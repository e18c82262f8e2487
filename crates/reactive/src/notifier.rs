//! Listener registry and synchronous event dispatch.
//!
//! A `Notifier` keeps listeners per event type in registration order. It is a
//! cheap `Clone` handle: clones share one registry, which is how every
//! collection derived from the same backend reaches the same listeners.
//!
//! Dispatch walks a snapshot of the listener list taken when `emit` starts, so
//! listeners may register, remove, or trigger further mutations while an
//! event is being delivered.

use crate::event::{ChangeEvent, EventType};
use alloc::rc::{Rc, Weak};
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;
use stowage_core::{Error, Result};

/// Unique identifier for a registered listener.
pub type ListenerId = u64;

/// Listener callback. A returned error is reported but does not stop delivery.
pub type Listener = Rc<dyn Fn(&ChangeEvent) -> Result<()>>;

struct Registry {
    listeners: HashMap<EventType, Vec<(ListenerId, Listener)>>,
    next_id: ListenerId,
}

impl Registry {
    fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 1,
        }
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for list in self.listeners.values_mut() {
            let before = list.len();
            list.retain(|(lid, _)| *lid != id);
            removed |= list.len() != before;
        }
        removed
    }
}

/// Event registry shared by every clone.
#[derive(Clone, Debug)]
pub struct Notifier {
    registry: Rc<RefCell<Registry>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
        }
    }

    /// Registers `listener` for `event_type`.
    ///
    /// Returns a handle that can be used to remove the listener.
    pub fn on<F>(&self, event_type: EventType, listener: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) -> Result<()> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .listeners
            .entry(event_type)
            .or_default()
            .push((id, Rc::new(listener)));

        ListenerHandle {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Removes a listener by ID.
    ///
    /// Returns true if the listener was found and removed.
    pub fn off(&self, id: ListenerId) -> bool {
        self.registry.borrow_mut().remove(id)
    }

    /// Dispatches `event` to every listener currently registered for
    /// `event_type`, in registration order.
    ///
    /// The event type is stamped when unset. Every listener runs even if an
    /// earlier one fails; failures are logged and reported together once
    /// dispatch completes. On success, returns whether any listener called
    /// [`ChangeEvent::prevent_default`].
    pub fn emit(&self, event_type: EventType, mut event: ChangeEvent) -> Result<bool> {
        if event.event_type.is_none() {
            event.event_type = Some(event_type);
        }

        let snapshot: Vec<Listener> = {
            let registry = self.registry.borrow();
            match registry.listeners.get(&event_type) {
                Some(list) => list.iter().map(|(_, l)| Rc::clone(l)).collect(),
                None => return Ok(false),
            }
        };

        let mut failures = 0usize;
        let mut first_failure = None;
        for listener in snapshot {
            if let Err(err) = listener(&event) {
                tracing::warn!(event = %event_type, error = %err, "change listener failed");
                failures += 1;
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }

        match first_failure {
            Some(err) => Err(Error::listener(
                event_type.as_str(),
                failures,
                err.to_string(),
            )),
            None => Ok(event.default_prevented()),
        }
    }

    /// Returns the number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    /// Returns true if no listener is registered for any type.
    pub fn is_empty(&self) -> bool {
        self.registry
            .borrow()
            .listeners
            .values()
            .all(Vec::is_empty)
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.registry.borrow_mut().listeners.clear();
    }

    /// Returns true if both handles share one registry.
    pub fn ptr_eq(&self, other: &Notifier) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }
}

/// Handle returned by [`Notifier::on`].
///
/// Dropping the handle keeps the listener registered.
#[derive(Clone, Debug)]
pub struct ListenerHandle {
    id: ListenerId,
    registry: Weak<RefCell<Registry>>,
}

impl ListenerHandle {
    #[inline]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Removes the listener. Returns false if it was already removed or the
    /// notifier is gone.
    pub fn remove(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.borrow_mut().remove(self.id),
            None => false,
        }
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .field("next_id", &self.next_id)
            .finish()
    }
}
