//! Stowage Reactive - Change notification for Stowage collections.
//!
//! This crate provides the pieces collections use to report changes:
//!
//! - `ChangeEvent` / `EventType`: A single structural change
//! - `Notifier`: Per-type listener registry with snapshot dispatch
//! - `WindowTracker`: Translates backend mutations into window positions
//! - `observed_indices`: The `(from, to)` pair reported to record observers
//!
//! # Example
//!
//! ```rust
//! use stowage_core::Record;
//! use stowage_reactive::{ChangeEvent, EventType, Notifier};
//!
//! let notifier = Notifier::new();
//! let handle = notifier.on(EventType::Add, |event| {
//!     assert_eq!(event.index, Some(0));
//!     Ok(())
//! });
//!
//! let event = ChangeEvent::add(Record::new().with("id", 1i64), Some(0));
//! assert_eq!(notifier.emit(EventType::Add, event), Ok(false));
//! handle.remove();
//! ```

#![no_std]

extern crate alloc;

pub mod event;
pub mod notifier;
pub mod observe;
pub mod tracker;

pub use event::{position, ChangeEvent, EventType};
pub use notifier::{Listener, ListenerHandle, ListenerId, Notifier};
pub use observe::observed_indices;
pub use tracker::WindowTracker;
