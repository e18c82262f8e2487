//! Stowage Collection - Lazy, composable collections over pluggable backends.
//!
//! A [`Collection`] describes a query (filter chain, sort, range) against a
//! [`Backend`]. Deriving views is cheap and never touches the backend; records
//! are only materialized by [`Collection::fetch`].
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use stowage_collection::{Collection, MemoryBackend};
//! use stowage_core::Record;
//! use stowage_query::Expr;
//!
//! let backend = Rc::new(MemoryBackend::new(vec![
//!     Record::new().with("id", 1i64).with("p", 5i64),
//!     Record::new().with("id", 2i64).with("p", 3i64),
//!     Record::new().with("id", 3i64).with("p", 8i64),
//! ]));
//!
//! let view = Collection::new(backend).filter(Expr::gt("p", 4i64)).unwrap();
//! let results = pollster::block_on(view.fetch()).unwrap();
//! assert_eq!(results.len(), 2);
//! ```

#![no_std]

extern crate alloc;

mod backend;
mod collection;
mod deferred;
mod hierarchy;
mod memory;

pub use backend::{Backend, BackendResults};
pub use collection::{Collection, ObserveHandle, QueryResults};
pub use deferred::{BoxFuture, Deferred, YieldOnce};
pub use hierarchy::{HierarchicalCapability, HierarchicalView, Hierarchy, HAS_CHILDREN_PROPERTY};
pub use memory::{FetchMode, MemoryBackend, MemoryOptions};

pub use stowage_core::{Error, Model, Record, Result, Value};
pub use stowage_query::{Expr, Filter, Matcher, Pushdown, Query, QueryEngine, Range, SortCriteria, SortKey};
pub use stowage_reactive::{ChangeEvent, EventType, ListenerHandle, Notifier};
