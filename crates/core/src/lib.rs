//! Stowage Core - Core types for Stowage collections.
//!
//! This crate provides the foundational types shared by every Stowage crate:
//!
//! - `Value`: Dynamically typed field values with a total order
//! - `Record`: A structured record with an optional shared `Model`
//! - `Model`: The read-only behaviour table records delegate unset fields to
//! - `Error`: Error types for derivation, materialization and notification
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use stowage_core::{Model, Record, Value};
//!
//! let model = Rc::new(Model::new("task").with_default("done", false));
//! let record = Record::new().with("id", 1i64).with("title", "write docs").bind(model);
//!
//! assert_eq!(record.id(), Some(&Value::Int64(1)));
//! assert_eq!(record.get("done"), Some(&Value::Boolean(false)));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod model;
pub mod pattern_match;
mod record;
mod value;

pub use error::{Error, Result};
pub use model::{Model, DEFAULT_ID_PROPERTY};
pub use record::Record;
pub use value::Value;
