//! Stowage Query - Query descriptors and engine for Stowage collections.
//!
//! This crate provides the composition algebra collections accumulate:
//!
//! - `filter`: Structural match, predicate and expression filters
//! - `expr`: Composable filter expressions
//! - `sort`: Field-key and comparator sorts
//! - `range`: Positional windows
//! - `query`: The accumulated filter chain, sort and range
//! - `engine`: Query engines and stage execution

#![no_std]

extern crate alloc;

pub mod engine;
pub mod expr;
pub mod filter;
pub mod query;
pub mod range;
pub mod sort;

pub use engine::{execute, Execution, Pushdown, QueryEngine, SimpleQueryEngine, Transform};
pub use expr::{CompareOp, Expr};
pub use filter::{Filter, Matcher};
pub use query::Query;
pub use range::Range;
pub use sort::{SortCriteria, SortKey};
