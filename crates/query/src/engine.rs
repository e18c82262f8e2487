//! Query engines turn descriptors into transforms over raw record sequences.
//!
//! A backend may expose its own [`QueryEngine`]; when it does not, collections
//! fall back to [`SimpleQueryEngine`], which applies predicates and
//! comparators directly.

use crate::filter::Filter;
use crate::query::Query;
use crate::range::Range;
use crate::sort::SortCriteria;
use alloc::boxed::Box;
use alloc::vec::Vec;
use stowage_core::Record;

/// A transform over a raw record sequence.
pub type Transform = Box<dyn Fn(Vec<Record>) -> Vec<Record>>;

/// Produces transforms for each query stage.
pub trait QueryEngine {
    /// Transform keeping the records matching `filter`, in source order.
    fn filter(&self, filter: &Filter) -> Transform;

    /// Transform ordering records by `criteria`. Must be stable.
    fn sort(&self, criteria: &SortCriteria) -> Transform;

    /// Transform keeping the records inside `range`.
    fn range(&self, range: Range) -> Transform;
}

/// Generic predicate/comparator engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleQueryEngine;

impl QueryEngine for SimpleQueryEngine {
    fn filter(&self, filter: &Filter) -> Transform {
        let filter = filter.clone();
        Box::new(move |mut records| {
            records.retain(|r| filter.matches(r));
            records
        })
    }

    fn sort(&self, criteria: &SortCriteria) -> Transform {
        let criteria = criteria.clone();
        Box::new(move |mut records| {
            // sort_by is stable
            records.sort_by(|a, b| criteria.compare(a, b));
            records
        })
    }

    fn range(&self, range: Range) -> Transform {
        Box::new(move |records| range.apply(records))
    }
}

/// Stages a backend already applied before handing records over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pushdown {
    pub filter: bool,
    pub sort: bool,
    pub range: bool,
}

impl Pushdown {
    /// Nothing applied; the raw data set.
    pub const NONE: Pushdown = Pushdown {
        filter: false,
        sort: false,
        range: false,
    };

    /// Everything applied.
    pub const ALL: Pushdown = Pushdown {
        filter: true,
        sort: true,
        range: true,
    };
}

/// Output of [`execute`].
#[derive(Clone, Debug, Default)]
pub struct Execution {
    pub records: Vec<Record>,
    /// Record count before the range was applied, when the engine applied it.
    pub total_length: Option<usize>,
}

/// Runs the stages of `query` the backend did not push down.
///
/// Stages always run filter, then sort, then range, whatever order the
/// descriptors were accumulated in.
pub fn execute(
    engine: &dyn QueryEngine,
    query: &Query,
    mut records: Vec<Record>,
    pushdown: Pushdown,
) -> Execution {
    if !pushdown.filter {
        for filter in query.filters() {
            records = engine.filter(filter)(records);
        }
    }

    if !pushdown.sort {
        if let Some(sort) = query.sort() {
            records = engine.sort(sort)(records);
        }
    }

    let mut total_length = None;
    if !pushdown.range {
        total_length = Some(records.len());
        if let Some(range) = query.range() {
            records = engine.range(range)(records);
        }
    }

    Execution {
        records,
        total_length,
    }
}
