//! Accumulated query state of a collection.

use crate::filter::Filter;
use crate::range::Range;
use crate::sort::SortCriteria;
use alloc::vec::Vec;
use core::cmp::Ordering;
use stowage_core::{Record, Result};

/// Filter chain, sort and range carried by a collection.
///
/// Every `with_*` method returns a new query; the receiver is never changed.
#[derive(Clone, Debug, Default)]
pub struct Query {
    filters: Vec<Filter>,
    sort: Option<SortCriteria>,
    range: Option<Range>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter after validating it.
    pub fn with_filter(&self, filter: Filter) -> Result<Self> {
        filter.validate()?;
        let mut next = self.clone();
        next.filters.push(filter);
        Ok(next)
    }

    /// Replaces the sort after validating it.
    pub fn with_sort(&self, sort: SortCriteria) -> Result<Self> {
        sort.validate()?;
        let mut next = self.clone();
        next.sort = Some(sort);
        Ok(next)
    }

    /// Replaces the range.
    pub fn with_range(&self, range: Range) -> Self {
        let mut next = self.clone();
        next.range = Some(range);
        next
    }

    /// Same query with the range dropped.
    pub fn without_range(&self) -> Self {
        let mut next = self.clone();
        next.range = None;
        next
    }

    #[inline]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[inline]
    pub fn sort(&self) -> Option<&SortCriteria> {
        self.sort.as_ref()
    }

    #[inline]
    pub fn range(&self) -> Option<Range> {
        self.range
    }

    /// True if the record passes every filter in the chain.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Compares two records by the active sort; `Equal` when unsorted.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.sort
            .as_ref()
            .map_or(Ordering::Equal, |sort| sort.compare(a, b))
    }

    /// Translates a full-result position into the active window.
    pub fn window_index(&self, index: usize) -> Option<usize> {
        match self.range {
            Some(range) => range.window_index(index),
            None => Some(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn make_record(id: i64, p: i64) -> Record {
        Record::new().with("id", id).with("p", p)
    }

    #[test]
    fn test_with_methods_do_not_mutate() {
        let base = Query::new();
        let filtered = base.with_filter(Expr::gt("p", 4i64).into()).unwrap();
        let sorted = filtered.with_sort("p".into()).unwrap();
        let ranged = sorted.with_range(Range::new(1, Some(2)).unwrap());

        assert!(base.filters().is_empty());
        assert_eq!(filtered.filters().len(), 1);
        assert!(filtered.sort().is_none());
        assert!(sorted.range().is_none());
        assert_eq!(ranged.range(), Some(Range { start: 1, end: Some(2) }));
        assert!(ranged.without_range().range().is_none());
    }

    #[test]
    fn test_filters_and_compose() {
        let query = Query::new()
            .with_filter(Expr::gt("p", 1i64).into())
            .unwrap()
            .with_filter(Expr::lt("p", 5i64).into())
            .unwrap();
        assert!(query.matches(&make_record(1, 3)));
        assert!(!query.matches(&make_record(1, 6)));
        assert!(!query.matches(&make_record(1, 0)));
    }

    #[test]
    fn test_sort_replaces() {
        let query = Query::new()
            .with_sort("p".into())
            .unwrap()
            .with_sort(("id", true).into())
            .unwrap();
        assert_eq!(
            query.compare(&make_record(1, 9), &make_record(2, 0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_invalid_input_rejected() {
        assert!(Query::new().with_sort("".into()).is_err());
        assert!(Query::new().with_filter(Expr::eq("", 1i64).into()).is_err());
    }
}
