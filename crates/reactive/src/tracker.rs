//! Window tracking: translating backend mutations into positional events.
//!
//! A `WindowTracker` keeps the full (filtered, sorted, unranged) result of a
//! tracked collection. Each backend mutation is applied to that snapshot, and
//! the difference between the old and new window is reported as a sequence
//! of `add`/`update`/`remove` events. Applying those events in order to the
//! previously observed window yields exactly the new window:
//!
//! 1. records pushed out of the window, as `remove`, highest index first
//! 2. the mutated record itself (`add`, `update` or `remove`)
//! 3. records pulled into the window, as `add`, lowest index first

use crate::event::{ChangeEvent, EventType};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashSet;
use stowage_core::{Record, Value};
use stowage_query::{Query, QueryEngine, SimpleQueryEngine, Transform};

/// Snapshot of a tracked collection's result plus index translation.
pub struct WindowTracker {
    query: Query,
    id_property: String,
    /// Filter stages, from the same engine that materializes the view.
    filters: Vec<Transform>,
    sort: Option<Transform>,
    /// Full unranged result; `None` until the first fetch primes it.
    full: Option<Vec<Record>>,
}

impl WindowTracker {
    /// Creates an unprimed tracker for `query` using [`SimpleQueryEngine`].
    pub fn new(query: Query, id_property: impl Into<String>) -> Self {
        Self::with_engine(query, id_property, &SimpleQueryEngine)
    }

    /// Creates an unprimed tracker that filters and orders records with
    /// `engine`, so placements agree with what a fetch through `engine`
    /// returns.
    pub fn with_engine(
        query: Query,
        id_property: impl Into<String>,
        engine: &dyn QueryEngine,
    ) -> Self {
        let filters = query.filters().iter().map(|f| engine.filter(f)).collect();
        let sort = query.sort().map(|s| engine.sort(s));
        Self {
            query,
            id_property: id_property.into(),
            filters,
            sort,
            full: None,
        }
    }

    #[inline]
    pub fn query(&self) -> &Query {
        &self.query
    }

    #[inline]
    pub fn is_primed(&self) -> bool {
        self.full.is_some()
    }

    /// Replaces the snapshot with a freshly fetched unranged result.
    pub fn prime(&mut self, full: Vec<Record>) {
        self.full = Some(full);
    }

    /// Returns the full unranged snapshot.
    pub fn snapshot(&self) -> &[Record] {
        self.full.as_deref().unwrap_or(&[])
    }

    /// Returns the records currently inside the window.
    pub fn window(&self) -> Vec<Record> {
        let full = self.snapshot();
        match self.query.range() {
            Some(range) => {
                let (start, end) = range.bounds(full.len());
                full[start..end].to_vec()
            }
            None => full.to_vec(),
        }
    }

    fn identity<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        record.get(&self.id_property)
    }

    fn window_ids(&self) -> Vec<Value> {
        self.window()
            .iter()
            .filter_map(|r| self.identity(r).cloned())
            .collect()
    }

    /// Applies a backend mutation and returns the window-relative events.
    ///
    /// `mutation` must be an `add`, `update` or `remove` event carrying the
    /// target record and/or its id.
    pub fn translate(&mut self, mutation: &ChangeEvent) -> Vec<ChangeEvent> {
        let Some(kind) = mutation.event_type().filter(EventType::is_mutation) else {
            return Vec::new();
        };
        if self.full.is_none() {
            tracing::debug!(event = %kind, "tracked collection not fetched yet; mutation dropped");
            return Vec::new();
        }

        let id = mutation
            .id
            .clone()
            .or_else(|| mutation.target.as_ref().and_then(|t| self.identity(t).cloned()));
        let Some(id) = id else {
            tracing::warn!(event = %kind, "mutation without identity cannot be tracked");
            return Vec::new();
        };

        let old_ids = self.window_ids();
        let removed_record = self.apply(kind, &id, mutation.target.as_ref());
        let new_ids = self.window_ids();

        let events = self.diff(&id, removed_record, old_ids, new_ids);
        tracing::trace!(event = %kind, translated = events.len(), "tracked mutation translated");
        events
    }

    /// Whether `record` passes every filter stage.
    fn admits(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|filter| !filter(vec![record.clone()]).is_empty())
    }

    /// Updates the snapshot; returns the record that was taken out, if any.
    fn apply(&mut self, kind: EventType, id: &Value, target: Option<&Record>) -> Option<Record> {
        let target = target.filter(|t| kind != EventType::Remove && self.admits(t));
        let id_property = self.id_property.as_str();
        let full = self.full.as_mut()?;

        let old_pos = full.iter().position(|r| r.get(id_property) == Some(id));
        let old_record = old_pos.map(|pos| full.remove(pos));

        let Some(target) = target else {
            return old_record;
        };
        match &self.sort {
            Some(sort) => {
                // appended then stably sorted: lands after any equal keys
                full.push(target.clone());
                *full = sort(core::mem::take(full));
            }
            // unsorted: stay in place, or join at the end
            None => full.insert(old_pos.unwrap_or(full.len()), target.clone()),
        }
        old_record
    }

    fn record_for(&self, id: &Value) -> Option<Record> {
        self.snapshot()
            .iter()
            .find(|r| self.identity(r) == Some(id))
            .cloned()
    }

    fn diff(
        &self,
        target_id: &Value,
        removed_record: Option<Record>,
        old_ids: Vec<Value>,
        new_ids: Vec<Value>,
    ) -> Vec<ChangeEvent> {
        let new_set: HashSet<&Value> = new_ids.iter().collect();
        let mut current = old_ids;
        let mut events = Vec::new();

        // 1. displaced out of the window
        let mut i = current.len();
        while i > 0 {
            i -= 1;
            if current[i] != *target_id && !new_set.contains(&current[i]) {
                let id = current.remove(i);
                let record = self.record_for(&id);
                events.push(ChangeEvent::remove(record, Some(i)).with_id(id));
            }
        }

        // 2. the mutated record
        let previous = current.iter().position(|v| v == target_id);
        if let Some(p) = previous {
            current.remove(p);
        }
        let index = new_ids.iter().position(|v| v == target_id).map(|j| {
            let k = {
                let present: HashSet<&Value> = current.iter().collect();
                new_ids[..j].iter().filter(|v| present.contains(v)).count()
            };
            current.insert(k, target_id.clone());
            k
        });

        let target = self.record_for(target_id).or(removed_record);
        match (previous, index) {
            (None, Some(i)) => {
                if let Some(record) = target {
                    events.push(ChangeEvent::add(record, Some(i)).with_id(target_id.clone()));
                }
            }
            (Some(p), None) => {
                events.push(ChangeEvent::remove(target, Some(p)).with_id(target_id.clone()));
            }
            (Some(p), Some(i)) => {
                if let Some(record) = target {
                    events.push(
                        ChangeEvent::update(record, Some(p), Some(i)).with_id(target_id.clone()),
                    );
                }
            }
            (None, None) => {}
        }

        // 3. displaced into the window
        for (j, id) in new_ids.iter().enumerate() {
            if current.get(j) != Some(id) {
                current.insert(j, id.clone());
                if let Some(record) = self.record_for(id) {
                    events.push(ChangeEvent::add(record, Some(j)).with_id(id.clone()));
                }
            }
        }

        debug_assert_eq!(current, new_ids);
        events
    }
}

impl fmt::Debug for WindowTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowTracker")
            .field("query", &self.query)
            .field("id_property", &self.id_property)
            .field("full", &self.full)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::boxed::Box;
    use stowage_query::{execute, Expr, Filter, Pushdown, Range, SortCriteria};

    fn make_record(id: i64, p: i64) -> Record {
        Record::new().with("id", id).with("p", p)
    }

    fn base() -> Vec<Record> {
        vec![make_record(1, 5), make_record(2, 3), make_record(3, 8)]
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect()
    }

    fn primed(query: Query, data: Vec<Record>) -> WindowTracker {
        let mut full: Vec<Record> = data.into_iter().filter(|r| query.matches(r)).collect();
        full.sort_by(|a, b| query.compare(a, b));
        let mut tracker = WindowTracker::new(query, "id");
        tracker.prime(full);
        tracker
    }

    /// Applies translated events to a copy of the old window.
    fn replay(window: &mut Vec<Record>, events: &[ChangeEvent]) {
        for event in events {
            if let Some(p) = event.previous_index {
                window.remove(p);
            }
            if let Some(i) = event.index {
                window.insert(i, event.target.clone().unwrap());
            }
        }
    }

    #[test]
    fn test_unprimed_drops_mutations() {
        let mut tracker = WindowTracker::new(Query::new(), "id");
        let events = tracker.translate(&ChangeEvent::add(make_record(9, 9), None));
        assert!(events.is_empty());
        assert!(!tracker.is_primed());
    }

    #[test]
    fn test_update_enters_filtered_view() {
        let query = Query::new().with_filter(Expr::gt("p", 4i64).into()).unwrap();
        let mut tracker = primed(query, base());

        let events = tracker.translate(&ChangeEvent::update(make_record(2, 9), Some(1), Some(1)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), Some(EventType::Add));
        assert_eq!(events[0].previous_index, None);
        assert_eq!(events[0].index, Some(2));
        assert_eq!(ids(tracker.snapshot()), vec![1, 3, 2]);
    }

    #[test]
    fn test_update_leaves_filtered_view() {
        let query = Query::new().with_filter(Expr::gt("p", 4i64).into()).unwrap();
        let mut tracker = primed(query, base());

        let events = tracker.translate(&ChangeEvent::update(make_record(1, 0), None, None));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), Some(EventType::Remove));
        assert_eq!(events[0].previous_index, Some(0));
        assert_eq!(events[0].index, None);
    }

    #[test]
    fn test_update_moves_within_sorted_view() {
        let query = Query::new().with_sort("p".into()).unwrap();
        let mut tracker = primed(query, base());
        assert_eq!(ids(tracker.snapshot()), vec![2, 1, 3]);

        let events = tracker.translate(&ChangeEvent::update(make_record(2, 10), None, None));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), Some(EventType::Update));
        assert_eq!(events[0].previous_index, Some(0));
        assert_eq!(events[0].index, Some(2));
        assert_eq!(ids(tracker.snapshot()), vec![1, 3, 2]);
    }

    #[test]
    fn test_in_place_update_keeps_index() {
        let mut tracker = primed(Query::new(), base());
        let events = tracker.translate(&ChangeEvent::update(make_record(2, 4), None, None));
        assert_eq!(events[0].previous_index, Some(1));
        assert_eq!(events[0].index, Some(1));
    }

    #[test]
    fn test_sorted_insert_is_stable() {
        let query = Query::new().with_sort("p".into()).unwrap();
        let mut tracker = primed(query, base());
        tracker.translate(&ChangeEvent::add(make_record(4, 5), None));
        assert_eq!(ids(tracker.snapshot()), vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_remove_by_id_only() {
        let mut tracker = primed(Query::new(), base());
        let events = tracker.translate(&ChangeEvent::remove(None, None).with_id(Value::Int64(3)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous_index, Some(2));
        assert_eq!(events[0].target, Some(make_record(3, 8)));
    }

    #[test]
    fn test_ranged_insert_pushes_last_out() {
        let query = Query::new()
            .with_sort("p".into())
            .unwrap()
            .with_range(Range::new(0, Some(2)).unwrap());
        let mut tracker = primed(query, base());
        let mut window = tracker.window();
        assert_eq!(ids(&window), vec![2, 1]);

        let events = tracker.translate(&ChangeEvent::add(make_record(4, 1), None));
        let kinds: Vec<_> = events.iter().filter_map(|e| e.event_type()).collect();
        assert_eq!(kinds, vec![EventType::Remove, EventType::Add]);
        assert_eq!(events[0].previous_index, Some(1));
        assert_eq!(events[1].index, Some(0));

        replay(&mut window, &events);
        assert_eq!(ids(&window), vec![4, 2]);
        assert_eq!(window, tracker.window());
    }

    #[test]
    fn test_ranged_window_relative_indices() {
        let query = Query::new()
            .with_sort("p".into())
            .unwrap()
            .with_range(Range::new(1, None).unwrap());
        let mut tracker = primed(query, base());
        let mut window = tracker.window();
        assert_eq!(ids(&window), vec![1, 3]);

        // p=3 -> p=6 moves id 2 from before the window to its middle
        let events = tracker.translate(&ChangeEvent::update(make_record(2, 6), None, None));
        replay(&mut window, &events);
        assert_eq!(ids(&window), vec![2, 3]);
        assert_eq!(window, tracker.window());
        assert!(events.iter().all(|e| e.index.map_or(true, |i| i < 2)));
    }

    #[test]
    fn test_mutation_outside_window_is_silent() {
        let query = Query::new()
            .with_sort("p".into())
            .unwrap()
            .with_range(Range::new(0, Some(1)).unwrap());
        let mut tracker = primed(query, base());
        let events = tracker.translate(&ChangeEvent::update(make_record(3, 9), None, None));
        assert!(events.is_empty());
    }

    /// Orders every sort backwards.
    struct ReversedEngine;

    impl QueryEngine for ReversedEngine {
        fn filter(&self, filter: &Filter) -> Transform {
            SimpleQueryEngine.filter(filter)
        }

        fn sort(&self, criteria: &SortCriteria) -> Transform {
            let criteria = criteria.clone();
            Box::new(move |mut records| {
                records.sort_by(|a, b| criteria.compare(b, a));
                records
            })
        }

        fn range(&self, range: Range) -> Transform {
            SimpleQueryEngine.range(range)
        }
    }

    #[test]
    fn test_placement_follows_engine_order() {
        let query = Query::new().with_sort("p".into()).unwrap();
        let full = execute(&ReversedEngine, &query, base(), Pushdown::NONE).records;
        assert_eq!(ids(&full), vec![3, 1, 2]);

        let mut tracker = WindowTracker::with_engine(query.clone(), "id", &ReversedEngine);
        tracker.prime(full);
        let mut window = tracker.window();

        let events = tracker.translate(&ChangeEvent::add(make_record(4, 6), None));
        replay(&mut window, &events);
        assert_eq!(ids(&window), vec![3, 4, 1, 2]);

        let mut all = base();
        all.push(make_record(4, 6));
        let refetched = execute(&ReversedEngine, &query, all, Pushdown::NONE).records;
        assert_eq!(window, refetched);
    }
}
