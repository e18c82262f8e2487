//! Lazy collection views.
//!
//! A `Collection` is an immutable description of "these records from this
//! backend": a filter chain, an optional sort and an optional range. Deriving
//! a view (`filter`, `sort`, `range`) is cheap and never touches the backend;
//! records are only produced when a view is fetched.
//!
//! Every view derived from one root shares the root's backend and model, so
//! all fetched records point at the same `Rc<Model>`.

use crate::backend::{Backend, BackendResults};
use crate::deferred::Deferred;
use crate::hierarchy::HierarchicalView;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Deref;
use stowage_core::{Error, Model, Record, Result, Value};
use stowage_query::{
    execute, Execution, Filter, Query, QueryEngine, Range, SimpleQueryEngine, SortCriteria,
    SortKey,
};
use stowage_reactive::{
    observed_indices, ChangeEvent, EventType, ListenerHandle, Notifier, WindowTracker,
};

/// Materialized records of a collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResults {
    records: Vec<Record>,
    total_length: Option<usize>,
}

impl QueryResults {
    pub fn new(records: Vec<Record>, total_length: Option<usize>) -> Self {
        Self {
            records,
            total_length,
        }
    }

    /// Number of matching records ignoring the range, when known.
    #[inline]
    pub fn total_length(&self) -> Option<usize> {
        self.total_length
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl Deref for QueryResults {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        &self.records
    }
}

impl IntoIterator for QueryResults {
    type Item = Record;
    type IntoIter = alloc::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResults {
    type Item = &'a Record;
    type IntoIter = core::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Tracking state of a tracked view.
struct Tracking {
    tracker: RefCell<WindowTracker>,
    /// Receives the translated, window-relative events.
    notifier: Notifier,
    model: Option<Rc<Model>>,
    /// Listeners on the backend notifier, removed on drop.
    subscriptions: RefCell<Vec<ListenerHandle>>,
    /// Backend mutations seen so far.
    mutations: Cell<u64>,
}

impl Tracking {
    fn on_backend_event(&self, event: &ChangeEvent) -> Result<()> {
        self.mutations.set(self.mutations.get() + 1);
        let mut event = event.clone();
        if let (Some(model), Some(target)) = (&self.model, event.target.take()) {
            event.target = Some(target.bind(Rc::clone(model)));
        }

        // the tracker borrow must end before listeners run
        let translated = self.tracker.borrow_mut().translate(&event);

        let mut first_failure = None;
        for out in translated {
            let Some(event_type) = out.event_type() else {
                continue;
            };
            if let Err(err) = self.notifier.emit(event_type, out) {
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}

impl Drop for Tracking {
    fn drop(&mut self) {
        for handle in self.subscriptions.get_mut().drain(..) {
            handle.remove();
        }
    }
}

/// Handle returned by [`Collection::observe`].
#[derive(Debug)]
pub struct ObserveHandle {
    handles: Vec<ListenerHandle>,
}

impl ObserveHandle {
    /// Removes every listener installed by `observe`. Returns true if any
    /// was still registered.
    pub fn remove(&self) -> bool {
        let mut removed = false;
        for handle in &self.handles {
            removed |= handle.remove();
        }
        removed
    }
}

/// A lazy, composable view over a backend.
#[derive(Clone)]
pub struct Collection {
    backend: Rc<dyn Backend>,
    model: Option<Rc<Model>>,
    parent: Option<Rc<Collection>>,
    query: Query,
    /// Listeners for this view's own `refresh` events.
    refresh: Notifier,
    /// Set by `sort`; cleared by the first materialization.
    pending_refresh: Rc<Cell<bool>>,
    tracking: Option<Rc<Tracking>>,
}

impl Collection {
    /// Creates a root collection with a fresh default model.
    pub fn new(backend: Rc<dyn Backend>) -> Self {
        let model = Model::default().with_id_property(backend.id_property());
        Self::with_model(backend, model)
    }

    /// Creates a root collection whose records are bound to `model`.
    pub fn with_model(backend: Rc<dyn Backend>, model: Model) -> Self {
        Self::root(backend, Some(Rc::new(model)))
    }

    /// Creates a root collection that hands records back unbound.
    pub fn without_model(backend: Rc<dyn Backend>) -> Self {
        Self::root(backend, None)
    }

    fn root(backend: Rc<dyn Backend>, model: Option<Rc<Model>>) -> Self {
        Self {
            backend,
            model,
            parent: None,
            query: Query::new(),
            refresh: Notifier::new(),
            pending_refresh: Rc::new(Cell::new(false)),
            tracking: None,
        }
    }

    fn derive(&self, query: Query) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            model: self.model.clone(),
            parent: Some(Rc::new(self.clone())),
            query,
            refresh: Notifier::new(),
            pending_refresh: Rc::new(Cell::new(false)),
            tracking: None,
        }
    }

    #[inline]
    pub fn backend(&self) -> &Rc<dyn Backend> {
        &self.backend
    }

    /// The view this one was derived from; `None` for a root.
    #[inline]
    pub fn parent(&self) -> Option<&Collection> {
        self.parent.as_deref()
    }

    #[inline]
    pub fn query(&self) -> &Query {
        &self.query
    }

    #[inline]
    pub fn model(&self) -> Option<&Rc<Model>> {
        self.model.as_ref()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn is_tracked(&self) -> bool {
        self.tracking.is_some()
    }

    /// Narrows the view. Filters accumulate and are AND-composed.
    pub fn filter(&self, filter: impl Into<Filter>) -> Result<Collection> {
        let query = self.query.with_filter(filter.into())?;
        Ok(self.derive(query))
    }

    /// Orders the view, replacing any earlier sort.
    ///
    /// The returned view emits `refresh` once, after the first fetch of it
    /// or of any view derived from it.
    pub fn sort(&self, sort: impl Into<SortCriteria>) -> Result<Collection> {
        let query = self.query.with_sort(sort.into())?;
        let sorted = self.derive(query);
        sorted.pending_refresh.set(true);
        Ok(sorted)
    }

    /// Orders the view on a single property.
    pub fn sort_by(&self, property: &str, descending: bool) -> Result<Collection> {
        let key = if descending {
            SortKey::desc(property)
        } else {
            SortKey::asc(property)
        };
        self.sort(key)
    }

    /// Restricts the view to positions `[start, end)`.
    pub fn range(&self, start: usize, end: Option<usize>) -> Result<Collection> {
        let range = Range::new(start, end)?;
        Ok(self.derive(self.query.with_range(range)))
    }

    /// Returns a tracked copy of this view.
    ///
    /// Listeners registered on the copy receive backend mutations translated
    /// to positions inside the copy's window. Positions are known once the
    /// copy has been fetched; earlier mutations are dropped.
    pub fn track(&self) -> Collection {
        if self.tracking.is_some() {
            return self.clone();
        }

        let engine: &dyn QueryEngine = self.backend.query_engine().unwrap_or(&SimpleQueryEngine);
        let tracking = Rc::new(Tracking {
            tracker: RefCell::new(WindowTracker::with_engine(
                self.query.clone(),
                self.backend.id_property(),
                engine,
            )),
            notifier: Notifier::new(),
            model: self.model.clone(),
            subscriptions: RefCell::new(Vec::new()),
            mutations: Cell::new(0),
        });

        let backend_notifier = self.backend.notifier();
        let handles: Vec<ListenerHandle> = EventType::MUTATIONS
            .iter()
            .map(|&event_type| {
                let weak: Weak<Tracking> = Rc::downgrade(&tracking);
                backend_notifier.on(event_type, move |event| match weak.upgrade() {
                    Some(tracking) => tracking.on_backend_event(event),
                    None => Ok(()),
                })
            })
            .collect();
        *tracking.subscriptions.borrow_mut() = handles;

        Self {
            tracking: Some(tracking),
            ..self.clone()
        }
    }

    /// Materializes the view.
    ///
    /// Stages the backend did not push down run through the backend's query
    /// engine, or [`SimpleQueryEngine`] when it has none. Backend errors are
    /// passed through unchanged.
    pub fn fetch(&self) -> Deferred<'static, Result<QueryResults>> {
        tracing::trace!(
            filters = self.query.filters().len(),
            sorted = self.query.sort().is_some(),
            range = ?self.query.range(),
            tracked = self.tracking.is_some(),
            "fetching collection"
        );

        let data = if self.tracking.is_some() {
            self.backend.fetch_data(&self.query.without_range())
        } else {
            self.backend.fetch_data(&self.query)
        };
        let seen = self.tracking.as_ref().map_or(0, |t| t.mutations.get());

        let this = self.clone();
        data.and_then_ready(move |data| {
            let results = this.materialize(data, seen)?;
            this.flush_refresh();
            Ok(results)
        })
    }

    /// Shorthand for `range(start, end)?.fetch()`.
    pub fn fetch_range(
        &self,
        start: usize,
        end: Option<usize>,
    ) -> Deferred<'static, Result<QueryResults>> {
        match self.range(start, end) {
            Ok(view) => view.fetch(),
            Err(err) => Deferred::ready(Err(err)),
        }
    }

    /// Fetches, then calls `callback` on each record in order.
    pub fn for_each<'a, F>(&self, mut callback: F) -> Deferred<'a, Result<QueryResults>>
    where
        F: FnMut(&Record, usize) + 'a,
    {
        self.fetch().and_then_ready(move |results| {
            for (index, record) in results.iter().enumerate() {
                callback(record, index);
            }
            Ok(results)
        })
    }

    /// Fetches, then maps each record in order.
    pub fn map<'a, U, F>(&self, mut callback: F) -> Deferred<'a, Result<Vec<U>>>
    where
        F: FnMut(&Record, usize) -> U + 'a,
        U: 'a,
    {
        self.fetch().and_then_ready(move |results| {
            Ok(results
                .iter()
                .enumerate()
                .map(|(index, record)| callback(record, index))
                .collect())
        })
    }

    /// `seen` is the tracking mutation count when the data was requested.
    fn materialize(&self, data: BackendResults, seen: u64) -> Result<QueryResults> {
        let BackendResults {
            records,
            total_length,
            pushdown,
        } = data;
        let engine: &dyn QueryEngine = self.backend.query_engine().unwrap_or(&SimpleQueryEngine);
        // filters see model defaults
        let records: Vec<Record> = records.into_iter().map(|r| self.bind(r)).collect();

        match &self.tracking {
            Some(tracking) => {
                let mut tracker = tracking.tracker.borrow_mut();
                if tracker.is_primed() && tracking.mutations.get() != seen {
                    // mutations already translated against the live snapshot
                    tracing::debug!("tracked fetch resolved after newer mutations; keeping snapshot");
                } else {
                    let unranged = self.query.without_range();
                    let Execution { records: full, .. } =
                        execute(engine, &unranged, records, pushdown);
                    tracker.prime(full);
                }
                let total = tracker.snapshot().len();
                Ok(QueryResults::new(tracker.window(), Some(total)))
            }
            None => {
                let Execution {
                    records,
                    total_length: applied_total,
                } = execute(engine, &self.query, records, pushdown);
                let total_length = applied_total
                    .or(total_length)
                    .or_else(|| self.query.range().is_none().then_some(records.len()));
                Ok(QueryResults::new(records, total_length))
            }
        }
    }

    /// Emits pending sort refreshes on this view and on every ancestor.
    fn flush_refresh(&self) {
        let mut view = Some(self);
        while let Some(current) = view {
            if current.pending_refresh.replace(false) {
                // listener failures are already logged by the notifier
                if current.refresh.emit(EventType::Refresh, ChangeEvent::refresh()).is_err() {
                    tracing::debug!("refresh listeners reported failures");
                }
            }
            view = current.parent();
        }
    }

    fn bind(&self, record: Record) -> Record {
        match &self.model {
            Some(model) => record.bind(Rc::clone(model)),
            None => record,
        }
    }

    /// Builds a record bound to this collection's model. Nothing is stored.
    pub fn create<K, V, I>(&self, properties: I) -> Record
    where
        K: Into<alloc::string::String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.assign_prototype(properties.into_iter().collect())
    }

    /// Binds `record` to this collection's model, if there is one.
    pub fn assign_prototype(&self, record: Record) -> Record {
        self.bind(record)
    }

    /// Looks up a record by identity through the backend.
    pub fn get(&self, id: &Value) -> Deferred<'static, Result<Option<Record>>> {
        let model = self.model.clone();
        self.backend.get(id).and_then_ready(move |found| {
            Ok(match (found, model) {
                (Some(record), Some(model)) => Some(record.bind(model)),
                (found, _) => found,
            })
        })
    }

    /// Like [`get`](Self::get), failing with `NotFound` when absent.
    pub fn get_required(&self, id: &Value) -> Deferred<'static, Result<Record>> {
        let id = id.clone();
        self.get(&id)
            .and_then_ready(move |found| found.ok_or_else(|| Error::not_found(id)))
    }

    /// Reads the identity of `record` using the backend's identity property.
    pub fn get_identity<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        record.get(self.backend.id_property())
    }

    /// Registers a listener.
    ///
    /// `refresh` listeners attach to this view. Other types attach to the
    /// backend, or to the translated stream when the view is tracked.
    pub fn on<F>(&self, event_type: EventType, listener: F) -> ListenerHandle
    where
        F: Fn(&ChangeEvent) -> Result<()> + 'static,
    {
        match (event_type, &self.tracking) {
            (EventType::Refresh, _) => self.refresh.on(event_type, listener),
            (_, Some(tracking)) => tracking.notifier.on(event_type, listener),
            (_, None) => self.backend.notifier().on(event_type, listener),
        }
    }

    /// Emits `refresh` on this view, anything else on the backend.
    pub fn emit(&self, event_type: EventType, event: ChangeEvent) -> Result<bool> {
        match event_type {
            EventType::Refresh => self.refresh.emit(event_type, event),
            _ => self.backend.notifier().emit(event_type, event),
        }
    }

    /// Reports each change as `(record, removed_from, inserted_into)`, with
    /// -1 standing for "not in the view".
    ///
    /// In-place updates are only reported when `include_object_updates` is
    /// set.
    pub fn observe<F>(&self, callback: F, include_object_updates: bool) -> ObserveHandle
    where
        F: Fn(&Record, isize, isize) + 'static,
    {
        let callback = Rc::new(callback);
        let handles = EventType::MUTATIONS
            .iter()
            .map(|&event_type| {
                let callback = Rc::clone(&callback);
                self.on(event_type, move |event| {
                    let Some((from, to)) = observed_indices(event, include_object_updates) else {
                        return Ok(());
                    };
                    match &event.target {
                        Some(record) => callback(record, from, to),
                        None => tracing::debug!(event = %event_type, "change without target not observed"),
                    }
                    Ok(())
                })
            })
            .collect();
        ObserveHandle { handles }
    }

    /// Tree navigation, when the backend holds a hierarchy.
    pub fn as_hierarchical(&self) -> Option<HierarchicalView> {
        let hierarchy = self.backend.hierarchy()?.clone();
        Some(HierarchicalView::new(self.clone(), hierarchy))
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("query", &self.query)
            .field("root", &self.is_root())
            .field("tracked", &self.is_tracked())
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .finish()
    }
}
