//! The storage collaborator behind every collection.

use crate::deferred::Deferred;
use crate::hierarchy::Hierarchy;
use alloc::vec::Vec;
use stowage_core::{Record, Result, Value, DEFAULT_ID_PROPERTY};
use stowage_query::{Pushdown, Query, QueryEngine};
use stowage_reactive::Notifier;

/// Records handed back by [`Backend::fetch_data`].
#[derive(Clone, Debug, Default)]
pub struct BackendResults {
    pub records: Vec<Record>,
    /// Count ignoring the range, when the backend applied the range itself.
    pub total_length: Option<usize>,
    /// Stages already applied to `records`.
    pub pushdown: Pushdown,
}

impl BackendResults {
    /// The raw data set; every stage is left to the collection.
    pub fn raw(records: Vec<Record>) -> Self {
        Self {
            records,
            total_length: None,
            pushdown: Pushdown::NONE,
        }
    }

    /// Records with the given stages already applied.
    pub fn with_pushdown(records: Vec<Record>, pushdown: Pushdown) -> Self {
        Self {
            records,
            total_length: None,
            pushdown,
        }
    }

    pub fn with_total_length(mut self, total_length: usize) -> Self {
        self.total_length = Some(total_length);
        self
    }
}

/// A source of records.
///
/// Collections only ever talk to the root backend; derived views pass their
/// accumulated [`Query`] down and apply whatever the backend leaves undone.
pub trait Backend {
    /// Returns the records for `query`, reporting which stages were pushed down.
    fn fetch_data(&self, query: &Query) -> Deferred<'static, Result<BackendResults>>;

    /// Looks up one record by identity.
    fn get(&self, id: &Value) -> Deferred<'static, Result<Option<Record>>>;

    /// Name of the identity field.
    fn id_property(&self) -> &str {
        DEFAULT_ID_PROPERTY
    }

    /// Engine used for stages the backend does not push down.
    fn query_engine(&self) -> Option<&dyn QueryEngine> {
        None
    }

    /// Registry for the backend's primitive `add`/`update`/`remove` events.
    fn notifier(&self) -> &Notifier;

    /// Parent linkage, for backends that hold trees.
    fn hierarchy(&self) -> Option<&Hierarchy> {
        None
    }
}
