//! Parent/child navigation for tree-shaped data.
//!
//! A backend opts in by returning a [`Hierarchy`] from
//! [`Backend::hierarchy`](crate::Backend::hierarchy). Collections then expose
//! the capability through [`Collection::as_hierarchical`].

use crate::collection::Collection;
use alloc::string::String;
use stowage_core::{Error, Record, Result, Value};
use stowage_query::{Filter, Matcher};

/// Field flagging whether a record can have children.
pub const HAS_CHILDREN_PROPERTY: &str = "hasChildren";

/// Parent linkage of a tree-shaped backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    /// Field holding the parent's identity; null or missing on roots.
    pub parent_property: String,
}

impl Hierarchy {
    pub fn new(parent_property: impl Into<String>) -> Self {
        Self {
            parent_property: parent_property.into(),
        }
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new("parent")
    }
}

/// Tree navigation over a collection.
pub trait HierarchicalCapability {
    /// Records without a parent.
    fn get_root_collection(&self) -> Result<Collection>;

    /// Records whose parent is `parent`.
    fn get_children(&self, parent: &Record) -> Result<Collection>;

    /// False only when the record says it has no children.
    fn may_have_children(&self, record: &Record) -> bool;
}

/// A collection viewed as a tree.
#[derive(Clone, Debug)]
pub struct HierarchicalView {
    collection: Collection,
    hierarchy: Hierarchy,
}

impl HierarchicalView {
    pub(crate) fn new(collection: Collection, hierarchy: Hierarchy) -> Self {
        Self {
            collection,
            hierarchy,
        }
    }

    #[inline]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }
}

impl HierarchicalCapability for HierarchicalView {
    fn get_root_collection(&self) -> Result<Collection> {
        self.collection.filter(Filter::field(
            self.hierarchy.parent_property.as_str(),
            Matcher::test(Value::is_null),
        ))
    }

    fn get_children(&self, parent: &Record) -> Result<Collection> {
        let id = self
            .collection
            .get_identity(parent)
            .filter(|id| !id.is_null())
            .cloned()
            .ok_or_else(|| Error::invalid_operation("parent record has no identity"))?;
        self.collection
            .filter(Filter::field(self.hierarchy.parent_property.as_str(), id))
    }

    fn may_have_children(&self, record: &Record) -> bool {
        record.get(HAS_CHILDREN_PROPERTY) != Some(&Value::Boolean(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, MemoryOptions};
    use alloc::rc::Rc;
    use alloc::vec;

    fn make_node(id: &str, parent: Option<&str>) -> Record {
        Record::new()
            .with("id", id)
            .with("parent", parent.map(Value::from))
    }

    fn tree() -> HierarchicalView {
        let options = MemoryOptions::default().with_hierarchy(Hierarchy::default());
        let backend = Rc::new(MemoryBackend::with_options(
            vec![make_node("1", None), make_node("1.1", Some("1")), make_node("2", None)],
            options,
        ));
        Collection::new(backend).as_hierarchical().unwrap()
    }

    #[test]
    fn test_no_hierarchy_no_capability() {
        let backend = Rc::new(MemoryBackend::new(vec![]));
        assert!(Collection::new(backend).as_hierarchical().is_none());
    }

    #[test]
    fn test_may_have_children() {
        let view = tree();
        assert!(view.may_have_children(&Record::new()));
        assert!(view.may_have_children(&Record::new().with(HAS_CHILDREN_PROPERTY, true)));
        assert!(!view.may_have_children(&Record::new().with(HAS_CHILDREN_PROPERTY, false)));
    }

    #[test]
    fn test_get_children_requires_identity() {
        let view = tree();
        assert!(matches!(
            view.get_children(&Record::new()),
            Err(Error::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_root_and_children_queries() {
        let view = tree();
        let roots = view.get_root_collection().unwrap();
        assert_eq!(roots.query().filters().len(), 1);

        let children = view.get_children(&make_node("1", None)).unwrap();
        let fetched = children.fetch().try_now().ok().unwrap().unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].get("id"), Some(&Value::from("1.1")));
    }
}
