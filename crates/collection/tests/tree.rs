//! Integration tests for hierarchical navigation.

use std::rc::Rc;

use stowage_collection::{
    Collection, HierarchicalCapability, HierarchicalView, Hierarchy, MemoryBackend,
    MemoryOptions, Record, Value,
};

fn make_node(id: &str, parent: Option<&str>, name: &str) -> Record {
    Record::new()
        .with("parent", parent.map(Value::from))
        .with("id", id)
        .with("name", name)
}

fn fixture() -> Vec<Record> {
    vec![
        make_node("1", None, "root1"),
        make_node("1.1", Some("1"), "child1.1"),
        make_node("1.2", Some("1"), "child1.2"),
        make_node("1.2.1", Some("1.2"), "grandchild1.2.1"),
        make_node("1.2.2", Some("1.2"), "grandchild1.2.2"),
        make_node("1.3", Some("1"), "child1.3"),
        make_node("2", None, "root2"),
        make_node("2.1", Some("2"), "child2.1"),
        make_node("2.2", Some("2"), "child2.2"),
        make_node("3", None, "root3"),
    ]
}

fn make_tree() -> (Collection, HierarchicalView) {
    let options = MemoryOptions::default().with_hierarchy(Hierarchy::default());
    let backend = Rc::new(MemoryBackend::with_options(fixture(), options));
    let store = Collection::without_model(backend);
    let tree = store.as_hierarchical().unwrap();
    (store, tree)
}

fn fetch_records(collection: &Collection) -> Vec<Record> {
    pollster::block_on(collection.fetch()).unwrap().into_records()
}

fn get(store: &Collection, id: &str) -> Record {
    pollster::block_on(store.get_required(&Value::from(id))).unwrap()
}

#[test]
fn test_get_root_collection() {
    let (_, tree) = make_tree();
    let roots = fetch_records(&tree.get_root_collection().unwrap());
    assert_eq!(
        roots,
        vec![
            make_node("1", None, "root1"),
            make_node("2", None, "root2"),
            make_node("3", None, "root3"),
        ]
    );
}

#[test]
fn test_roots_include_records_without_parent_field() {
    let options = MemoryOptions::default().with_hierarchy(Hierarchy::default());
    let backend = Rc::new(MemoryBackend::with_options(
        vec![
            Record::new().with("id", "a"),
            make_node("b", Some("a"), "child"),
        ],
        options,
    ));
    let tree = Collection::new(backend).as_hierarchical().unwrap();
    let roots = fetch_records(&tree.get_root_collection().unwrap());
    assert_eq!(roots, vec![Record::new().with("id", "a")]);
}

#[test]
fn test_may_have_children() {
    let (_, tree) = make_tree();
    assert!(tree.may_have_children(&Record::new()));
    assert!(tree.may_have_children(&Record::new().with("hasChildren", true)));
    assert!(!tree.may_have_children(&Record::new().with("hasChildren", false)));
}

#[test]
fn test_get_children() {
    let (store, tree) = make_tree();

    let childless = get(&store, "3");
    assert!(fetch_records(&tree.get_children(&childless).unwrap()).is_empty());

    let parent = get(&store, "1");
    assert_eq!(
        fetch_records(&tree.get_children(&parent).unwrap()),
        vec![
            make_node("1.1", Some("1"), "child1.1"),
            make_node("1.2", Some("1"), "child1.2"),
            make_node("1.3", Some("1"), "child1.3"),
        ]
    );

    let grandparent = get(&store, "1.2");
    assert_eq!(
        fetch_records(&tree.get_children(&grandparent).unwrap()),
        vec![
            make_node("1.2.1", Some("1.2"), "grandchild1.2.1"),
            make_node("1.2.2", Some("1.2"), "grandchild1.2.2"),
        ]
    );
}

#[test]
fn test_children_compose_with_sort() {
    let (store, tree) = make_tree();
    let children = tree
        .get_children(&get(&store, "2"))
        .unwrap()
        .sort_by("name", true)
        .unwrap();
    let names: Vec<_> = fetch_records(&children)
        .iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str).map(String::from))
        .collect();
    assert_eq!(names, vec!["child2.2", "child2.1"]);
}
