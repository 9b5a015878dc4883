// Tests for content tree traversal, expansion and cycle safety

use curator_core::arena::EntityArena;
use curator_core::entity::WebEntity;
use curator_core::tree::ContentTree;

fn arena_with(entities: Vec<WebEntity>) -> EntityArena {
    let mut arena = EntityArena::new();
    for entity in entities {
        arena.insert(entity);
    }
    arena
}

// ============================================================================
// Traversal Tests
// ============================================================================

#[test]
fn test_focus_rendered_first_and_highlighted() {
    let arena = arena_with(vec![
        WebEntity::new("A", "Root").with_child("B"),
        WebEntity::new("B", "Child"),
    ]);
    let tree = ContentTree::new("A");
    let rows = tree.rows(&arena);

    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_focus);
    assert_eq!(rows[0].depth, 0);
    assert!(!rows[1].is_focus);
    assert_eq!(rows[1].depth, 1);
    assert_eq!(rows[1].name, "Child");
}

#[test]
fn test_children_keep_declared_order() {
    let arena = arena_with(vec![
        WebEntity::new("A", "Root").with_child("C").with_child("B"),
        WebEntity::new("B", "Bravo"),
        WebEntity::new("C", "Charlie"),
    ]);
    let tree = ContentTree::new("A");
    let names: Vec<_> = tree.rows(&arena).iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["Root", "Charlie", "Bravo"]);
}

#[test]
fn test_collapsed_children_not_rendered() {
    let arena = arena_with(vec![
        WebEntity::new("A", "Root").with_child("B"),
        WebEntity::new("B", "Child").with_child("C"),
        WebEntity::new("C", "Grandchild"),
    ]);
    let tree = ContentTree::new("A");

    // B starts collapsed: C must not appear.
    let rows = tree.rows(&arena);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.id != "C"));
}

#[test]
fn test_expansion_reveals_subtree() {
    let arena = arena_with(vec![
        WebEntity::new("A", "Root").with_child("B"),
        WebEntity::new("B", "Child").with_child("C"),
        WebEntity::new("C", "Grandchild"),
    ]);
    let mut tree = ContentTree::new("A");
    assert!(tree.toggle("B"));

    let rows = tree.rows(&arena);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].id, "C");
    assert_eq!(rows[2].depth, 2);

    // Collapse hides it again.
    assert!(!tree.toggle("B"));
    assert_eq!(tree.rows(&arena).len(), 2);
}

// ============================================================================
// Cycle Safety Tests
// ============================================================================

#[test]
fn test_cycle_terminates_and_renders_each_node_once() {
    // A lists B as a child and B lists A right back.
    let arena = arena_with(vec![
        WebEntity::new("A", "Alpha").with_child("B"),
        WebEntity::new("B", "Beta").with_child("A"),
    ]);
    let mut tree = ContentTree::new("A");
    tree.expand("B");

    let rows = tree.rows(&arena);
    assert_eq!(rows.len(), 2);
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[test]
fn test_self_reference_truncated() {
    let arena = arena_with(vec![WebEntity::new("A", "Alpha").with_child("A")]);
    let tree = ContentTree::new("A");
    assert_eq!(tree.rows(&arena).len(), 1);
}

// ============================================================================
// Lazy Loading Tests
// ============================================================================

#[test]
fn test_unloaded_children_rendered_as_placeholders() {
    let arena = arena_with(vec![WebEntity::new("A", "Root").with_child("B")]);
    let tree = ContentTree::new("A");

    let rows = tree.rows(&arena);
    assert_eq!(rows.len(), 2);
    assert!(!rows[1].loaded);
    assert_eq!(rows[1].name, "B");
}

#[test]
fn test_missing_children_only_under_expanded_nodes() {
    let arena = arena_with(vec![
        WebEntity::new("A", "Root").with_child("B"),
        WebEntity::new("B", "Child").with_child("C"),
    ]);
    let mut tree = ContentTree::new("A");

    // B is loaded and collapsed: C is not requested.
    assert!(tree.missing_children(&arena).is_empty());

    // Expanding B surfaces the lazy fetch for C.
    tree.expand("B");
    assert_eq!(tree.missing_children(&arena), vec!["C".to_string()]);
}

// ============================================================================
// Incremental Re-render Tests
// ============================================================================

#[test]
fn test_toggle_marks_only_that_subtree_dirty() {
    let mut tree = ContentTree::new("A");
    tree.toggle("B");

    let dirty = tree.take_dirty();
    assert_eq!(dirty.len(), 1);
    assert!(dirty.contains("B"));

    // Consumed: a second take sees nothing.
    assert!(tree.take_dirty().is_empty());
}

#[test]
fn test_expansion_state_survives_model_refresh() {
    let mut arena = arena_with(vec![
        WebEntity::new("A", "Root").with_child("B"),
        WebEntity::new("B", "Child").with_child("C"),
        WebEntity::new("C", "Grandchild"),
    ]);
    let mut tree = ContentTree::new("A");
    tree.expand("B");

    // Reload B (e.g. after a server-confirmed edit); expansion is owned
    // by the tree, not the renderer, so it persists.
    arena.insert(WebEntity::new("B", "Child renamed").with_child("C"));
    tree.mark_dirty("B");

    let rows = tree.rows(&arena);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].name, "Child renamed");
    assert!(rows[1].expanded);
}
