// Tests for tag categories and tag mutations

use curator_core::arena::EntityArena;
use curator_core::entity::{TECHNICAL_CATEGORY, TagCategory, WebEntity};
use curator_core::error::CoreError;
use curator_core::tags::TagOp;

fn entity_with_tags() -> WebEntity {
    let mut entity = WebEntity::new("WE1", "Example").with_prefix("s:http|h:org|h:example|");
    let mut topics = TagCategory::editable("Topics");
    topics.values.push("Science".to_string());

    let mut other = TagCategory::read_only(TECHNICAL_CATEGORY);
    other.values.push("crawled".to_string());

    entity.tags.insert("Topics".to_string(), topics);
    entity.tags.insert(TECHNICAL_CATEGORY.to_string(), other);
    entity
}

fn arena() -> EntityArena {
    let mut arena = EntityArena::new();
    arena.insert(entity_with_tags());
    arena
}

// ============================================================================
// Add / Remove Tests
// ============================================================================

#[test]
fn test_add_tag_preserves_case() {
    let mut arena = arena();
    arena
        .apply_tag_update("WE1", "Topics", TagOp::Add, "MediaLab")
        .unwrap();
    let values = &arena.get("WE1").unwrap().tags["Topics"].values;
    assert_eq!(values, &vec!["Science".to_string(), "MediaLab".to_string()]);
}

#[test]
fn test_add_tag_trims_whitespace() {
    let mut arena = arena();
    let stored = arena
        .apply_tag_update("WE1", "Topics", TagOp::Add, "  politics  ")
        .unwrap();
    assert_eq!(stored, "politics");
}

#[test]
fn test_add_empty_tag_rejected() {
    let mut arena = arena();
    let err = arena
        .apply_tag_update("WE1", "Topics", TagOp::Add, "   ")
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[test]
fn test_remove_tag() {
    let mut arena = arena();
    arena
        .apply_tag_update("WE1", "Topics", TagOp::Remove, "Science")
        .unwrap();
    assert!(arena.get("WE1").unwrap().tags["Topics"].values.is_empty());
}

#[test]
fn test_remove_missing_tag_not_found() {
    let mut arena = arena();
    let err = arena
        .apply_tag_update("WE1", "Topics", TagOp::Remove, "Absent")
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn test_unknown_category() {
    let mut arena = arena();
    let err = arena
        .apply_tag_update("WE1", "Nope", TagOp::Add, "x")
        .unwrap_err();
    assert!(matches!(err, CoreError::UnknownCategory(_)));
}

// ============================================================================
// Duplicate Detection Tests
// ============================================================================

#[test]
fn test_duplicate_tag_detected_case_insensitively() {
    let mut arena = arena();
    let err = arena
        .apply_tag_update("WE1", "Topics", TagOp::Add, "SCIENCE")
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateTag { .. }));

    // The set is unchanged, original casing intact.
    let values = &arena.get("WE1").unwrap().tags["Topics"].values;
    assert_eq!(values, &vec!["Science".to_string()]);
}

#[test]
fn test_remove_matches_case_insensitively() {
    let mut arena = arena();
    arena
        .apply_tag_update("WE1", "Topics", TagOp::Remove, "science")
        .unwrap();
    assert!(arena.get("WE1").unwrap().tags["Topics"].values.is_empty());
}

// ============================================================================
// Read-Only Category Tests
// ============================================================================

#[test]
fn test_read_only_category_refuses_add() {
    let mut arena = arena();
    let err = arena
        .apply_tag_update("WE1", TECHNICAL_CATEGORY, TagOp::Add, "manual")
        .unwrap_err();
    assert!(matches!(err, CoreError::ReadOnlyCategory(_)));
    assert_eq!(
        arena.get("WE1").unwrap().tags[TECHNICAL_CATEGORY].values,
        vec!["crawled".to_string()]
    );
}

#[test]
fn test_read_only_category_refuses_remove() {
    let mut arena = arena();
    let err = arena
        .apply_tag_update("WE1", TECHNICAL_CATEGORY, TagOp::Remove, "crawled")
        .unwrap_err();
    assert!(matches!(err, CoreError::ReadOnlyCategory(_)));
    assert_eq!(
        arena.get("WE1").unwrap().tags[TECHNICAL_CATEGORY].values,
        vec!["crawled".to_string()]
    );
}

#[test]
fn test_category_partition_helpers() {
    let entity = entity_with_tags();
    let user: Vec<_> = entity.user_categories().map(|c| c.name.as_str()).collect();
    let technical: Vec<_> = entity
        .technical_categories()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(user, vec!["Topics"]);
    assert_eq!(technical, vec![TECHNICAL_CATEGORY]);
}
