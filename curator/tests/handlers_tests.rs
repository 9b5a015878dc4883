use curator::handlers::*;
use curator_core::entity::{EntityField, TagCategory, WebEntity};
use tempfile::NamedTempFile;

fn sample_entity() -> WebEntity {
    let mut entity = WebEntity::new("WE1", "Example Org")
        .with_prefix("s:http|h:org|h:example|")
        .with_child("WE2")
        .with_child("WE3");
    entity.homepage = Some("http://example.org/".to_string());
    entity.status = "IN".to_string();
    let mut topics = TagCategory::editable("Topics");
    topics.values.push("Science".to_string());
    topics.values.push("MediaLab".to_string());
    entity.tags.insert("Topics".to_string(), topics);
    let mut other = TagCategory::read_only("Other");
    other.values.push("crawled".to_string());
    entity.tags.insert("Other".to_string(), other);
    entity
}

#[test]
fn test_parse_field_known_names() {
    assert_eq!(parse_field("name"), Some(EntityField::Name));
    assert_eq!(parse_field("homepage"), Some(EntityField::Homepage));
    assert_eq!(parse_field("STATUS"), Some(EntityField::Status));
}

#[test]
fn test_parse_field_unknown() {
    assert_eq!(parse_field("creation_date"), None);
    assert_eq!(parse_field(""), None);
}

#[test]
fn test_format_entity_includes_identity_and_prefixes() {
    let text = format_entity(&sample_entity());

    assert!(text.starts_with("WE1  Example Org\n"));
    assert!(text.contains("homepage   http://example.org/"));
    assert!(text.contains("status     IN"));
    assert!(text.contains("s:http|h:org|h:example|"));
    assert!(text.contains("Topics: Science, MediaLab"));
    assert!(text.contains("Other (read-only): crawled"));
    assert!(text.contains("sub-entities: 2"));
}

#[test]
fn test_format_entity_missing_homepage_rendered_as_dash() {
    let mut entity = sample_entity();
    entity.homepage = None;
    let text = format_entity(&entity);
    assert!(text.contains("homepage   -"));
}

#[test]
fn test_write_entity_json_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let entity = sample_entity();
    let file = NamedTempFile::new()?;
    write_entity_json(file.path(), &entity)?;

    let raw = std::fs::read_to_string(file.path())?;
    let parsed: WebEntity = serde_json::from_str(&raw)?;
    assert_eq!(parsed.id, "WE1");
    assert_eq!(parsed.name, "Example Org");
    assert_eq!(parsed.prefixes, entity.prefixes);
    assert_eq!(parsed.children, vec!["WE2", "WE3"]);
    Ok(())
}
