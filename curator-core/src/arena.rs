//! The entity arena: the single source of truth for loaded web
//! entities.
//!
//! Entities are stored flat, keyed by id, with parent/child relations
//! expressed as id references rather than owned nesting. Every write
//! goes through one of the `apply_*` mutators; each call either fully
//! applies or leaves the arena untouched, and each successful call
//! emits a change notification to registered listeners.

use crate::edit::validate_field;
use crate::entity::{EntityField, WebEntity, normalize_status};
use crate::error::{CoreError, Result};
use crate::tags::{self, TagOp};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Field(EntityField),
    Tags(String),
    Prefixes,
    Children,
    Reloaded,
}

#[derive(Debug, Clone)]
pub struct EntityChange {
    pub entity_id: String,
    pub kind: ChangeKind,
}

pub type ChangeCallback = Arc<dyn Fn(&EntityChange) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Add,
    Remove,
}

pub struct EntityArena {
    entities: HashMap<String, WebEntity>,
    callbacks: Vec<ChangeCallback>,
    vocabulary: Vec<String>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            callbacks: Vec::new(),
            vocabulary: crate::entity::default_status_vocabulary(),
        }
    }

    /// Replace the status vocabulary (fetched from the store at session
    /// start).
    pub fn set_vocabulary(&mut self, vocabulary: Vec<String>) {
        if !vocabulary.is_empty() {
            self.vocabulary = vocabulary;
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn on_change(&mut self, callback: ChangeCallback) {
        self.callbacks.push(callback);
    }

    fn emit(&self, change: EntityChange) {
        for callback in &self.callbacks {
            callback(&change);
        }
    }

    pub fn get(&self, id: &str) -> Option<&WebEntity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert or replace a whole record, e.g. from a load response.
    /// The status is mapped onto the vocabulary on the way in; values
    /// the vocabulary does not know fall back to DISCOVERED.
    pub fn insert(&mut self, mut entity: WebEntity) {
        entity.status = normalize_status(&entity.status, &self.vocabulary);
        let id = entity.id.clone();
        debug!(entity = %id, "entity loaded into arena");
        self.entities.insert(id.clone(), entity);
        self.emit(EntityChange {
            entity_id: id,
            kind: ChangeKind::Reloaded,
        });
    }

    pub fn remove(&mut self, id: &str) -> Option<WebEntity> {
        self.entities.remove(id)
    }

    /// Set an identity field after validating it against its declared
    /// kind. Returns the normalized value actually stored.
    pub fn apply_field_update(
        &mut self,
        id: &str,
        field: EntityField,
        value: &str,
    ) -> Result<String> {
        let normalized = validate_field(field, value, &self.vocabulary)?;
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match field {
            EntityField::Name => entity.name = normalized.clone(),
            EntityField::Homepage => entity.homepage = Some(normalized.clone()),
            EntityField::Status => entity.status = normalized.clone(),
        }
        debug!(entity = %id, field = field.as_str(), value = %normalized, "field updated");

        self.emit(EntityChange {
            entity_id: id.to_string(),
            kind: ChangeKind::Field(field),
        });
        Ok(normalized)
    }

    /// Add or remove a tag in a category. Read-only categories refuse
    /// both ops; duplicates are detected case-insensitively.
    pub fn apply_tag_update(
        &mut self,
        id: &str,
        category: &str,
        op: TagOp,
        value: &str,
    ) -> Result<String> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let applied = tags::apply(entity, category, op, value)?;

        self.emit(EntityChange {
            entity_id: id.to_string(),
            kind: ChangeKind::Tags(category.to_string()),
        });
        Ok(applied)
    }

    /// Add or remove an LRU prefix. A persisted entity keeps at least
    /// one prefix, so removing the last one is refused.
    pub fn apply_prefix_update(&mut self, id: &str, op: PrefixOp, lru: &str) -> Result<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match op {
            PrefixOp::Add => {
                if entity.prefixes.iter().any(|p| p == lru) {
                    return Err(CoreError::validation("prefix", "prefix already present"));
                }
                // A prefix inside an existing broader prefix adds no
                // pages to the entity.
                if let Some(covering) = entity
                    .prefixes
                    .iter()
                    .find(|p| crate::lru::is_prefix_of(p, lru))
                {
                    return Err(CoreError::validation(
                        "prefix",
                        format!("already covered by {}", covering),
                    ));
                }
                entity.prefixes.push(lru.to_string());
            }
            PrefixOp::Remove => {
                let pos = entity
                    .prefixes
                    .iter()
                    .position(|p| p == lru)
                    .ok_or_else(|| CoreError::NotFound(format!("prefix {}", lru)))?;
                if entity.prefixes.len() == 1 {
                    return Err(CoreError::validation(
                        "prefix",
                        "a web entity must keep at least one prefix",
                    ));
                }
                entity.prefixes.remove(pos);
            }
        }
        debug!(entity = %id, prefix = %lru, ?op, "prefix updated");

        self.emit(EntityChange {
            entity_id: id.to_string(),
            kind: ChangeKind::Prefixes,
        });
        Ok(())
    }

    /// Fold server-confirmed state into the record after an accepted
    /// mutation: the normalized field value (if the store rewrote it)
    /// and the recomputed last-modified date. Bypasses local
    /// validation; the store is authoritative here.
    pub fn apply_server_confirmation(
        &mut self,
        id: &str,
        field: Option<EntityField>,
        normalized: Option<&str>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if let (Some(field), Some(value)) = (field, normalized) {
            match field {
                EntityField::Name => entity.name = value.to_string(),
                EntityField::Homepage => entity.homepage = Some(value.to_string()),
                EntityField::Status => entity.status = value.to_string(),
            }
        }
        if let Some(stamp) = last_modified {
            entity.last_modified_date = stamp;
        }

        if let Some(field) = field {
            self.emit(EntityChange {
                entity_id: id.to_string(),
                kind: ChangeKind::Field(field),
            });
        }
        Ok(())
    }
}

impl Default for EntityArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityArena")
            .field("entities", &self.entities.len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::TagCategory;
    use std::sync::Mutex;

    fn sample() -> WebEntity {
        let mut e = WebEntity::new("WE1", "Example").with_prefix("s:http|h:org|h:example|");
        e.tags
            .insert("Topics".to_string(), TagCategory::editable("Topics"));
        e
    }

    #[test]
    fn field_update_is_all_or_nothing() {
        let mut arena = EntityArena::new();
        arena.insert(sample());

        // Invalid homepage leaves the record untouched.
        let err = arena
            .apply_field_update("WE1", EntityField::Homepage, "not a url")
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(arena.get("WE1").unwrap().homepage, None);

        arena
            .apply_field_update("WE1", EntityField::Homepage, "http://example.org/")
            .unwrap();
        assert_eq!(
            arena.get("WE1").unwrap().homepage.as_deref(),
            Some("http://example.org/")
        );
    }

    #[test]
    fn change_notifications_fire_per_mutation() {
        let mut arena = EntityArena::new();
        let seen: Arc<Mutex<Vec<ChangeKind>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        arena.on_change(Arc::new(move |change| {
            seen_clone.lock().unwrap().push(change.kind.clone());
        }));

        arena.insert(sample());
        arena
            .apply_field_update("WE1", EntityField::Name, "Renamed")
            .unwrap();
        arena
            .apply_tag_update("WE1", "Topics", TagOp::Add, "science")
            .unwrap();

        let kinds = seen.lock().unwrap();
        assert_eq!(
            *kinds,
            vec![
                ChangeKind::Reloaded,
                ChangeKind::Field(EntityField::Name),
                ChangeKind::Tags("Topics".to_string()),
            ]
        );
    }

    #[test]
    fn last_prefix_cannot_be_removed() {
        let mut arena = EntityArena::new();
        arena.insert(sample());
        let err = arena
            .apply_prefix_update("WE1", PrefixOp::Remove, "s:http|h:org|h:example|")
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(arena.get("WE1").unwrap().prefixes.len(), 1);
    }

    #[test]
    fn unknown_status_normalizes_to_discovered_on_insert() {
        let mut arena = EntityArena::new();
        let mut entity = sample();
        entity.status = "banana".to_string();
        arena.insert(entity);
        assert_eq!(arena.get("WE1").unwrap().status, "DISCOVERED");
    }

    #[test]
    fn status_casing_normalized_on_insert() {
        let mut arena = EntityArena::new();
        let mut entity = sample();
        entity.status = "in".to_string();
        arena.insert(entity);
        assert_eq!(arena.get("WE1").unwrap().status, "IN");
    }

    #[test]
    fn prefix_covered_by_broader_prefix_rejected() {
        let mut arena = EntityArena::new();
        arena.insert(sample());
        let err = arena
            .apply_prefix_update("WE1", PrefixOp::Add, "s:http|h:org|h:example|p:blog|")
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(arena.get("WE1").unwrap().prefixes.len(), 1);

        // A disjoint prefix is still accepted.
        arena
            .apply_prefix_update("WE1", PrefixOp::Add, "s:https|h:org|h:example|")
            .unwrap();
        assert_eq!(arena.get("WE1").unwrap().prefixes.len(), 2);
    }

    #[test]
    fn server_confirmation_updates_last_modified() {
        let mut arena = EntityArena::new();
        arena.insert(sample());
        let stamp = Utc::now();
        arena
            .apply_server_confirmation(
                "WE1",
                Some(EntityField::Name),
                Some("Canonical Name"),
                Some(stamp),
            )
            .unwrap();
        let entity = arena.get("WE1").unwrap();
        assert_eq!(entity.name, "Canonical Name");
        assert_eq!(entity.last_modified_date, stamp);
    }
}
