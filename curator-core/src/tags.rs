//! Tag operations on a web entity.
//!
//! Values are trimmed and case-preserved, but compared
//! case-insensitively for duplicate detection within a category. The
//! system "Other" category is read-only: every mutating call on it
//! fails before touching anything.

use crate::entity::WebEntity;
use crate::error::{CoreError, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    Add,
    Remove,
}

/// Validate a tag mutation without applying it. Both the arena and
/// callers wanting to pre-flight an optimistic UI update go through
/// this, so validation cannot drift from application.
pub fn check(entity: &WebEntity, category: &str, op: TagOp, value: &str) -> Result<String> {
    let cat = entity
        .tags
        .get(category)
        .ok_or_else(|| CoreError::UnknownCategory(category.to_string()))?;

    if !cat.editable {
        return Err(CoreError::ReadOnlyCategory(category.to_string()));
    }

    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        return Err(CoreError::validation("tag", "empty tag value"));
    }

    match op {
        TagOp::Add => {
            if cat.position_ignore_case(&trimmed).is_some() {
                return Err(CoreError::DuplicateTag {
                    category: category.to_string(),
                    value: trimmed,
                });
            }
        }
        TagOp::Remove => {
            if cat.position_ignore_case(&trimmed).is_none() {
                return Err(CoreError::NotFound(format!(
                    "tag '{}' in category '{}'",
                    trimmed, category
                )));
            }
        }
    }

    Ok(trimmed)
}

/// Apply a tag mutation. All-or-nothing: validation happens first and
/// nothing is written on failure.
pub fn apply(entity: &mut WebEntity, category: &str, op: TagOp, value: &str) -> Result<String> {
    let trimmed = check(entity, category, op, value)?;

    // check() guarantees the category exists and is editable.
    let cat = entity
        .tags
        .get_mut(category)
        .expect("category vanished between check and apply");

    match op {
        TagOp::Add => {
            debug!(entity = %entity.id, category, value = %trimmed, "adding tag");
            cat.values.push(trimmed.clone());
        }
        TagOp::Remove => {
            debug!(entity = %entity.id, category, value = %trimmed, "removing tag");
            let pos = cat
                .position_ignore_case(&trimmed)
                .expect("tag vanished between check and apply");
            cat.values.remove(pos);
        }
    }

    Ok(trimmed)
}
