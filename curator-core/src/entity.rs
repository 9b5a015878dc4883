use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical status values. The status vocabulary is ultimately owned by
/// the backing store; these four are the fallback set when the store
/// does not publish one.
pub const STATUS_IN: &str = "IN";
pub const STATUS_OUT: &str = "OUT";
pub const STATUS_DISCOVERED: &str = "DISCOVERED";
pub const STATUS_UNDECIDED: &str = "UNDECIDED";

/// The system-derived tag category. Rendered in the technical section
/// and never editable.
pub const TECHNICAL_CATEGORY: &str = "Other";

pub fn default_status_vocabulary() -> Vec<String> {
    vec![
        STATUS_IN.to_string(),
        STATUS_OUT.to_string(),
        STATUS_DISCOVERED.to_string(),
        STATUS_UNDECIDED.to_string(),
    ]
}

/// Map a raw status string onto the vocabulary, case-insensitively.
/// Unrecognized input falls back to DISCOVERED.
pub fn normalize_status(raw: &str, vocabulary: &[String]) -> String {
    for known in vocabulary {
        if known.eq_ignore_ascii_case(raw.trim()) {
            return known.clone();
        }
    }
    STATUS_DISCOVERED.to_string()
}

/// The fields an entity exposes to inline editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityField {
    Name,
    Homepage,
    Status,
}

impl EntityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityField::Name => "name",
            EntityField::Homepage => "homepage",
            EntityField::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCategory {
    pub name: String,
    pub editable: bool,
    pub values: Vec<String>,
}

impl TagCategory {
    pub fn editable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            editable: true,
            values: Vec::new(),
        }
    }

    pub fn read_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            editable: false,
            values: Vec::new(),
        }
    }

    /// Duplicate detection is case-insensitive within a category.
    pub fn position_ignore_case(&self, value: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|v| v.eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebEntity {
    pub id: String,
    pub name: String,
    pub homepage: Option<String>,
    pub status: String,
    pub creation_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
    pub last_crawl_date: Option<DateTime<Utc>>,
    /// LRU-encoded URL prefixes defining the entity. Ordered, unique,
    /// non-empty once persisted.
    pub prefixes: Vec<String>,
    /// Category name -> category. BTreeMap keeps rendering order stable.
    pub tags: BTreeMap<String, TagCategory>,
    /// Ordered ids of subsumed sub-entities.
    pub children: Vec<String>,
    /// Non-owning back-reference.
    pub parent: Option<String>,
}

impl WebEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            homepage: None,
            status: STATUS_DISCOVERED.to_string(),
            creation_date: now,
            last_modified_date: now,
            last_crawl_date: None,
            prefixes: Vec::new(),
            tags: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn with_child(mut self, child_id: impl Into<String>) -> Self {
        self.children.push(child_id.into());
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Categories the user may edit, in stable order.
    pub fn user_categories(&self) -> impl Iterator<Item = &TagCategory> {
        self.tags.values().filter(|c| c.editable)
    }

    /// System categories (technical information section).
    pub fn technical_categories(&self) -> impl Iterator<Item = &TagCategory> {
        self.tags.values().filter(|c| !c.editable)
    }
}
