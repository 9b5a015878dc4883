//! Inline edit sessions.
//!
//! Each editable field gets its own state machine:
//!
//! ```text
//! Viewing -> (activate) -> Editing -> (confirm) -> Committing -> Viewing
//!                             ^                        |
//!                             +--- invalid input ------+--> Reverting -> Viewing
//! ```
//!
//! Sessions on different fields are independent; a second activation on
//! a field that is mid-commit is a rejected no-op until the commit
//! resolves. Validation runs on confirm, before anything is sent
//! anywhere: invalid input keeps the session Editing with a field-local
//! error and issues no mutation.

use crate::entity::{EntityField, default_status_vocabulary};
use crate::error::{CoreError, Result};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
    Committing,
    Reverting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Url,
    Status,
}

impl EntityField {
    pub fn kind(&self) -> FieldKind {
        match self {
            EntityField::Name => FieldKind::Text,
            EntityField::Homepage => FieldKind::Url,
            EntityField::Status => FieldKind::Status,
        }
    }
}

/// Validate a candidate value against the field's declared kind,
/// returning the normalized form to store and send.
pub fn validate_field(field: EntityField, value: &str, vocabulary: &[String]) -> Result<String> {
    let trimmed = value.trim();
    match field.kind() {
        FieldKind::Text => {
            if trimmed.is_empty() {
                return Err(CoreError::validation(field.as_str(), "must not be empty"));
            }
            Ok(trimmed.to_string())
        }
        FieldKind::Url => {
            let url = Url::parse(trimmed)
                .map_err(|e| CoreError::validation(field.as_str(), format!("not a URL: {}", e)))?;
            match url.scheme() {
                "http" | "https" => Ok(url.to_string()),
                other => Err(CoreError::validation(
                    field.as_str(),
                    format!("unsupported scheme: {}", other),
                )),
            }
        }
        FieldKind::Status => {
            // The vocabulary comes from the store; values outside it are
            // rejected rather than assumed into a closed local enum.
            vocabulary
                .iter()
                .find(|v| v.eq_ignore_ascii_case(trimmed))
                .cloned()
                .ok_or_else(|| {
                    CoreError::validation(
                        field.as_str(),
                        format!("'{}' is not in the status vocabulary", trimmed),
                    )
                })
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditSession {
    pub field: EntityField,
    pub original: String,
    pub pending: String,
    pub state: EditState,
    pub error: Option<String>,
}

/// Owns one session per field and enforces the legal transitions.
pub struct EditController {
    sessions: HashMap<EntityField, EditSession>,
    vocabulary: Vec<String>,
}

impl EditController {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            vocabulary: default_status_vocabulary(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vec<String>) -> Self {
        if !vocabulary.is_empty() {
            self.vocabulary = vocabulary;
        }
        self
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn session(&self, field: EntityField) -> Option<&EditSession> {
        self.sessions.get(&field)
    }

    pub fn state(&self, field: EntityField) -> EditState {
        self.sessions
            .get(&field)
            .map(|s| s.state)
            .unwrap_or(EditState::Viewing)
    }

    /// Begin editing a field. Only legal from Viewing; returns false
    /// (and changes nothing) while a commit or revert is in flight.
    pub fn activate(&mut self, field: EntityField, current_value: &str) -> bool {
        if self.state(field) != EditState::Viewing {
            debug!(field = field.as_str(), "activation rejected: not viewing");
            return false;
        }
        self.sessions.insert(
            field,
            EditSession {
                field,
                original: current_value.to_string(),
                pending: current_value.to_string(),
                state: EditState::Editing,
                error: None,
            },
        );
        true
    }

    pub fn set_pending(&mut self, field: EntityField, value: impl Into<String>) {
        if let Some(session) = self.sessions.get_mut(&field) {
            if session.state == EditState::Editing {
                session.pending = value.into();
                session.error = None;
            }
        }
    }

    pub fn push_char(&mut self, field: EntityField, c: char) {
        if let Some(session) = self.sessions.get_mut(&field) {
            if session.state == EditState::Editing {
                session.pending.push(c);
                session.error = None;
            }
        }
    }

    pub fn pop_char(&mut self, field: EntityField) {
        if let Some(session) = self.sessions.get_mut(&field) {
            if session.state == EditState::Editing {
                session.pending.pop();
            }
        }
    }

    /// Validate and move to Committing. On validation failure the
    /// session stays Editing, records the error, and nothing must be
    /// submitted.
    pub fn confirm(&mut self, field: EntityField) -> Result<String> {
        let session = self
            .sessions
            .get_mut(&field)
            .ok_or_else(|| CoreError::NotFound(format!("no edit session for {}", field.as_str())))?;
        if session.state != EditState::Editing {
            return Err(CoreError::validation(field.as_str(), "no edit in progress"));
        }

        match validate_field(field, &session.pending, &self.vocabulary) {
            Ok(normalized) => {
                session.pending = normalized.clone();
                session.state = EditState::Committing;
                session.error = None;
                Ok(normalized)
            }
            Err(e) => {
                session.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Abandon an edit before confirming. Returns to Viewing.
    pub fn cancel(&mut self, field: EntityField) {
        if self.state(field) == EditState::Editing {
            self.sessions.remove(&field);
        }
    }

    /// The coordinator accepted the commit. Returns the value now
    /// current (server-normalized when provided).
    pub fn commit_succeeded(&mut self, field: EntityField, normalized: Option<&str>) -> String {
        let value = match self.sessions.remove(&field) {
            Some(session) => normalized.unwrap_or(&session.pending).to_string(),
            None => normalized.unwrap_or_default().to_string(),
        };
        debug!(field = field.as_str(), value = %value, "commit confirmed");
        value
    }

    /// The coordinator rejected the commit. Enters Reverting and
    /// returns the original value the caller must restore; the notice
    /// is kept on the session until `revert_complete`.
    pub fn commit_failed(&mut self, field: EntityField, reason: &str) -> Option<String> {
        let session = self.sessions.get_mut(&field)?;
        if session.state != EditState::Committing {
            return None;
        }
        session.state = EditState::Reverting;
        session.error = Some(reason.to_string());
        debug!(field = field.as_str(), reason, "commit rejected, reverting");
        Some(session.original.clone())
    }

    /// The caller restored the original value; the session is done.
    pub fn revert_complete(&mut self, field: EntityField) {
        if self.state(field) == EditState::Reverting {
            self.sessions.remove(&field);
        }
    }
}

impl Default for EditController {
    fn default() -> Self {
        Self::new()
    }
}
