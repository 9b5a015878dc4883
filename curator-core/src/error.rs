use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("tag '{value}' already present in category '{category}'")]
    DuplicateTag { category: String, value: String },

    #[error("category '{0}' is read-only")]
    ReadOnlyCategory(String),

    #[error("unknown tag category: {0}")]
    UnknownCategory(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
