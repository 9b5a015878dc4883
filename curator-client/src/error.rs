use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("could not decode store response: {0}")]
    Decode(String),

    #[error("invalid store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    /// Network-level failures are worth retrying by the caller; a
    /// missing entity or a garbled payload is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
