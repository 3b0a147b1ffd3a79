use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum NoteStoreError {
    #[error("Not in a notestore project. Run 'notestore init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .notestore/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous id '{0}' matches more than one note")]
    AmbiguousId(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<rusqlite::Error> for NoteStoreError {
    fn from(e: rusqlite::Error) -> Self {
        NoteStoreError::Storage(format!("SQLite error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, NoteStoreError>;
