pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod search;
pub mod storage;
pub mod validation;

pub use config::StoreConfig;
pub use entity::{Attachment, FileUpload, Note, Project, User};
pub use error::{NoteStoreError, Result};
pub use storage::NoteStore;
pub use validation::{validate, ValidationErrors};
