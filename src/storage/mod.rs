mod blob_storage;
mod sqlite_store;

pub use blob_storage::{BlobStorage, DiskStorage};
pub use sqlite_store::{NoteStore, STORE_DIR};
