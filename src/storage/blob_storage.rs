use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{NoteStoreError, Result};

/// Where attachment bytes live.
///
/// Keys are opaque strings chosen by the store; backends decide how they map
/// onto their own layout.
pub trait BlobStorage {
    /// Write data under `key`, replacing anything already there.
    fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete data under `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;
}

/// Filesystem blob storage.
///
/// Path format: `{root}/{k0k1}/{k2k3}/{key}`
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = key.len() >= 4 && key.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(NoteStoreError::Attachment(format!(
                "invalid storage key '{}'",
                key
            )));
        }
        Ok(self.root.join(&key[0..2]).join(&key[2..4]).join(key))
    }
}

fn io_failure(op: &str, path: &Path, e: std::io::Error) -> NoteStoreError {
    NoteStoreError::Attachment(format!("{}({}): {}", op, path.display(), e))
}

impl BlobStorage for DiskStorage {
    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        debug!(key, path = %path.display(), size = data.len(), "blob_storage: write");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_failure("create_dir_all", parent, e))?;
        }

        // Temp file + rename so readers never see a partial blob
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| io_failure("create", &temp_path, e))?;
        file.write_all(data)
            .and_then(|_| file.sync_all())
            .map_err(|e| io_failure("write", &temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &path).map_err(|e| {
            warn!(from = %temp_path.display(), to = %path.display(), error = %e, "blob_storage: rename failed");
            io_failure("rename", &path, e)
        })
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| io_failure("read", &path, e))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        debug!(key, "blob_storage: delete");
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_failure("remove_file", &path, e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "0194f7e8b2a7c3d9e4f5a6b7c8d9e0f1";

    #[test]
    fn test_write_read_delete() {
        let tmp = TempDir::new().unwrap();
        let storage = DiskStorage::new(tmp.path());

        storage.write(KEY, b"hello").unwrap();
        assert!(storage.exists(KEY).unwrap());
        assert!(tmp.path().join("01").join("94").join(KEY).exists());
        assert_eq!(storage.read(KEY).unwrap(), b"hello");

        storage.delete(KEY).unwrap();
        assert!(!storage.exists(KEY).unwrap());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        let storage = DiskStorage::new(tmp.path());
        assert!(storage.delete(KEY).is_ok());
    }

    #[test]
    fn test_read_missing_is_attachment_error() {
        let tmp = TempDir::new().unwrap();
        let storage = DiskStorage::new(tmp.path());
        let err = storage.read(KEY).unwrap_err();
        assert!(matches!(err, NoteStoreError::Attachment(_)));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let tmp = TempDir::new().unwrap();
        let storage = DiskStorage::new(tmp.path());
        assert!(storage.write("../../etc/passwd", b"x").is_err());
        assert!(storage.write("ab", b"x").is_err());
    }
}
