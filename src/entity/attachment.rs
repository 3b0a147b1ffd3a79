use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Metadata for the single file attached to a note.
///
/// The bytes themselves live in blob storage under `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub key: String,
    pub filename: String,
    pub content_type: String,
    pub byte_size: u64,
    /// SHA-256 of the stored bytes, hex encoded
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Build the record for an upload about to be written under a fresh key.
    pub fn for_upload(upload: &FileUpload) -> Self {
        Self {
            key: Uuid::new_v4().simple().to_string(),
            filename: upload.filename.clone(),
            content_type: upload.content_type.clone(),
            byte_size: upload.data.len() as u64,
            checksum: compute_checksum(&upload.data),
            created_at: Utc::now(),
        }
    }
}

/// A file handed to the store for attaching.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Upload with the content type guessed from the filename extension.
    pub fn guess(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename).to_string();
        Self {
            filename,
            content_type,
            data,
        }
    }
}

pub fn compute_checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
