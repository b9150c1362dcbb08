//! Uploaded files and their session-local identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for session-local file ids (`file_<millis>_<index>`)
pub const FILE_ID_PREFIX: &str = "file_";

/// Session-local identity of an uploaded file.
///
/// Two uploads with the same name (or even the same bytes) get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(String);

impl FileId {
    /// Id for the `index`-th file of a batch started at `batch_millis`.
    pub fn new(batch_millis: i64, index: usize) -> Self {
        Self(format!("{FILE_ID_PREFIX}{batch_millis}_{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A file as received from the user. Consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSubmission {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch
    pub last_modified: i64,
    pub bytes: Vec<u8>,
}

impl FileSubmission {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            media_type: media_type_for(&name).to_string(),
            size: bytes.len() as u64,
            last_modified: 0,
            name,
            bytes,
        }
    }

    /// Read a submission from disk, taking the declared metadata from the filesystem.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let meta = std::fs::metadata(path)?;
        let last_modified = meta
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            media_type: media_type_for(&name).to_string(),
            size: meta.len(),
            last_modified,
            name,
            bytes,
        })
    }
}

fn media_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_format() {
        assert_eq!(FileId::new(1733011200000, 2).as_str(), "file_1733011200000_2");
    }

    #[test]
    fn test_from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Statement Dec.PDF");
        std::fs::write(&path, b"%PDF-1.7 fake").unwrap();

        let sub = FileSubmission::from_path(&path).unwrap();
        assert_eq!(sub.name, "Statement Dec.PDF");
        assert_eq!(sub.media_type, "application/pdf");
        assert_eq!(sub.size, 13);
        assert_eq!(sub.bytes, b"%PDF-1.7 fake");
        assert!(sub.last_modified > 0);
    }

    #[test]
    fn test_unknown_extension() {
        let sub = FileSubmission::new("notes", vec![1, 2, 3]);
        assert_eq!(sub.media_type, "application/octet-stream");
        assert_eq!(sub.size, 3);
    }
}
