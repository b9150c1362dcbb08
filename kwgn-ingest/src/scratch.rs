//! Scoped on-disk copies of uploaded files for the engine to read.
//!
//! A [`ScratchFile`] is removed when it goes out of scope, whatever happened
//! in between. Removal failures are logged and otherwise ignored.

use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use tempfile::NamedTempFile;
use tracing::warn;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.-]").expect("valid filename regex"));

/// Replace anything outside `[\w\s.-]` so user-supplied names are safe on disk.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

#[derive(Debug)]
pub struct ScratchFile {
    file: Option<NamedTempFile>,
}

impl ScratchFile {
    /// Write `bytes` to a fresh temp file in `dir` (system temp dir when `None`).
    ///
    /// The sanitized original name is kept as a suffix so the extension survives.
    pub fn create(dir: Option<&Path>, name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let suffix = format!("_{}", sanitize_filename(name));
        let mut builder = tempfile::Builder::new();
        builder.prefix("kwgn_").suffix(&suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file: Some(file) })
    }

    pub fn path(&self) -> &Path {
        match &self.file {
            Some(f) => f.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                warn!(path = %path.display(), "failed to remove scratch file: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Dec 2024.pdf"), "Dec 2024.pdf");
        assert_eq!(sanitize_filename("a;rm -rf $(x).pdf"), "a_rm -rf __x_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::create(Some(dir.path()), "dec.pdf", b"%PDF").unwrap();
        let path = scratch.path().to_path_buf();

        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("_dec.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");

        drop(scratch);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(ScratchFile::create(Some(&missing), "a.pdf", b"x").is_err());
    }
}
