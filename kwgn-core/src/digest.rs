//! Content digests for duplicate-upload detection.
//!
//! File names come from the user and are never trusted as identity; a file
//! is identified by the SHA-256 of its bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::HashSet;

use crate::submission::FileSubmission;

/// Rejection shown when a submitted file's content was already seen.
pub const ERROR_DUPLICATE_HASH: &str =
    "Files with the same hashes already exist. Please remove the files with the same hashes.";

/// Lowercase hex SHA-256 of a file's content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 digest of `bytes`
pub fn digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest(hex::encode(hasher.finalize()))
}

pub fn is_duplicate(digest: &Digest, known: &HashSet<Digest>) -> bool {
    known.contains(digest)
}

/// Screening verdict for one file of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screened {
    Fresh(Digest),
    Duplicate(Digest),
}

impl Screened {
    pub fn digest(&self) -> &Digest {
        match self {
            Screened::Fresh(d) | Screened::Duplicate(d) => d,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Screened::Duplicate(_))
    }
}

/// Screen a batch against the session's known digests.
///
/// Verdicts are index-aligned with `files`. A digest accepted earlier in the
/// same batch counts as known for the files after it.
pub fn screen_batch(files: &[FileSubmission], known: &HashSet<Digest>) -> Vec<Screened> {
    let mut seen: HashSet<Digest> = HashSet::new();
    files
        .iter()
        .map(|file| {
            let d = digest(&file.bytes);
            if is_duplicate(&d, known) || seen.contains(&d) {
                Screened::Duplicate(d)
            } else {
                seen.insert(d.clone());
                Screened::Fresh(d)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_prefix() {
        let d = digest(b"statement");
        assert_eq!(d.short(), &d.as_str()[..12]);

        let tiny: Digest = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(tiny.short(), "abc");

        let wide: Digest = serde_json::from_str("\"aéééééé\"").unwrap();
        assert_eq!(wide.short(), wide.as_str());
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(digest(b"statement"), digest(b"statement"));
        assert_ne!(digest(b"statement"), digest(b"statement!"));
    }

    #[test]
    fn test_known_sha256_value() {
        assert_eq!(
            digest(b"hello world").as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_is_duplicate_iff_member() {
        let a = digest(b"a");
        let b = digest(b"b");
        let known: HashSet<Digest> = [a.clone()].into_iter().collect();
        assert!(is_duplicate(&a, &known));
        assert!(!is_duplicate(&b, &known));
        assert!(!is_duplicate(&a, &HashSet::new()));
    }

    #[test]
    fn test_screen_flags_repeat_within_batch() {
        let files = vec![
            FileSubmission::new("jan.pdf", b"same bytes".to_vec()),
            FileSubmission::new("jan-copy.pdf", b"same bytes".to_vec()),
            FileSubmission::new("feb.pdf", b"other bytes".to_vec()),
        ];
        let verdicts = screen_batch(&files, &HashSet::new());
        assert_eq!(verdicts.len(), 3);
        assert!(!verdicts[0].is_duplicate());
        assert!(verdicts[1].is_duplicate());
        assert!(!verdicts[2].is_duplicate());
        assert_eq!(verdicts[0].digest(), verdicts[1].digest());
    }

    #[test]
    fn test_screen_against_session_digests() {
        let files = vec![FileSubmission::new("renamed.pdf", b"seen before".to_vec())];
        let known: HashSet<Digest> = [digest(b"seen before")].into_iter().collect();
        let verdicts = screen_batch(&files, &known);
        assert_eq!(verdicts, vec![Screened::Duplicate(digest(b"seen before"))]);
    }
}
