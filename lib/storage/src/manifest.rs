// Build manifest: fingerprint and metadata of one artifact set
use crate::builder::BuildConfig;
use chrono::{DateTime, Utc};
use reelmatch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format: u32,
    pub created_at: DateTime<Utc>,
    pub config: BuildConfig,
    pub rows: usize,
    pub vocab_size: usize,
    /// SHA-256 over the vocabulary in column order.
    pub vocab_hash: String,
    pub skipped_empty: usize,
    pub duplicate_titles: usize,
    /// File name → SHA-256 of its bytes; filled in on save.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new(
        config: BuildConfig,
        rows: usize,
        vocabulary: &[String],
        skipped_empty: usize,
        duplicate_titles: usize,
    ) -> Self {
        Self {
            format: FORMAT_VERSION,
            created_at: Utc::now(),
            config,
            rows,
            vocab_size: vocabulary.len(),
            vocab_hash: vocab_hash(vocabulary),
            skipped_empty,
            duplicate_titles,
            files: BTreeMap::new(),
        }
    }

    /// Check a file's bytes against its recorded digest.
    pub fn verify_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let expected = self.files.get(name).ok_or_else(|| {
            Error::ArtifactInconsistent(format!("{} is not listed in the manifest", name))
        })?;
        let actual = sha256_hex(bytes);
        if *expected != actual {
            return Err(Error::ArtifactInconsistent(format!(
                "{}: checksum mismatch (expected {}, got {})",
                name, expected, actual
            )));
        }
        Ok(())
    }

    pub fn verify_vocabulary(&self, vocabulary: &[String]) -> Result<()> {
        if vocabulary.len() != self.vocab_size {
            return Err(Error::ArtifactInconsistent(format!(
                "vocabulary has {} terms, manifest says {}",
                vocabulary.len(),
                self.vocab_size
            )));
        }
        if vocab_hash(vocabulary) != self.vocab_hash {
            return Err(Error::ArtifactInconsistent(
                "vocabulary hash does not match the manifest".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn vocab_hash(vocabulary: &[String]) -> String {
    let mut hasher = Sha256::new();
    for term in vocabulary {
        hasher.update(term.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vec<String> {
        vec!["dark".to_string(), "monsters".to_string()]
    }

    #[test]
    fn test_vocab_hash_depends_on_order() {
        let mut reversed = vocab();
        reversed.reverse();
        assert_ne!(vocab_hash(&vocab()), vocab_hash(&reversed));
        assert_eq!(vocab_hash(&vocab()), vocab_hash(&vocab()));
    }

    #[test]
    fn test_verify_file() {
        let mut manifest = Manifest::new(BuildConfig::default(), 2, &vocab(), 0, 0);
        manifest.files.insert("titles.txt".to_string(), sha256_hex(b"Dark\nFriends\n"));

        assert!(manifest.verify_file("titles.txt", b"Dark\nFriends\n").is_ok());
        assert!(matches!(
            manifest.verify_file("titles.txt", b"Dark\n"),
            Err(Error::ArtifactInconsistent(_))
        ));
        assert!(matches!(
            manifest.verify_file("vectors.bin", b""),
            Err(Error::ArtifactInconsistent(_))
        ));
    }

    #[test]
    fn test_verify_vocabulary() {
        let manifest = Manifest::new(BuildConfig::default(), 2, &vocab(), 0, 0);
        assert!(manifest.verify_vocabulary(&vocab()).is_ok());
        assert!(manifest.verify_vocabulary(&["dark".to_string()]).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_config() {
        let manifest = Manifest::new(BuildConfig::default(), 2, &vocab(), 1, 0);
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let parsed: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(parsed.config.chunk_size, BuildConfig::default().chunk_size);
    }
}
