//! Content ledger: last successfully built digest per source file
//!
//! The ledger is a JSON object mapping file keys to SHA-256 digests. It is
//! loaded once per run and saved after every successful rebuild, so an
//! interrupted run keeps whatever it finished.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fingerprint of a file's exact content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Digest of in-memory content
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Digest of a file's current content
    pub fn of_file(path: &Path) -> BuildResult<Self> {
        let content = fs::read(path).map_err(|e| BuildError::io(path, e))?;
        Ok(Self::of(&content))
    }

    /// Hex representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted mapping from file key to content digest
#[derive(Debug, Clone)]
pub struct ContentLedger {
    /// Location of the ledger file
    path: PathBuf,
    /// Digests keyed by project-relative file key
    entries: BTreeMap<String, ContentDigest>,
}

impl ContentLedger {
    /// Create an empty ledger backed by `path` (nothing is read or written)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the ledger at `path`.
    ///
    /// A missing file yields an empty ledger. A file that exists but does not
    /// parse is [`BuildError::LedgerCorrupt`].
    pub fn load(path: impl Into<PathBuf>) -> BuildResult<Self> {
        let path = path.into();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ledger found, starting empty");
                return Ok(Self::new(path));
            }
            Err(e) => return Err(BuildError::io(&path, e)),
        };

        let entries: BTreeMap<String, ContentDigest> = serde_json::from_str(&content)
            .map_err(|e| BuildError::ledger_corrupt(&path, e))?;

        debug!(path = %path.display(), entries = entries.len(), "loaded ledger");
        Ok(Self { path, entries })
    }

    /// Write the full mapping, replacing any previous ledger file
    pub fn save(&self) -> BuildResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            BuildError::LedgerWrite {
                path: self.path.clone(),
                error: e.to_string(),
            }
        })?;

        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, format!("{}\n", json)).map_err(|e| BuildError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| BuildError::io(&self.path, e))?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "saved ledger");
        Ok(())
    }

    /// Recorded digest for `key`
    pub fn get(&self, key: &str) -> Option<&ContentDigest> {
        self.entries.get(key)
    }

    /// Record the digest for `key`
    pub fn record(&mut self, key: impl Into<String>, digest: ContentDigest) {
        self.entries.insert(key.into(), digest);
    }

    /// Forget `key`, returning its digest if it was recorded
    pub fn remove(&mut self, key: &str) -> Option<ContentDigest> {
        self.entries.remove(key)
    }

    /// Whether `key` is recorded with exactly `digest`
    pub fn matches(&self, key: &str, digest: &ContentDigest) -> bool {
        self.entries.get(key) == Some(digest)
    }

    /// All entries in key order
    pub fn entries(&self) -> &BTreeMap<String, ContentDigest> {
        &self.entries
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of recorded files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
