//! Staleness classification against the content ledger

use crate::directive::BuildKind;
use crate::error::BuildResult;
use crate::ledger::{ContentDigest, ContentLedger};
use crate::paths::ledger_key;
use crate::resolver::DependencyResolver;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a file needs rebuilding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// The file has never been built
    NotInLedger,
    /// The file's own content changed since its last build
    SourceChanged,
    /// A bundled dependency changed or was never recorded
    DependencyChanged(String),
    /// Full rebuild requested
    Forced,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInLedger => write!(f, "not built yet"),
            Self::SourceChanged => write!(f, "source changed"),
            Self::DependencyChanged(dep) => write!(f, "dependency {} changed", dep),
            Self::Forced => write!(f, "full rebuild"),
        }
    }
}

/// Current digests of a file and, for bundled files, its dependencies
#[derive(Debug, Clone)]
pub struct Assessment {
    /// Ledger key of the file
    pub key: String,
    /// Current digest of the file
    pub digest: ContentDigest,
    /// Ledger key, path and current digest of every transitive dependency.
    /// Always empty for isolated files.
    pub dependencies: Vec<(String, PathBuf, ContentDigest)>,
    /// `None` when the file is up to date
    pub reason: Option<StaleReason>,
}

impl Assessment {
    /// Whether the file must be rebuilt
    pub fn is_stale(&self) -> bool {
        self.reason.is_some()
    }

    /// Ledger entries to record once the file builds successfully
    pub fn ledger_entries(&self) -> impl Iterator<Item = (&str, &ContentDigest)> {
        std::iter::once((self.key.as_str(), &self.digest)).chain(
            self.dependencies
                .iter()
                .map(|(key, _, digest)| (key.as_str(), digest)),
        )
    }
}

/// Decides whether files need rebuilding
#[derive(Debug, Clone)]
pub struct StalenessClassifier {
    /// Project root that ledger keys are relative to
    root: PathBuf,
    resolver: DependencyResolver,
}

impl StalenessClassifier {
    pub fn new(root: impl Into<PathBuf>, resolver: DependencyResolver) -> Self {
        Self {
            root: root.into(),
            resolver,
        }
    }

    /// Compare `file` (and, when bundled, its dependency closure) against
    /// the ledger.
    ///
    /// Isolated files only look at their own digest. Bundled files also
    /// resolve their dependencies so the digests that will be recorded after
    /// a rebuild are the ones observed here.
    pub fn assess(
        &self,
        file: &Path,
        kind: BuildKind,
        ledger: &ContentLedger,
    ) -> BuildResult<Assessment> {
        let key = ledger_key(&self.root, file);
        let digest = ContentDigest::of_file(file)?;

        let mut reason = match ledger.get(&key) {
            None => Some(StaleReason::NotInLedger),
            Some(recorded) if *recorded != digest => Some(StaleReason::SourceChanged),
            Some(_) => None,
        };

        let mut dependencies = Vec::new();
        if kind == BuildKind::Bundled {
            for path in self.resolver.resolve_dependencies(file)? {
                let dep_key = ledger_key(&self.root, &path);
                let dep_digest = ContentDigest::of_file(&path)?;
                if reason.is_none() && !ledger.matches(&dep_key, &dep_digest) {
                    reason = Some(StaleReason::DependencyChanged(dep_key.clone()));
                }
                dependencies.push((dep_key, path, dep_digest));
            }
        }

        Ok(Assessment {
            key,
            digest,
            dependencies,
            reason,
        })
    }

    /// Whether `file` needs rebuilding
    pub fn is_stale(
        &self,
        file: &Path,
        kind: BuildKind,
        ledger: &ContentLedger,
    ) -> BuildResult<bool> {
        Ok(self.assess(file, kind, ledger)?.is_stale())
    }
}
