//! Local import resolution
//!
//! Discovers the transitive set of local source files a file statically
//! imports. Only relative specifiers (`./` or `../`) are followed; anything
//! else (packages, URLs, aliases) is outside the tracked tree and ignored.

use crate::error::{BuildError, BuildResult};
use crate::paths::normalize;
use regex::Regex;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Transitive local dependencies of a file, deduplicated
pub type DependencySet = BTreeSet<PathBuf>;

/// Matches `import … from "x"`, `import "x"` and `export … from "x"`
fn import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\b(?:import|export)\s+(?:[^'";]*?\bfrom\s*)?['"]([^'"\r\n]+)['"]"#)
            .expect("import pattern is valid")
    })
}

/// Resolves relative imports to files on disk
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    /// Extension appended when a specifier does not name an existing file
    source_extension: String,
}

impl DependencyResolver {
    /// Create a resolver that infers `.<source_extension>` on bare specifiers
    pub fn new(source_extension: impl Into<String>) -> Self {
        Self {
            source_extension: source_extension.into(),
        }
    }

    /// All module specifiers statically imported by `text`, in source order
    pub fn import_specifiers(text: &str) -> Vec<&str> {
        import_pattern()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Resolve a single specifier imported from `importer`.
    ///
    /// Returns `None` for non-relative specifiers and for relative ones that
    /// name no existing file, with or without the inferred extension.
    pub fn resolve_specifier(&self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        if !(specifier.starts_with("./") || specifier.starts_with("../")) {
            return None;
        }

        let base = importer.parent().unwrap_or_else(|| Path::new(""));
        let candidate = normalize(&base.join(specifier));
        if candidate.is_file() {
            return Some(candidate);
        }

        let mut with_extension = OsString::from(candidate.as_os_str());
        with_extension.push(".");
        with_extension.push(&self.source_extension);
        let with_extension = PathBuf::from(with_extension);
        if with_extension.is_file() {
            return Some(with_extension);
        }

        trace!(
            importer = %importer.display(),
            specifier,
            "dropping unresolved import"
        );
        None
    }

    /// Direct local dependencies of `file` given its text
    pub fn direct_dependencies(&self, file: &Path, text: &str) -> Vec<PathBuf> {
        Self::import_specifiers(text)
            .into_iter()
            .filter_map(|specifier| self.resolve_specifier(file, specifier))
            .collect()
    }

    /// Transitive closure of local imports reachable from `file`.
    ///
    /// `file` itself is never part of the result, even when an import cycle
    /// leads back to it. Each file is read at most once.
    pub fn resolve_dependencies(&self, file: &Path) -> BuildResult<DependencySet> {
        let root = normalize(file);
        let mut visited = BTreeSet::from([root.clone()]);
        let mut dependencies = DependencySet::new();
        let mut worklist = vec![root.clone()];

        while let Some(current) = worklist.pop() {
            let text = match fs::read_to_string(&current) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound && current != root => {
                    debug!(path = %current.display(), "dependency vanished during resolution");
                    dependencies.remove(&current);
                    continue;
                }
                Err(e) => return Err(BuildError::io(&current, e)),
            };

            for dependency in self.direct_dependencies(&current, &text) {
                if visited.insert(dependency.clone()) {
                    trace!(
                        from = %current.display(),
                        to = %dependency.display(),
                        "import edge"
                    );
                    dependencies.insert(dependency.clone());
                    worklist.push(dependency);
                }
            }
        }

        debug!(
            file = %root.display(),
            count = dependencies.len(),
            "resolved dependencies"
        );
        Ok(dependencies)
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new("ts")
    }
}
