//! Lexical path helpers shared by the resolver, ledger and orchestrator

use std::path::{Component, Path, PathBuf};

/// Normalize a path without touching the filesystem.
///
/// Drops `.` components and folds `..` into the preceding normal component.
/// Leading `..` components that cannot be folded are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let folded = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if folded {
                    out.pop();
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Ledger key for a file: its path relative to `root`, `/`-separated.
///
/// Files outside `root` keep their full normalized path.
pub fn ledger_key(root: &Path, path: &Path) -> String {
    let normalized = normalize(path);
    let relative = normalized
        .strip_prefix(normalize(root))
        .unwrap_or(&normalized);

    relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}

/// Whether `path` ends with `.<extension>`
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(extension)
}
