/// Build system error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Compilation failed for module '{module}': {error}")]
    CompilationError { module: String, error: String },

    #[error("Build ledger at {path} is corrupt: {error}")]
    LedgerCorrupt { path: PathBuf, error: String },

    #[error("Failed to write build ledger at {path}: {error}")]
    LedgerWrite { path: PathBuf, error: String },

    #[error("Source directory not found: {0}")]
    SourceDirNotFound(PathBuf),

    #[error("Path {path} is not under source directory {source_dir}")]
    OutsideSourceDir { path: PathBuf, source_dir: PathBuf },

    #[error("Invalid build configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a compilation error
    pub fn compilation(module: impl Into<String>, error: impl ToString) -> Self {
        Self::CompilationError {
            module: module.into(),
            error: error.to_string(),
        }
    }

    /// Create a corrupt ledger error
    pub fn ledger_corrupt(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::LedgerCorrupt {
            path: path.into(),
            error: error.to_string(),
        }
    }
}
