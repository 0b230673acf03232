//! Kiln Configuration System
//!
//! Loads the project configuration (`kiln.toml`) and merges it with
//! environment overrides.
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Project config (`./kiln.toml`, searched upwards from the start directory)
//! 3. Environment variables (`KILN_*`)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use kiln_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("building {}", config.source_dir().display());
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// File name of the project configuration
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader};
pub use project::{BuildSection, CompilerSection, ProjectConfig};
