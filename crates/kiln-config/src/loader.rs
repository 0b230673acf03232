//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::project::ProjectConfig;
use crate::{ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Project config (./kiln.toml) - overrides defaults
/// 2. Environment variables (KILN_*) - overrides project
/// 3. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip `KILN_*` environment overrides
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Project root directory (where kiln.toml was found)
    pub project_root: Option<PathBuf>,

    /// Directory the search started from
    pub working_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not apply `KILN_*` environment overrides
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find kiln.toml. Without one, defaults
    /// apply and the start directory acts as the project root.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            project_root,
            working_dir: start_dir.to_path_buf(),
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| {
            if p.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                p.to_path_buf()
            }
        });

        Ok(Config {
            project: project_config,
            working_dir: project_root.clone().unwrap_or_else(|| PathBuf::from(".")),
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config)
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            // Try parent directory
            match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    current = parent.to_path_buf()
                }
                _ => {
                    // Reached filesystem root without finding kiln.toml
                    return Ok((None, ProjectConfig::default()));
                }
            }
        }
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognised variables: KILN_SOURCE_DIR, KILN_OUTPUT_DIR, KILN_LEDGER,
    /// KILN_ESBUILD.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(source) = var("KILN_SOURCE_DIR") {
            config.build.get_or_insert_with(Default::default).source = Some(source.into());
        }
        if let Some(output) = var("KILN_OUTPUT_DIR") {
            config.build.get_or_insert_with(Default::default).output = Some(output.into());
        }
        if let Some(ledger) = var("KILN_LEDGER") {
            config.build.get_or_insert_with(Default::default).ledger = Some(ledger.into());
        }
        if let Some(program) = var("KILN_ESBUILD") {
            config.compiler.get_or_insert_with(Default::default).program = Some(program.into());
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has kiln.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Directory that relative paths are resolved against
    pub fn root(&self) -> &Path {
        self.project_root().unwrap_or(&self.working_dir)
    }

    /// Source directory, relative to [`Config::root`] unless absolute
    pub fn source_dir(&self) -> PathBuf {
        self.project
            .build()
            .source
            .unwrap_or_else(|| PathBuf::from("src"))
    }

    /// Output directory, relative to [`Config::root`] unless absolute
    pub fn output_dir(&self) -> PathBuf {
        self.project
            .build()
            .output
            .unwrap_or_else(|| PathBuf::from("dist"))
    }

    /// Ledger file, relative to [`Config::root`] unless absolute
    pub fn ledger_path(&self) -> PathBuf {
        self.project
            .build()
            .ledger
            .unwrap_or_else(|| PathBuf::from(".build-cache.json"))
    }

    pub fn source_extension(&self) -> String {
        self.project
            .build()
            .source_extension
            .unwrap_or_else(|| "ts".to_string())
    }

    pub fn target_extension(&self) -> String {
        self.project
            .build()
            .target_extension
            .unwrap_or_else(|| "js".to_string())
    }

    /// esbuild executable
    pub fn esbuild_program(&self) -> PathBuf {
        self.project
            .compiler()
            .program
            .unwrap_or_else(|| PathBuf::from("esbuild"))
    }

    /// Output language level
    pub fn language_target(&self) -> String {
        self.project
            .compiler()
            .target
            .unwrap_or_else(|| "es6".to_string())
    }

    /// Output platform
    pub fn platform(&self) -> String {
        self.project
            .compiler()
            .platform
            .unwrap_or_else(|| "browser".to_string())
    }
}
