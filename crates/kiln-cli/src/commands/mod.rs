pub mod build;
pub mod clean;
pub mod status;

use crate::ProjectArgs;
use anyhow::{Context, Result};
use kiln_build::{BuildConfig, CompileTarget, EsbuildCompiler};
use kiln_config::{Config, ConfigLoader};
use std::path::{Path, PathBuf};

/// Load kiln.toml (plus environment overrides) for the current directory
fn load_config(project: &ProjectArgs, working_dir: &Path) -> Result<Config> {
    let loader = ConfigLoader::new();
    let config = match &project.config {
        Some(path) => loader
            .load_from_file(&working_dir.join(path))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => loader
            .load_from_directory(working_dir)
            .context("Failed to load kiln.toml")?,
    };
    Ok(config)
}

/// Merge project configuration and command-line overrides into a build setup
///
/// Paths from kiln.toml are relative to the project root; paths given on the
/// command line are relative to the working directory.
pub fn build_setup(
    project: &ProjectArgs,
    working_dir: &Path,
) -> Result<(BuildConfig, EsbuildCompiler)> {
    let config = load_config(project, working_dir)?;
    let from_cli = |path: &Option<PathBuf>| path.as_ref().map(|p| working_dir.join(p));

    let build_config = BuildConfig {
        root: config.root().to_path_buf(),
        source_dir: from_cli(&project.source).unwrap_or_else(|| config.source_dir()),
        output_dir: from_cli(&project.output).unwrap_or_else(|| config.output_dir()),
        ledger_path: from_cli(&project.ledger).unwrap_or_else(|| config.ledger_path()),
        source_extension: config.source_extension(),
        target_extension: config.target_extension(),
        target: CompileTarget {
            platform: config.platform(),
            language: config.language_target(),
        },
        ..BuildConfig::default()
    };

    tracing::debug!(
        root = %build_config.root.display(),
        source = %build_config.source_root().display(),
        output = %build_config.output_root().display(),
        "resolved build configuration"
    );

    Ok((build_config, EsbuildCompiler::new(config.esbuild_program())))
}
