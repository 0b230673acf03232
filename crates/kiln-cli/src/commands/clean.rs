//! Clean command - remove build outputs and the ledger

use super::build_setup;
use crate::ProjectArgs;
use anyhow::{Context, Result};
use kiln_build::{Builder, OutputMode};

pub fn run(project: &ProjectArgs, quiet: bool) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    let (config, compiler) = build_setup(project, &working_dir)?;

    let output_mode = if quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    Builder::new(config, compiler)
        .context("Failed to create builder")?
        .with_output_mode(output_mode)
        .clean()
        .context("Failed to clean build artifacts")
}
