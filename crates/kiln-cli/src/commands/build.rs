//! Build command - incremental or full rebuild of the source tree

use super::build_setup;
use crate::ProjectArgs;
use anyhow::{Context, Result};
use kiln_build::{BuildMode, BuildReport, Builder, FileState, OutputMode};
use std::path::Path;

/// Build command arguments
#[derive(Default)]
pub struct BuildArgs {
    /// Clean the output tree and rebuild every file
    pub full: bool,
    /// Verbose output
    pub verbose: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
    /// JSON output
    pub json: bool,
    /// Location overrides
    pub project: ProjectArgs,
}

/// Run the build command
pub fn run(args: BuildArgs) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    let report = execute(&args, &working_dir)?;

    if args.json {
        println!("{}", report_json(&report));
    }

    Ok(())
}

/// Build the project rooted at (or above) `working_dir`
fn execute(args: &BuildArgs, working_dir: &Path) -> Result<BuildReport> {
    let (config, compiler) = build_setup(&args.project, working_dir)?;

    let mut builder = Builder::new(config, compiler)
        .context("Failed to create builder")?
        .with_mode(determine_mode(args))
        .with_output_mode(determine_output_mode(args));

    builder.build().context("Build failed")
}

/// Determine build mode from arguments
fn determine_mode(args: &BuildArgs) -> BuildMode {
    if args.full {
        BuildMode::Full
    } else {
        BuildMode::Incremental
    }
}

/// Determine output mode from arguments
fn determine_output_mode(args: &BuildArgs) -> OutputMode {
    if args.json || args.quiet {
        OutputMode::Quiet
    } else if args.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    }
}

fn report_json(report: &BuildReport) -> serde_json::Value {
    let files: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let mut file = serde_json::json!({
                "file": outcome.key,
                "strategy": outcome.strategy.to_string(),
            });
            match &outcome.state {
                FileState::Ignored => file["status"] = "ignored".into(),
                FileState::Unchanged => file["status"] = "unchanged".into(),
                FileState::Built { reason, artifact } => {
                    file["status"] = "built".into();
                    file["reason"] = reason.to_string().into();
                    file["output"] = artifact.output_path.display().to_string().into();
                }
            }
            file
        })
        .collect();

    serde_json::json!({
        "success": true,
        "mode": match report.mode {
            BuildMode::Incremental => "incremental",
            BuildMode::Full => "full",
        },
        "total_time": report.stats.total_time.as_secs_f64(),
        "compilation_time": report.stats.compilation_time.as_secs_f64(),
        "discovered": report.stats.discovered,
        "built": report.stats.built,
        "unchanged": report.stats.unchanged,
        "ignored": report.stats.ignored,
        "files": files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_mode_default() {
        let args = BuildArgs::default();
        assert_eq!(determine_mode(&args), BuildMode::Incremental);
    }

    #[test]
    fn test_determine_mode_full() {
        let args = BuildArgs {
            full: true,
            ..Default::default()
        };
        assert_eq!(determine_mode(&args), BuildMode::Full);
    }

    #[test]
    fn test_determine_output_mode_default() {
        let args = BuildArgs::default();
        assert_eq!(determine_output_mode(&args), OutputMode::Normal);
    }

    #[test]
    fn test_determine_output_mode_verbose() {
        let args = BuildArgs {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(determine_output_mode(&args), OutputMode::Verbose);
    }

    #[test]
    fn test_determine_output_mode_quiet() {
        let args = BuildArgs {
            quiet: true,
            verbose: true,
            ..Default::default()
        };
        assert_eq!(determine_output_mode(&args), OutputMode::Quiet);
    }

    #[test]
    fn test_json_silences_progress() {
        let args = BuildArgs {
            json: true,
            ..Default::default()
        };
        assert_eq!(determine_output_mode(&args), OutputMode::Quiet);
    }

    #[test]
    fn test_report_json_empty_build() {
        let report = BuildReport {
            mode: BuildMode::Full,
            outcomes: Vec::new(),
            stats: Default::default(),
        };
        let json = report_json(&report);
        assert_eq!(json["mode"], "full");
        assert_eq!(json["built"], 0);
        assert_eq!(json["files"].as_array().map(Vec::len), Some(0));
    }
}
