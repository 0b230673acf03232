use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Kiln incremental build orchestrator.
///
/// Compiles a tree of TypeScript sources into JavaScript artifacts with
/// esbuild, rebuilding only files whose content (or, for bundled files,
/// whose local imports) changed since the last successful build.
///
/// Each source file may carry one build directive:
///     // @build ignore    Never built
///     // @build bundle    Local imports inlined into one self-contained file
///     // @build simple    Compiled standalone (the default)
///
/// EXAMPLES:
///     kiln build                   Rebuild stale files
///     kiln build --full            Clean the output tree and rebuild everything
///     kiln status                  Show which files a build would rebuild
///     kiln clean                   Remove the output tree and the ledger
///
/// ENVIRONMENT VARIABLES:
///     KILN_JSON         Set to '1' for JSON output by default
///     KILN_ESBUILD      esbuild executable to invoke
///     KILN_SOURCE_DIR   Source directory
///     KILN_OUTPUT_DIR   Output directory
///     KILN_LEDGER       Ledger file
///     RUST_LOG          Diagnostic log filter (e.g. 'kiln_build=debug')
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Location overrides shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Source directory (overrides kiln.toml)
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,
    /// Output directory (overrides kiln.toml)
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Ledger file (overrides kiln.toml)
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,
    /// Use this kiln.toml instead of searching upwards
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    ///
    /// Rebuilds every source file that changed since the last successful
    /// build. The first compile failure stops the run; files built before
    /// it stay recorded in the ledger.
    ///
    /// EXAMPLES:
    ///     kiln build                  Incremental build
    ///     kiln build --full           Non-incremental build
    ///     kiln build --json           Machine-readable summary
    #[command(visible_alias = "b")]
    Build {
        /// Clean the output tree and rebuild every file
        #[arg(long)]
        full: bool,
        /// Verbose output with timing information
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Quiet output (errors only)
        #[arg(long, short = 'q')]
        quiet: bool,
        /// JSON output
        #[arg(long, env = "KILN_JSON", value_parser = clap::builder::FalseyValueParser::new())]
        json: bool,
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show which files the next build would rebuild
    ///
    /// EXAMPLES:
    ///     kiln status                 List every source file with its state
    ///     kiln status --json          Output as JSON
    #[command(visible_alias = "s")]
    Status {
        /// JSON output
        #[arg(long, env = "KILN_JSON", value_parser = clap::builder::FalseyValueParser::new())]
        json: bool,
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Remove the output tree and the ledger
    Clean {
        /// Quiet output (errors only)
        #[arg(long, short = 'q')]
        quiet: bool,
        #[command(flatten)]
        project: ProjectArgs,
    },
}

fn main() -> Result<()> {
    // Diagnostics go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            full,
            verbose,
            quiet,
            json,
            project,
        } => {
            let args = commands::build::BuildArgs {
                full,
                verbose,
                quiet,
                json,
                project,
            };
            commands::build::run(args)?;
        }
        Commands::Status { json, project } => {
            commands::status::run(&project, json)?;
        }
        Commands::Clean { quiet, project } => {
            commands::clean::run(&project, quiet)?;
        }
    }

    Ok(())
}
