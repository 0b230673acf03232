//! Kiln build system infrastructure
//!
//! Incremental builds for a tree of TypeScript sources:
//! - Build directives (`// @build ignore|bundle|simple`) select a strategy per file
//! - Local import resolution for bundled files
//! - A content ledger of SHA-256 digests from the last successful build
//! - Staleness classification against that ledger
//! - Compilation through an opaque compiler (esbuild by default)
//! - Incremental and full (clean) build modes

pub mod builder;
pub mod compiler;
pub mod directive;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod output;
pub mod paths;
pub mod resolver;
pub mod staleness;

// Re-export main types
pub use builder::{
    BuildConfig, BuildMode, BuildReport, BuildStats, Builder, FileOutcome, FileState, PlannedFile,
};
pub use compiler::{
    CompileFailure, CompileRequest, CompileTarget, Compiler, EsbuildCompiler, OutputFormat,
};
pub use directive::{classify, BuildKind, BuildStrategy};
pub use error::{BuildError, BuildResult};
pub use executor::{BuildArtifact, BuildExecutor};
pub use ledger::{ContentDigest, ContentLedger};
pub use output::{BuildProgress, OutputMode};
pub use resolver::{DependencyResolver, DependencySet};
pub use staleness::{Assessment, StaleReason, StalenessClassifier};
