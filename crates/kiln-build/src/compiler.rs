//! The compile/bundle primitive
//!
//! Kiln treats the actual code transformation as a black box behind the
//! [`Compiler`] trait. The production implementation shells out to `esbuild`.

use crate::directive::BuildKind;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// Module format of the emitted artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Immediately-invoked function wrapper, self-contained
    Iife,
    /// CommonJS module, imports left as `require` calls
    Cjs,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iife => "iife",
            Self::Cjs => "cjs",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every compile request of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileTarget {
    /// Platform the output runs on
    pub platform: String,
    /// Language level of the output
    pub language: String,
}

impl Default for CompileTarget {
    fn default() -> Self {
        Self {
            platform: "browser".to_string(),
            language: "es6".to_string(),
        }
    }
}

/// A single invocation of the compile primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Entry source file
    pub entry: PathBuf,
    /// Inline every resolved import into the output
    pub bundle: bool,
    pub format: OutputFormat,
    pub platform: String,
    /// Language level of the output (e.g. `es6`)
    pub target: String,
    /// Where the artifact is written
    pub outfile: PathBuf,
}

impl CompileRequest {
    /// Request for building `entry` with the given kind.
    ///
    /// Bundled files become self-contained IIFEs; isolated files become
    /// CommonJS modules with their imports left external.
    pub fn new(
        entry: impl Into<PathBuf>,
        outfile: impl Into<PathBuf>,
        kind: BuildKind,
        target: &CompileTarget,
    ) -> Self {
        let (bundle, format) = match kind {
            BuildKind::Bundled => (true, OutputFormat::Iife),
            BuildKind::Isolated => (false, OutputFormat::Cjs),
        };
        Self {
            entry: entry.into(),
            bundle,
            format,
            platform: target.platform.clone(),
            target: target.language.clone(),
            outfile: outfile.into(),
        }
    }
}

/// Diagnostic reported by the compile primitive
#[derive(Debug, Clone, Error)]
#[error("{diagnostic}")]
pub struct CompileFailure {
    pub diagnostic: String,
}

impl CompileFailure {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }
}

/// Compile/bundle primitive.
///
/// On success the artifact text must exist at `request.outfile`.
pub trait Compiler {
    fn compile(&self, request: &CompileRequest) -> Result<(), CompileFailure>;
}

impl<C: Compiler + ?Sized> Compiler for Rc<C> {
    fn compile(&self, request: &CompileRequest) -> Result<(), CompileFailure> {
        (**self).compile(request)
    }
}

/// Runs the `esbuild` executable
#[derive(Debug, Clone)]
pub struct EsbuildCompiler {
    program: PathBuf,
}

impl EsbuildCompiler {
    /// Use the given esbuild executable (a bare name is looked up on `PATH`)
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this compiler invokes
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for a request
    pub fn arguments(request: &CompileRequest) -> Vec<String> {
        let mut args = vec![request.entry.to_string_lossy().into_owned()];
        if request.bundle {
            args.push("--bundle".to_string());
        }
        args.push(format!("--format={}", request.format));
        args.push(format!("--platform={}", request.platform));
        args.push(format!("--target={}", request.target));
        args.push(format!("--outfile={}", request.outfile.display()));
        args.push("--log-level=error".to_string());
        args
    }
}

impl Default for EsbuildCompiler {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

impl Compiler for EsbuildCompiler {
    fn compile(&self, request: &CompileRequest) -> Result<(), CompileFailure> {
        let args = Self::arguments(request);
        debug!(program = %self.program.display(), ?args, "invoking esbuild");

        let output = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CompileFailure::new(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?
            .wait_with_output()
            .map_err(|e| CompileFailure::new(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let diagnostic = if stderr.is_empty() {
            format!(
                "{} exited with status {}",
                self.program.display(),
                output.status.code().unwrap_or(1)
            )
        } else {
            stderr
        };
        Err(CompileFailure::new(diagnostic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bundled_request() {
        let request = CompileRequest::new(
            "src/a.ts",
            "dist/a.js",
            BuildKind::Bundled,
            &CompileTarget::default(),
        );
        assert!(request.bundle);
        assert_eq!(request.format, OutputFormat::Iife);
        assert_eq!(request.platform, "browser");
        assert_eq!(request.target, "es6");
    }

    #[test]
    fn test_isolated_request() {
        let request = CompileRequest::new(
            "src/a.ts",
            "dist/a.js",
            BuildKind::Isolated,
            &CompileTarget::default(),
        );
        assert!(!request.bundle);
        assert_eq!(request.format, OutputFormat::Cjs);
    }

    #[test]
    fn test_esbuild_arguments_bundled() {
        let request = CompileRequest::new(
            "src/a.ts",
            "dist/a.js",
            BuildKind::Bundled,
            &CompileTarget::default(),
        );
        assert_eq!(
            EsbuildCompiler::arguments(&request),
            vec![
                "src/a.ts",
                "--bundle",
                "--format=iife",
                "--platform=browser",
                "--target=es6",
                "--outfile=dist/a.js",
                "--log-level=error",
            ]
        );
    }

    #[test]
    fn test_esbuild_arguments_isolated_has_no_bundle_flag() {
        let request = CompileRequest::new(
            "src/a.ts",
            "dist/a.js",
            BuildKind::Isolated,
            &CompileTarget::default(),
        );
        let args = EsbuildCompiler::arguments(&request);
        assert!(!args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--format=cjs".to_string()));
    }

    #[test]
    fn test_missing_executable_is_failure() {
        let compiler = EsbuildCompiler::new("kiln-test-no-such-esbuild");
        let request = CompileRequest::new(
            "src/a.ts",
            "dist/a.js",
            BuildKind::Isolated,
            &CompileTarget::default(),
        );
        let err = compiler.compile(&request).unwrap_err();
        assert!(err.diagnostic.contains("failed to run"));
    }
}
