//! Build execution: compile one file and stamp its artifact

use crate::compiler::{CompileRequest, CompileTarget, Compiler};
use crate::directive::BuildKind;
use crate::error::{BuildError, BuildResult};
use crate::paths::normalize;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Output of a successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildArtifact {
    /// Source file the artifact was built from
    pub source: PathBuf,
    /// Artifact location under the output root
    pub output_path: PathBuf,
    pub kind: BuildKind,
    /// Time spent in the compiler
    pub compile_time: Duration,
}

/// Prefix `text` with a single-line build timestamp comment
pub fn stamp(text: &str, built_at: DateTime<Local>) -> String {
    format!("// Built: {}\n{}", built_at.format("%Y-%m-%d %H:%M:%S"), text)
}

/// Maps sources to artifacts and drives the compiler
#[derive(Debug, Clone)]
pub struct BuildExecutor {
    source_dir: PathBuf,
    output_dir: PathBuf,
    source_extension: String,
    target_extension: String,
    target: CompileTarget,
}

impl BuildExecutor {
    pub fn new(
        source_dir: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        source_extension: impl Into<String>,
        target_extension: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: normalize(source_dir.as_ref()),
            output_dir: normalize(output_dir.as_ref()),
            source_extension: source_extension.into(),
            target_extension: target_extension.into(),
            target: CompileTarget::default(),
        }
    }

    /// Set platform and language level passed to the compiler
    pub fn with_target(mut self, target: CompileTarget) -> Self {
        self.target = target;
        self
    }

    /// Artifact path for `source`: the same relative location under the
    /// output root, with the source extension swapped for the target one.
    pub fn output_path(&self, source: &Path) -> BuildResult<PathBuf> {
        let normalized = normalize(source);
        let relative = normalized
            .strip_prefix(&self.source_dir)
            .map_err(|_| BuildError::OutsideSourceDir {
                path: source.to_path_buf(),
                source_dir: self.source_dir.clone(),
            })?;

        let mut output = self.output_dir.join(relative);
        if output.extension().and_then(|s| s.to_str()) == Some(self.source_extension.as_str()) {
            output.set_extension(&self.target_extension);
        }
        Ok(output)
    }

    /// Compile `source` and stamp the resulting artifact.
    ///
    /// A compiler diagnostic becomes [`BuildError::CompilationError`].
    pub fn build(
        &self,
        compiler: &dyn Compiler,
        source: &Path,
        kind: BuildKind,
    ) -> BuildResult<BuildArtifact> {
        let output_path = self.output_path(source)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }

        let request = CompileRequest::new(source, &output_path, kind, &self.target);
        let start = Instant::now();
        compiler
            .compile(&request)
            .map_err(|failure| BuildError::compilation(self.module_name(source), failure))?;
        let compile_time = start.elapsed();

        let text = fs::read_to_string(&output_path).map_err(|e| BuildError::io(&output_path, e))?;
        fs::write(&output_path, stamp(&text, Local::now()))
            .map_err(|e| BuildError::io(&output_path, e))?;

        debug!(
            source = %source.display(),
            output = %output_path.display(),
            %kind,
            ms = compile_time.as_millis() as u64,
            "built artifact"
        );

        Ok(BuildArtifact {
            source: source.to_path_buf(),
            output_path,
            kind,
            compile_time,
        })
    }

    /// Display name of a source relative to the source root
    fn module_name(&self, source: &Path) -> String {
        let normalized = normalize(source);
        normalized
            .strip_prefix(&self.source_dir)
            .unwrap_or(&normalized)
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/")
    }
}
