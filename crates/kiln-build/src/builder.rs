//! Build orchestration
//!
//! Walks the source tree, reads each file's build directive, checks it
//! against the content ledger and rebuilds what is stale. The ledger is saved
//! after every successful rebuild; the first failure aborts the run.

use crate::compiler::{CompileTarget, Compiler};
use crate::directive::{self, BuildStrategy};
use crate::error::{BuildError, BuildResult};
use crate::executor::{BuildArtifact, BuildExecutor};
use crate::ledger::ContentLedger;
use crate::output::{BuildProgress, OutputMode};
use crate::paths::{has_extension, ledger_key, normalize};
use crate::resolver::DependencyResolver;
use crate::staleness::{Assessment, StaleReason, StalenessClassifier};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Whether a build reuses previous results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Rebuild only stale files
    #[default]
    Incremental,
    /// Clean the output tree and rebuild every non-ignored file
    Full,
}

/// Build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; relative directories below are resolved against it
    pub root: PathBuf,
    /// Source tree
    pub source_dir: PathBuf,
    /// Output tree
    pub output_dir: PathBuf,
    /// Ledger file
    pub ledger_path: PathBuf,
    /// Extension of candidate source files (without the dot)
    pub source_extension: String,
    /// Extension of emitted artifacts (without the dot)
    pub target_extension: String,
    /// Platform and language level handed to the compiler
    pub target: CompileTarget,
    pub mode: BuildMode,
    pub output_mode: OutputMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("dist"),
            ledger_path: PathBuf::from(".build-cache.json"),
            source_extension: "ts".to_string(),
            target_extension: "js".to_string(),
            target: CompileTarget::default(),
            mode: BuildMode::Incremental,
            output_mode: OutputMode::Normal,
        }
    }
}

impl BuildConfig {
    /// Configuration rooted at `root` with default layout
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        normalize(&self.root.join(path))
    }

    /// Source tree location
    pub fn source_root(&self) -> PathBuf {
        self.resolve(&self.source_dir)
    }

    /// Output tree location
    pub fn output_root(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    /// Ledger file location
    pub fn ledger_file(&self) -> PathBuf {
        self.resolve(&self.ledger_path)
    }

    /// Check the configuration for contradictions
    pub fn validate(&self) -> BuildResult<()> {
        if self.source_extension.is_empty() || self.target_extension.is_empty() {
            return Err(BuildError::InvalidConfig(
                "source and target extensions must not be empty".to_string(),
            ));
        }
        // Full builds and clean remove the output root recursively, so it
        // must be disjoint from the sources and must not enclose the project.
        let source_root = self.source_root();
        let output_root = self.output_root();
        if source_root.starts_with(&output_root) {
            return Err(BuildError::InvalidConfig(format!(
                "output directory {} must not contain the source directory {}",
                output_root.display(),
                source_root.display()
            )));
        }
        if output_root.starts_with(&source_root) {
            return Err(BuildError::InvalidConfig(format!(
                "output directory {} must not be inside the source directory {}",
                output_root.display(),
                source_root.display()
            )));
        }
        if normalize(&self.root).starts_with(&output_root) {
            return Err(BuildError::InvalidConfig(format!(
                "output directory {} must not contain the project root",
                output_root.display()
            )));
        }
        Ok(())
    }
}

/// Terminal state of a file in a build
#[derive(Debug, Clone, PartialEq)]
pub enum FileState {
    /// Marked `@build ignore`
    Ignored,
    /// Up to date with the ledger
    Unchanged,
    /// Rebuilt for the given reason
    Built {
        reason: StaleReason,
        artifact: BuildArtifact,
    },
}

/// What happened to one source file
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    /// Ledger key (project-relative path)
    pub key: String,
    pub path: PathBuf,
    pub strategy: BuildStrategy,
    pub state: FileState,
}

/// Result of a status check for one file
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub key: String,
    pub path: PathBuf,
    pub strategy: BuildStrategy,
    /// `None` when ignored or up to date
    pub reason: Option<StaleReason>,
}

impl PlannedFile {
    /// Short status label
    pub fn status(&self) -> &'static str {
        match (&self.strategy, &self.reason) {
            (BuildStrategy::Ignore, _) => "ignored",
            (_, None) => "unchanged",
            (_, Some(_)) => "stale",
        }
    }
}

/// Build statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    /// Source files found
    pub discovered: usize,
    pub ignored: usize,
    pub unchanged: usize,
    pub built: usize,
    /// Total build time
    pub total_time: Duration,
    /// Time spent compiling
    pub compilation_time: Duration,
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub outcomes: Vec<FileOutcome>,
    pub stats: BuildStats,
}

impl BuildReport {
    /// Outcome for a ledger key
    pub fn outcome(&self, key: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    /// Artifacts produced by this run
    pub fn artifacts(&self) -> impl Iterator<Item = &BuildArtifact> {
        self.outcomes.iter().filter_map(|o| match &o.state {
            FileState::Built { artifact, .. } => Some(artifact),
            _ => None,
        })
    }
}

/// Main builder for orchestrating builds
pub struct Builder {
    config: BuildConfig,
    compiler: Box<dyn Compiler>,
    classifier: StalenessClassifier,
    executor: BuildExecutor,
    progress: BuildProgress,
}

impl Builder {
    /// Create a builder for `config` that compiles with `compiler`
    pub fn new(config: BuildConfig, compiler: impl Compiler + 'static) -> BuildResult<Self> {
        config.validate()?;

        let root = normalize(&config.root);
        let resolver = DependencyResolver::new(config.source_extension.as_str());
        let classifier = StalenessClassifier::new(root, resolver);
        let executor = BuildExecutor::new(
            config.source_root(),
            config.output_root(),
            config.source_extension.as_str(),
            config.target_extension.as_str(),
        )
        .with_target(config.target.clone());
        let progress = BuildProgress::new(config.output_mode);

        Ok(Self {
            config,
            compiler: Box::new(compiler),
            classifier,
            executor,
            progress,
        })
    }

    /// Set build mode
    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set progress output mode
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self.progress = BuildProgress::new(mode);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// All candidate source files, sorted by path
    pub fn discover_source_files(&self) -> BuildResult<Vec<PathBuf>> {
        let src_dir = self.config.source_root();

        if !src_dir.is_dir() {
            return Err(BuildError::SourceDirNotFound(src_dir));
        }

        let mut source_files = Vec::new();

        for entry in WalkDir::new(&src_dir).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&src_dir).to_path_buf();
                BuildError::io(path, e.into())
            })?;
            if entry.file_type().is_file()
                && has_extension(entry.path(), &self.config.source_extension)
            {
                source_files.push(normalize(entry.path()));
            }
        }

        source_files.sort();
        Ok(source_files)
    }

    fn key(&self, path: &Path) -> String {
        ledger_key(&normalize(&self.config.root), path)
    }

    /// Strategy declared by a file
    fn read_strategy(path: &Path) -> BuildResult<BuildStrategy> {
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Ok(directive::classify(&text))
    }

    /// Classify every source file without building anything
    pub fn plan(&self) -> BuildResult<Vec<PlannedFile>> {
        let ledger = match self.config.mode {
            BuildMode::Incremental => ContentLedger::load(self.config.ledger_file())?,
            BuildMode::Full => ContentLedger::new(self.config.ledger_file()),
        };

        self.discover_source_files()?
            .into_iter()
            .map(|path| {
                let key = self.key(&path);
                let strategy = Self::read_strategy(&path)?;
                let reason = match (strategy.kind(), self.config.mode) {
                    (None, _) => None,
                    (Some(_), BuildMode::Full) => Some(StaleReason::Forced),
                    (Some(kind), BuildMode::Incremental) => {
                        self.classifier.assess(&path, kind, &ledger)?.reason
                    }
                };
                Ok(PlannedFile {
                    key,
                    path,
                    strategy,
                    reason,
                })
            })
            .collect()
    }

    /// Execute the build
    pub fn build(&mut self) -> BuildResult<BuildReport> {
        let build_start = Instant::now();
        let mode = self.config.mode;
        let output_root = self.config.output_root();
        let source_files = self.discover_source_files()?;

        let mut ledger = match mode {
            BuildMode::Incremental => ContentLedger::load(self.config.ledger_file())?,
            BuildMode::Full => {
                if output_root.exists() {
                    fs::remove_dir_all(&output_root)
                        .map_err(|e| BuildError::io(&output_root, e))?;
                    self.progress.cleaned(&output_root);
                }
                // Nothing is built after a clean, so start from an empty record
                let ledger = ContentLedger::new(self.config.ledger_file());
                ledger.save()?;
                ledger
            }
        };
        fs::create_dir_all(&output_root).map_err(|e| BuildError::io(&output_root, e))?;

        info!(
            files = source_files.len(),
            ?mode,
            source = %self.config.source_root().display(),
            "starting build"
        );

        let mut stats = BuildStats {
            discovered: source_files.len(),
            ..BuildStats::default()
        };
        let mut outcomes = Vec::with_capacity(source_files.len());

        // Classify against the ledger as loaded so a bundled rebuild that
        // records a dependency's digest cannot hide that dependency's own
        // pending rebuild later in the same run.
        let snapshot = ledger.clone();

        for path in source_files {
            let outcome = self.process_file(path, &snapshot, &mut ledger)?;
            match &outcome.state {
                FileState::Ignored => stats.ignored += 1,
                FileState::Unchanged => stats.unchanged += 1,
                FileState::Built { artifact, .. } => {
                    stats.built += 1;
                    stats.compilation_time += artifact.compile_time;
                }
            }
            outcomes.push(outcome);
        }

        stats.total_time = build_start.elapsed();
        self.progress
            .summary(stats.built, stats.unchanged, stats.ignored, stats.total_time);

        Ok(BuildReport {
            mode,
            outcomes,
            stats,
        })
    }

    /// Drive one file from discovery to a terminal state
    fn process_file(
        &self,
        path: PathBuf,
        snapshot: &ContentLedger,
        ledger: &mut ContentLedger,
    ) -> BuildResult<FileOutcome> {
        let key = self.key(&path);
        let strategy = Self::read_strategy(&path)?;

        let Some(kind) = strategy.kind() else {
            self.progress.ignored(&key);
            return Ok(FileOutcome {
                key,
                path,
                strategy,
                state: FileState::Ignored,
            });
        };

        let assessment = self.classifier.assess(&path, kind, snapshot)?;
        let reason = match (self.config.mode, &assessment.reason) {
            (BuildMode::Full, _) => StaleReason::Forced,
            (BuildMode::Incremental, Some(reason)) => reason.clone(),
            (BuildMode::Incremental, None) => {
                self.progress.unchanged(&key);
                return Ok(FileOutcome {
                    key,
                    path,
                    strategy,
                    state: FileState::Unchanged,
                });
            }
        };

        self.progress.rebuilding(&key, kind, &reason);
        let artifact = self.executor.build(self.compiler.as_ref(), &path, kind)?;
        self.record(ledger, &assessment)?;
        self.progress
            .built(&key, &artifact.output_path, artifact.compile_time);

        Ok(FileOutcome {
            key,
            path,
            strategy,
            state: FileState::Built { reason, artifact },
        })
    }

    /// Record the digests observed before a successful build and persist
    fn record(&self, ledger: &mut ContentLedger, assessment: &Assessment) -> BuildResult<()> {
        for (key, digest) in assessment.ledger_entries() {
            ledger.record(key, digest.clone());
        }
        ledger.save()?;
        debug!(file = %assessment.key, recorded = assessment.dependencies.len() + 1, "ledger updated");
        Ok(())
    }

    /// Remove the output tree and the ledger
    pub fn clean(&self) -> BuildResult<()> {
        let output_root = self.config.output_root();
        if output_root.exists() {
            fs::remove_dir_all(&output_root).map_err(|e| BuildError::io(&output_root, e))?;
            self.progress.cleaned(&output_root);
        }

        let ledger_file = self.config.ledger_file();
        if ledger_file.exists() {
            fs::remove_file(&ledger_file).map_err(|e| BuildError::io(&ledger_file, e))?;
            self.progress.cleaned(&ledger_file);
        }

        Ok(())
    }
}
