//! Progress reporting for builds

use crate::staleness::StaleReason;
use std::path::Path;
use std::time::Duration;

/// How much progress output a build prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One line per file plus a summary
    #[default]
    Normal,
    /// Normal output plus timings
    Verbose,
    /// Nothing on stdout
    Quiet,
}

/// Prints per-file progress to stdout according to an [`OutputMode`]
#[derive(Debug, Clone, Copy)]
pub struct BuildProgress {
    mode: OutputMode,
}

impl BuildProgress {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    fn enabled(&self) -> bool {
        self.mode != OutputMode::Quiet
    }

    pub fn cleaned(&self, output_dir: &Path) {
        if self.enabled() {
            println!("Cleaned {}", output_dir.display());
        }
    }

    pub fn ignored(&self, key: &str) {
        if self.enabled() {
            println!("Skipping {} (@build ignore)", key);
        }
    }

    pub fn unchanged(&self, key: &str) {
        if self.enabled() {
            println!("Unchanged {}", key);
        }
    }

    pub fn rebuilding(&self, key: &str, kind: impl std::fmt::Display, reason: &StaleReason) {
        if self.enabled() {
            println!("Rebuilding {} [{}] ({})", key, kind, reason);
        }
    }

    pub fn built(&self, key: &str, output: &Path, compile_time: Duration) {
        match self.mode {
            OutputMode::Quiet => {}
            OutputMode::Normal => println!("Built {} -> {}", key, output.display()),
            OutputMode::Verbose => println!(
                "Built {} -> {} in {:.2}s",
                key,
                output.display(),
                compile_time.as_secs_f64()
            ),
        }
    }

    pub fn summary(&self, built: usize, unchanged: usize, ignored: usize, total_time: Duration) {
        match self.mode {
            OutputMode::Quiet => {}
            OutputMode::Normal => println!(
                "{} built, {} unchanged, {} ignored",
                built, unchanged, ignored
            ),
            OutputMode::Verbose => println!(
                "{} built, {} unchanged, {} ignored in {:.2}s",
                built,
                unchanged,
                ignored,
                total_time.as_secs_f64()
            ),
        }
    }
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self::new(OutputMode::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_normal() {
        assert_eq!(BuildProgress::default().mode(), OutputMode::Normal);
        assert_eq!(OutputMode::default(), OutputMode::Normal);
    }

    #[test]
    fn test_quiet_is_disabled() {
        assert!(!BuildProgress::new(OutputMode::Quiet).enabled());
        assert!(BuildProgress::new(OutputMode::Verbose).enabled());
    }
}
