//! Project Configuration (kiln.toml)
//!
//! Handles project-level configuration stored in `kiln.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Project configuration from kiln.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Build layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,

    /// Compiler invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerSection>,
}

/// `[build]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BuildSection {
    /// Source directory (default: "src")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Output directory (default: "dist")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Ledger file (default: ".build-cache.json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<PathBuf>,

    /// Source file extension (default: "ts")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_extension: Option<String>,

    /// Artifact extension (default: "js")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_extension: Option<String>,
}

/// `[compiler]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CompilerSection {
    /// esbuild executable (default: "esbuild" from PATH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,

    /// Output language level (default: "es6")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Output platform (default: "browser")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(build) = &self.build {
            for (field, value) in [
                ("build.source-extension", &build.source_extension),
                ("build.target-extension", &build.target_extension),
            ] {
                if let Some(ext) = value {
                    validate_extension(field, ext)?;
                }
            }

            if let Some(output) = &build.output {
                let output = lexical(output);
                if output.as_os_str().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "build.output cannot be the project root".to_string(),
                    ));
                }

                let source = lexical(build.source.as_deref().unwrap_or(Path::new("src")));
                if source.starts_with(&output) || output.starts_with(&source) {
                    return Err(ConfigError::ValidationError(format!(
                        "build.output '{}' and build.source '{}' must not overlap",
                        output.display(),
                        source.display()
                    )));
                }
            }
        }

        if let Some(compiler) = &self.compiler {
            for (field, value) in [
                ("compiler.target", &compiler.target),
                ("compiler.platform", &compiler.platform),
            ] {
                if matches!(value, Some(v) if v.trim().is_empty()) {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: "cannot be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Build section, or an empty one
    pub fn build(&self) -> BuildSection {
        self.build.clone().unwrap_or_default()
    }

    /// Compiler section, or an empty one
    pub fn compiler(&self) -> CompilerSection {
        self.compiler.clone().unwrap_or_default()
    }
}

/// Path without `.` components, for overlap checks
fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Extensions are written without the leading dot
fn validate_extension(field: &str, ext: &str) -> ConfigResult<()> {
    if ext.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "extension cannot be empty".to_string(),
        });
    }
    if ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' must be a bare extension such as \"ts\"", ext),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[build]
source = "ts"
output = "code"
ledger = ".cache/ledger.json"
source-extension = "ts"
target-extension = "js"

[compiler]
program = "node_modules/.bin/esbuild"
target = "es2017"
platform = "neutral"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        let build = config.build();
        assert_eq!(build.source, Some(PathBuf::from("ts")));
        assert_eq!(build.output, Some(PathBuf::from("code")));
        assert_eq!(build.ledger, Some(PathBuf::from(".cache/ledger.json")));
        let compiler = config.compiler();
        assert_eq!(compiler.target.as_deref(), Some("es2017"));
        assert_eq!(compiler.platform.as_deref(), Some("neutral"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[build]
sources = "src"
"#;
        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let config = ProjectConfig {
            build: Some(BuildSection {
                source_extension: Some(".ts".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_same_source_and_output_rejected() {
        let config = ProjectConfig {
            build: Some(BuildSection {
                source: Some(PathBuf::from("src")),
                output: Some(PathBuf::from("src")),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_output_enclosing_source_rejected() {
        for output in [".", "./"] {
            let config = ProjectConfig {
                build: Some(BuildSection {
                    output: Some(PathBuf::from(output)),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "output {} accepted",
                output
            );
        }
    }

    #[test]
    fn test_output_nested_in_source_rejected() {
        let config = ProjectConfig {
            build: Some(BuildSection {
                source: Some(PathBuf::from("ts")),
                output: Some(PathBuf::from("./ts/out")),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_compiler_target_rejected() {
        let config = ProjectConfig {
            compiler: Some(CompilerSection {
                target: Some("  ".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
