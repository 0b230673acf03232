//! Build directive detection
//!
//! A source file selects its build strategy with a comment such as
//! `// @build bundle`. Detection is a plain pattern match over the raw text,
//! not a parse: a directive inside a string literal is found exactly like one
//! inside a comment.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// How a source file is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    /// Never built, never tracked
    Ignore,
    /// Compiled standalone, imports left external
    Isolated,
    /// Compiled with its whole dependency closure inlined
    Bundled,
}

/// The buildable subset of [`BuildStrategy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    Isolated,
    Bundled,
}

impl BuildStrategy {
    /// Buildable kind, or `None` for ignored files
    pub fn kind(self) -> Option<BuildKind> {
        match self {
            Self::Ignore => None,
            Self::Isolated => Some(BuildKind::Isolated),
            Self::Bundled => Some(BuildKind::Bundled),
        }
    }

    /// Directive name as written in source
    pub fn name(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Isolated => "simple",
            Self::Bundled => "bundle",
        }
    }
}

impl From<BuildKind> for BuildStrategy {
    fn from(kind: BuildKind) -> Self {
        match kind {
            BuildKind::Isolated => Self::Isolated,
            BuildKind::Bundled => Self::Bundled,
        }
    }
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        BuildStrategy::from(*self).fmt(f)
    }
}

impl FromStr for BuildStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "simple" | "isolated" => Ok(Self::Isolated),
            "bundle" | "bundled" => Ok(Self::Bundled),
            other => Err(format!(
                "unknown build strategy '{}': expected ignore, simple or bundle",
                other
            )),
        }
    }
}

/// Directive patterns in precedence order
fn directive_patterns() -> &'static [(BuildStrategy, Regex); 3] {
    static PATTERNS: OnceLock<[(BuildStrategy, Regex); 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let pattern = |word: &str| {
            Regex::new(&format!(r"(?i)//\s*@build\s+{}", word))
                .expect("directive pattern is valid")
        };
        [
            (BuildStrategy::Ignore, pattern("ignore")),
            (BuildStrategy::Bundled, pattern("bundle")),
            (BuildStrategy::Isolated, pattern("simple")),
        ]
    })
}

/// Determine the build strategy declared in `text`.
///
/// `ignore` wins over `bundle`, which wins over `simple`. Text without any
/// directive is built in isolation.
pub fn classify(text: &str) -> BuildStrategy {
    directive_patterns()
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(strategy, _)| *strategy)
        .unwrap_or(BuildStrategy::Isolated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", BuildStrategy::Isolated)]
    #[case("export const x = 1;\n", BuildStrategy::Isolated)]
    #[case("// @build ignore\nexport {}", BuildStrategy::Ignore)]
    #[case("// @build bundle\nimport './a';", BuildStrategy::Bundled)]
    #[case("// @build simple\n", BuildStrategy::Isolated)]
    #[case("//@build   BUNDLE", BuildStrategy::Bundled)]
    #[case("// @Build Ignore", BuildStrategy::Ignore)]
    #[case("const a = 1; // @build bundle", BuildStrategy::Bundled)]
    fn test_classify(#[case] text: &str, #[case] expected: BuildStrategy) {
        assert_eq!(classify(text), expected);
    }

    #[test]
    fn test_precedence_ignore_over_bundle() {
        let text = "// @build bundle\n// @build ignore\n";
        assert_eq!(classify(text), BuildStrategy::Ignore);
    }

    #[test]
    fn test_precedence_bundle_over_simple() {
        let text = "// @build simple\n// @build bundle\n";
        assert_eq!(classify(text), BuildStrategy::Bundled);
    }

    #[test]
    fn test_marker_without_comment_sentinel_is_not_a_directive() {
        assert_eq!(classify("@build bundle"), BuildStrategy::Isolated);
        assert_eq!(classify("/* @build ignore */"), BuildStrategy::Isolated);
    }

    #[test]
    fn test_directive_inside_string_literal_is_detected() {
        let text = "const s = \"// @build ignore\";";
        assert_eq!(classify(text), BuildStrategy::Ignore);
    }

    #[test]
    fn test_kind() {
        assert_eq!(BuildStrategy::Ignore.kind(), None);
        assert_eq!(BuildStrategy::Isolated.kind(), Some(BuildKind::Isolated));
        assert_eq!(BuildStrategy::Bundled.kind(), Some(BuildKind::Bundled));
    }

    #[test]
    fn test_display_and_parse() {
        for strategy in [
            BuildStrategy::Ignore,
            BuildStrategy::Isolated,
            BuildStrategy::Bundled,
        ] {
            assert_eq!(strategy.to_string().parse::<BuildStrategy>(), Ok(strategy));
        }
        assert_eq!("isolated".parse(), Ok(BuildStrategy::Isolated));
        assert!("inline".parse::<BuildStrategy>().is_err());
    }
}
