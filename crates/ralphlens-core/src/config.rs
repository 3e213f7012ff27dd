//! Analysis configuration.
//!
//! Every threshold, keyword list and category table used by the detectors
//! lives in [`AnalysisConfig`]. It can be overridden from `ralphlens.toml` in
//! the working directory or from the user config directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// The config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "ralphlens.toml";

/// Category name for invocations no rule matches.
pub const OTHER_CATEGORY: &str = "other";

const DEFAULT_RECOVERY_KEYWORDS: &[&str] = &["fix", "let me", "try", "install", "check"];

const DEFAULT_ENVIRONMENT_PHRASES: &[&str] = &[
    "command not found",
    "no module named",
    "not found",
    "permission denied",
    "cannot find",
    "missing",
    "failed to",
    "error:",
];

const DEFAULT_TEST_COMMANDS: &[&str] = &[
    "cargo test",
    "cargo build",
    "npm test",
    "pytest",
    "jest",
    "go test",
];

/// Declaration order is the tie-break order.
const DEFAULT_CATEGORIES: &[(&str, &[&str], Option<EfficiencyGroup>)] = &[
    ("orientation", &["bd ready", "bd show", "bd list"], Some(EfficiencyGroup::Overhead)),
    ("claiming", &["bd update"], Some(EfficiencyGroup::Workflow)),
    ("reading", &["Read", "Glob"], None),
    (
        "testing",
        &["cargo test", "pytest", "npm test", "python -m pytest"],
        Some(EfficiencyGroup::Productive),
    ),
    ("editing", &["Edit", "Write"], Some(EfficiencyGroup::Productive)),
    ("closing", &["bd close"], Some(EfficiencyGroup::Workflow)),
    ("git", &["git "], Some(EfficiencyGroup::Overhead)),
    (
        "env_setup",
        &["apt-get", "dnf", "pip", "which", "curl"],
        Some(EfficiencyGroup::Overhead),
    ),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// How a tool invocation is matched to its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ResultLookup {
    /// Only results in `[invocation, invocation + horizon)` count.
    Horizon { horizon: usize },
    /// Any later result with the same call id counts.
    Exact,
}

impl Default for ResultLookup {
    fn default() -> Self {
        ResultLookup::Horizon { horizon: 10 }
    }
}

/// Efficiency view a category contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyGroup {
    Productive,
    Overhead,
    Workflow,
}

/// One ordered classification rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    pub name: String,
    pub patterns: Vec<String>,
    /// Categories without a group count toward no efficiency bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<EfficiencyGroup>,
}

impl CategoryRule {
    pub fn matches(&self, target: &str) -> bool {
        self.patterns.iter().any(|p| target.contains(p.as_str()))
    }
}

/// Tool names with special meaning to the detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolNames {
    pub shell: String,
    pub read: String,
    pub edit: String,
    pub write: String,
    /// Ad-hoc todo tool that bypasses the issue tracker
    pub escape: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            shell: "Bash".into(),
            read: "Read".into(),
            edit: "Edit".into(),
            write: "Write".into(),
            escape: "TodoWrite".into(),
        }
    }
}

/// Character limits for excerpts copied into findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcerptLimits {
    pub command: usize,
    pub test_command: usize,
    pub detail: usize,
    pub output: usize,
    pub recovery: usize,
    pub narrative: usize,
}

impl Default for ExcerptLimits {
    fn default() -> Self {
        Self {
            command: 80,
            test_command: 100,
            detail: 200,
            output: 500,
            recovery: 80,
            narrative: 100,
        }
    }
}

/// Shared detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Minimum same-tool run flagged as a potential stuck loop
    pub run_threshold: usize,
    /// Minimum Bash sequence length recorded
    pub bash_sequence_threshold: usize,
    pub result_lookup: ResultLookup,
    pub tools: ToolNames,
    pub recovery_keywords: Vec<String>,
    pub environment_phrases: Vec<String>,
    pub test_commands: Vec<String>,
    pub categories: Vec<CategoryRule>,
    pub excerpts: ExcerptLimits,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            run_threshold: 5,
            bash_sequence_threshold: 5,
            result_lookup: ResultLookup::default(),
            tools: ToolNames::default(),
            recovery_keywords: strings(DEFAULT_RECOVERY_KEYWORDS),
            environment_phrases: strings(DEFAULT_ENVIRONMENT_PHRASES),
            test_commands: strings(DEFAULT_TEST_COMMANDS),
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(name, patterns, group)| CategoryRule {
                    name: name.to_string(),
                    patterns: strings(patterns),
                    group: *group,
                })
                .collect(),
            excerpts: ExcerptLimits::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(None);
        }
        Self::load_from(&config_path).map(Some)
    }

    /// Load and validate a config file that must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            AnalysisError::Config { source, .. } => AnalysisError::Config {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "Loaded analysis config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).map_err(|source| AnalysisError::Config {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// The config file `resolve` would read, if any.
    /// Priority: explicit path > working dir file > user config dir file
    pub fn locate(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = working_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        Self::user_config_path().filter(|path| path.exists())
    }

    /// Resolve the effective config, falling back to defaults when no file
    /// is found. An explicit path that does not exist is an error.
    pub fn resolve(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        match Self::locate(explicit, working_dir) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// `<config dir>/ralphlens/config.toml`, when a config dir is known.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ralphlens").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.run_threshold == 0 {
            return Err(AnalysisError::InvalidConfig(
                "run_threshold must be at least 1".into(),
            ));
        }
        if self.bash_sequence_threshold == 0 {
            return Err(AnalysisError::InvalidConfig(
                "bash_sequence_threshold must be at least 1".into(),
            ));
        }
        if let ResultLookup::Horizon { horizon: 0 } = self.result_lookup {
            return Err(AnalysisError::InvalidConfig(
                "result_lookup horizon must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.categories {
            if rule.name == OTHER_CATEGORY {
                return Err(AnalysisError::InvalidConfig(format!(
                    "category name '{}' is reserved",
                    OTHER_CATEGORY
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "duplicate category '{}'",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// Whether a shell command is a test or build invocation.
    pub fn is_test_command(&self, command: &str) -> bool {
        self.test_commands.iter().any(|p| command.contains(p.as_str()))
    }
}
