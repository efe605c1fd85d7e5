//! Configuration types for pactfix.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

use crate::catalog::model::{Confidence, RuleDefinition};
use crate::language::Language;
use crate::types::Severity;

/// Default maximum number of fix passes per document.
pub const DEFAULT_MAX_FIX_PASSES: usize = 8;

/// Top-level configuration for pactfix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use ("minimal", "recommended" or "strict").
    #[serde(default)]
    pub preset: Option<String>,

    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-rule overrides keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Unknown keys in rule overrides are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        for (id, rule) in &config.rules {
            for key in rule.options.keys() {
                warn!(rule = id.as_str(), key = key.as_str(), "ignoring unknown rule option");
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_fix_passes == 0 {
            return Err(ConfigError::Invalid {
                message: "engine.max-fix-passes must be at least 1".into(),
            });
        }
        if self.engine.parallelism == Some(0) {
            return Err(ConfigError::Invalid {
                message: "engine.parallelism must be at least 1".into(),
            });
        }
        for (id, rule) in &self.rules {
            if let Some(value) = rule.min_confidence {
                if Confidence::new(value).is_err() {
                    return Err(ConfigError::Invalid {
                        message: format!("rules.{id}.min-confidence must be within [0, 1], got {value}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks if a rule is enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }

    /// Gets the threshold override for a rule.
    #[must_use]
    pub fn rule_threshold(&self, rule_id: &str) -> Option<Confidence> {
        self.rules
            .get(rule_id)
            .and_then(|c| c.min_confidence)
            .and_then(|v| Confidence::new(v).ok())
    }

    /// Applies the overrides for `rule`, or returns `None` if it is disabled.
    #[must_use]
    pub fn configure(&self, rule: &RuleDefinition) -> Option<RuleDefinition> {
        let id = rule.id().as_str();
        if !self.is_rule_enabled(id) {
            return None;
        }
        let mut rule = rule.clone();
        if let Some(severity) = self.rule_severity(id) {
            rule = rule.with_severity(severity);
        }
        if let Some(threshold) = self.rule_threshold(id) {
            rule = rule.with_threshold(threshold);
        }
        Some(rule)
    }
}

/// Engine-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Glob patterns to exclude from discovery.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Worker threads; `None` uses rayon's default.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Maximum fix passes per document.
    #[serde(default = "default_max_fix_passes")]
    pub max_fix_passes: usize,

    /// Insert a comment above every fixed line.
    #[serde(default)]
    pub annotate_fixes: bool,

    /// Record an info note for every file without a language.
    #[serde(default)]
    pub report_unknown_languages: bool,

    /// Treat every input as this language instead of detecting it.
    #[serde(default)]
    pub force_language: Option<Language>,

    /// Load the embedded catalog.
    #[serde(default = "default_true")]
    pub builtin_rules: bool,

    /// Extra catalog documents, relative to the config file.
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exclude: default_excludes(),
            respect_gitignore: true,
            parallelism: None,
            max_fix_passes: DEFAULT_MAX_FIX_PASSES,
            annotate_fixes: false,
            report_unknown_languages: false,
            force_language: None,
            builtin_rules: true,
            catalogs: Vec::new(),
        }
    }
}

fn default_excludes() -> Vec<String> {
    vec!["**/vendor/**".to_string(), "**/node_modules/**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_max_fix_passes() -> usize {
    DEFAULT_MAX_FIX_PASSES
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Threshold override for this rule.
    #[serde(default)]
    pub min_confidence: Option<f32>,

    /// Keys pactfix does not know; kept to warn about them.
    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A value is out of range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}
