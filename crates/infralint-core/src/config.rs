//! Configuration types for infralint.
//!
//! [`Config`] is the user-facing TOML document. [`ResolvedConfig`] is the
//! merged, read-only view the rules see; it is built by
//! [`crate::resolve::resolve`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::file_type::FileType;
use crate::types::Severity;

/// Top-level user configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-file-type sections (`[dockerfile]`, `[env]`, ...), kept as raw
    /// TOML so that unknown or mistyped entries degrade into warnings.
    #[serde(flatten)]
    pub sections: BTreeMap<String, toml::Value>,
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
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Glob patterns excluded from directory walks.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of files processed concurrently.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Run-wide timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Largest file (in bytes) that will be loaded.
    #[serde(default)]
    pub max_file_size: Option<u64>,

    /// Keys not listed above; resolution reports them.
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            respect_gitignore: true,
            parallelism: None,
            timeout_secs: None,
            max_file_size: None,
            unknown: BTreeMap::new(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Per-rule configuration inside `[<section>.rules.<rule-id>]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: Options,
}

/// A free-form option table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(pub BTreeMap<String, toml::Value>);

impl Options {
    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.0
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Inserts a raw value.
    pub fn insert(&mut self, key: impl Into<String>, value: toml::Value) {
        self.0.insert(key.into(), value);
    }
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
}

/// A rejected option value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    /// The value has the wrong TOML type.
    #[error("expects {expected}, found {found}")]
    Mistyped {
        /// Expected type description.
        expected: &'static str,
        /// Actual TOML type.
        found: &'static str,
    },
    /// The value has the right type but is unusable.
    #[error("{0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Final enablement and severity of one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    /// Whether the rule runs.
    pub enabled: bool,
    /// Severity stamped on the rule's diagnostics.
    pub severity: Severity,
    /// Rule-specific options from `[<section>.rules.<id>]`.
    pub options: Options,
}

/// Options for Dockerfile rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerfileOptions {
    /// Accept `:latest` and untagged images.
    pub allow_latest_tag: bool,
    /// Report images without a `HEALTHCHECK`.
    pub require_healthcheck: bool,
}

impl Default for DockerfileOptions {
    fn default() -> Self {
        Self {
            allow_latest_tag: false,
            require_healthcheck: true,
        }
    }
}

/// Options for Makefile rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakefileOptions {
    /// Report targets missing from `.PHONY`.
    pub require_phony: bool,
}

impl Default for MakefileOptions {
    fn default() -> Self {
        Self {
            require_phony: true,
        }
    }
}

/// Values treated as weak secrets unless configured otherwise.
pub const DEFAULT_WEAK_VALUES: &[&str] = &[
    "admin",
    "password",
    "123456",
    "qwerty",
    "letmein",
    "changeme",
    "secret",
    "root",
    "test",
    "12345678",
    "123456789",
    "password1",
    "default",
    "guest",
    "abc123",
    "111111",
];

/// Options for `.env` rules.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvOptions {
    /// Run the weak-value check at all.
    pub check_weak_passwords: bool,
    /// Lower-case substrings that mark a key as holding a secret.
    pub sensitive_markers: Vec<String>,
    /// Lower-case values that are always weak.
    pub weak_values: Vec<String>,
    /// Values matching any of these globs are never reported.
    pub allowed_weak_patterns: Vec<glob::Pattern>,
    /// Secrets shorter than this (in characters) are weak.
    pub min_secret_length: usize,
    /// Secrets with fewer total Shannon bits than this are weak.
    pub min_secret_entropy: f64,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            check_weak_passwords: true,
            sensitive_markers: vec!["password".into(), "secret".into(), "token".into()],
            weak_values: DEFAULT_WEAK_VALUES.iter().map(|v| (*v).to_string()).collect(),
            allowed_weak_patterns: Vec::new(),
            min_secret_length: 8,
            min_secret_entropy: 24.0,
        }
    }
}

/// Options for systemd unit rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemdOptions {
    /// Report `[Service]` sections without `Restart=`.
    pub require_restart: bool,
}

impl Default for SystemdOptions {
    fn default() -> Self {
        Self {
            require_restart: true,
        }
    }
}

/// The merged configuration rules read. Built once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    /// Per-file-type rule settings, keyed by rule id.
    pub rules: BTreeMap<FileType, BTreeMap<String, RuleSetting>>,
    /// Dockerfile options.
    pub dockerfile: DockerfileOptions,
    /// Makefile options.
    pub makefile: MakefileOptions,
    /// `.env` options.
    pub env: EnvOptions,
    /// systemd options.
    pub systemd: SystemdOptions,
    /// Options no built-in rule knows, per file type.
    pub extra: BTreeMap<FileType, Options>,
}

impl ResolvedConfig {
    /// Setting of `rule_id` under `file_type`.
    #[must_use]
    pub fn setting(&self, file_type: FileType, rule_id: &str) -> Option<&RuleSetting> {
        self.rules.get(&file_type).and_then(|r| r.get(rule_id))
    }

    /// Mutable setting of `rule_id` under `file_type`.
    pub fn setting_mut(&mut self, file_type: FileType, rule_id: &str) -> Option<&mut RuleSetting> {
        self.rules.get_mut(&file_type).and_then(|r| r.get_mut(rule_id))
    }

    /// Free-form options for `file_type`.
    #[must_use]
    pub fn extra(&self, file_type: FileType) -> Option<&Options> {
        self.extra.get(&file_type)
    }

    /// Applies one `[section] key = value` option.
    ///
    /// Keys no built-in rule knows are stored in [`Self::extra`].
    ///
    /// # Errors
    ///
    /// Returns an error if a known key has the wrong type or an unusable
    /// value; the previous value is kept.
    pub fn set_option(
        &mut self,
        file_type: FileType,
        key: &str,
        value: &toml::Value,
    ) -> Result<(), OptionError> {
        match (file_type, key) {
            (FileType::Dockerfile, "allow_latest_tag") => {
                self.dockerfile.allow_latest_tag = expect_bool(value)?;
            }
            (FileType::Dockerfile, "require_healthcheck") => {
                self.dockerfile.require_healthcheck = expect_bool(value)?;
            }
            (FileType::Makefile, "require_phony") => {
                self.makefile.require_phony = expect_bool(value)?;
            }
            (FileType::Env, "check_weak_passwords") => {
                self.env.check_weak_passwords = expect_bool(value)?;
            }
            (FileType::Env, "sensitive_markers") => {
                self.env.sensitive_markers = lowercase(expect_str_array(value)?);
            }
            (FileType::Env, "weak_values") => {
                self.env.weak_values = lowercase(expect_str_array(value)?);
            }
            (FileType::Env, "allowed_weak_patterns") => {
                self.env.allowed_weak_patterns = expect_str_array(value)?
                    .iter()
                    .map(|p| {
                        glob::Pattern::new(p)
                            .map_err(|e| OptionError::Invalid(format!("invalid glob `{p}`: {e}")))
                    })
                    .collect::<Result<_, _>>()?;
            }
            (FileType::Env, "min_secret_length") => {
                let n = value.as_integer().ok_or(OptionError::Mistyped {
                    expected: "an integer",
                    found: value.type_str(),
                })?;
                self.env.min_secret_length = usize::try_from(n).map_err(|_| {
                    OptionError::Invalid(format!("must be a non-negative integer, got {n}"))
                })?;
            }
            (FileType::Env, "min_secret_entropy") => {
                #[allow(clippy::cast_precision_loss)]
                let bits = match value {
                    toml::Value::Float(f) => *f,
                    toml::Value::Integer(i) => *i as f64,
                    other => {
                        return Err(OptionError::Mistyped {
                            expected: "a number",
                            found: other.type_str(),
                        })
                    }
                };
                if !bits.is_finite() || bits < 0.0 {
                    return Err(OptionError::Invalid(format!(
                        "must be a non-negative number of bits, got {bits}"
                    )));
                }
                self.env.min_secret_entropy = bits;
            }
            (FileType::SystemdUnit, "require_restart") => {
                self.systemd.require_restart = expect_bool(value)?;
            }
            _ => {
                self.extra
                    .entry(file_type)
                    .or_default()
                    .insert(key, value.clone());
            }
        }
        Ok(())
    }
}

fn expect_bool(value: &toml::Value) -> Result<bool, OptionError> {
    value.as_bool().ok_or(OptionError::Mistyped {
        expected: "a boolean",
        found: value.type_str(),
    })
}

fn expect_str_array(value: &toml::Value) -> Result<Vec<String>, OptionError> {
    let mistyped = || OptionError::Mistyped {
        expected: "an array of strings",
        found: value.type_str(),
    };
    value
        .as_array()
        .ok_or_else(mistyped)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(mistyped))
        .collect()
}

fn lowercase(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analyzer.respect_gitignore);
        assert!(config.sections.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analyzer]
exclude = ["**/vendor/**"]
parallelism = 4
timeout_secs = 30

[dockerfile]
allow_latest_tag = true

[dockerfile.rules.dockerfile-latest-tag]
severity = "error"
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.analyzer.parallelism, Some(4));
        assert_eq!(config.analyzer.timeout_secs, Some(30));
        assert!(config.sections.contains_key("dockerfile"));

        let rule: RuleConfig = config.sections["dockerfile"]["rules"]["dockerfile-latest-tag"]
            .clone()
            .try_into()
            .unwrap();
        assert_eq!(rule.severity, Some(Severity::Error));
        assert_eq!(rule.enabled, None);
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(matches!(
            Config::parse("[analyzer\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn rule_options_are_flattened() {
        let rule: RuleConfig = toml::from_str("enabled = false\nmax = 3\nnames = [\"a\", \"b\"]\n")
            .unwrap();
        assert_eq!(rule.enabled, Some(false));
        assert_eq!(rule.options.0.get("max"), Some(&toml::Value::Integer(3)));
        assert!(rule.options.get_bool("missing", true));
        assert!(!rule.options.get_bool("max", false));
    }

    #[test]
    fn set_option_typed_and_extra() {
        let mut config = ResolvedConfig::default();
        config
            .set_option(FileType::Dockerfile, "allow_latest_tag", &toml::Value::Boolean(true))
            .unwrap();
        assert!(config.dockerfile.allow_latest_tag);

        config
            .set_option(FileType::Crontab, "max_jobs", &toml::Value::Integer(5))
            .unwrap();
        assert_eq!(
            config.extra(FileType::Crontab).and_then(|o| o.0.get("max_jobs")),
            Some(&toml::Value::Integer(5))
        );
    }

    #[test]
    fn set_option_rejects_wrong_type_and_keeps_default() {
        let mut config = ResolvedConfig::default();
        let err = config
            .set_option(
                FileType::Makefile,
                "require_phony",
                &toml::Value::String("yes".into()),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "expects a boolean, found string");
        assert!(config.makefile.require_phony);
    }

    #[test]
    fn env_option_validation() {
        let mut config = ResolvedConfig::default();
        config
            .set_option(FileType::Env, "min_secret_entropy", &toml::Value::Integer(30))
            .unwrap();
        assert!((config.env.min_secret_entropy - 30.0).abs() < f64::EPSILON);

        assert!(config
            .set_option(FileType::Env, "min_secret_entropy", &toml::Value::Float(-1.0))
            .is_err());
        assert!(config
            .set_option(FileType::Env, "min_secret_length", &toml::Value::Integer(-2))
            .is_err());

        let patterns = toml::Value::Array(vec![toml::Value::String("[".into())]);
        assert!(config
            .set_option(FileType::Env, "allowed_weak_patterns", &patterns)
            .is_err());

        let markers = toml::Value::Array(vec![toml::Value::String("API_KEY".into())]);
        config
            .set_option(FileType::Env, "sensitive_markers", &markers)
            .unwrap();
        assert_eq!(config.env.sensitive_markers, vec!["api_key"]);
    }
}
