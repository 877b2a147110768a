//! Config resolution: defaults, then the user file, then per-run overrides.
//!
//! Problems in user input never abort the run. They become
//! `config-warning` diagnostics and the affected setting keeps its
//! previous value.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{Config, Options, ResolvedConfig, RuleConfig, RuleSetting};
use crate::error::FatalRunError;
use crate::file_type::FileType;
use crate::rule::Registry;
use crate::types::{Diagnostic, Severity};

/// Pseudo-path used for warnings caused by command-line overrides.
pub const OVERRIDES_SOURCE: &str = "<overrides>";

/// Per-run overrides, applied after the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `RULE=LEVEL` severity overrides.
    pub severities: Vec<(String, Severity)>,
    /// Rules to disable.
    pub disabled: Vec<String>,
    /// Rules to enable (applied after `disabled`).
    pub enabled: Vec<String>,
    /// `section.key` option values.
    pub options: Vec<(String, toml::Value)>,
}

impl Overrides {
    /// True if nothing is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.severities.is_empty()
            && self.disabled.is_empty()
            && self.enabled.is_empty()
            && self.options.is_empty()
    }
}

/// Outcome of resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The merged configuration.
    pub config: ResolvedConfig,
    /// `config-warning` diagnostics, in the order they were found.
    pub warnings: Vec<Diagnostic>,
}

/// Built-in defaults for every registered rule.
///
/// # Errors
///
/// Returns an error if a built-in option default is unusable.
pub fn defaults(registry: &Registry) -> Result<ResolvedConfig, FatalRunError> {
    let mut config = ResolvedConfig::default();

    for rule in registry.rules() {
        config.rules.entry(rule.applies_to()).or_default().insert(
            rule.id.to_string(),
            RuleSetting {
                enabled: true,
                severity: rule.default_severity,
                options: Options::default(),
            },
        );
    }

    validate_defaults(&config)?;
    Ok(config)
}

fn validate_defaults(config: &ResolvedConfig) -> Result<(), FatalRunError> {
    let env = &config.env;
    if !env.min_secret_entropy.is_finite() || env.min_secret_entropy < 0.0 {
        return Err(FatalRunError::InvalidOptionDefault {
            section: FileType::Env.section().to_string(),
            key: "min_secret_entropy".to_string(),
            message: format!("{} is not a non-negative number", env.min_secret_entropy),
        });
    }
    if env.sensitive_markers.iter().any(String::is_empty) {
        return Err(FatalRunError::InvalidOptionDefault {
            section: FileType::Env.section().to_string(),
            key: "sensitive_markers".to_string(),
            message: "markers must be non-empty".to_string(),
        });
    }
    Ok(())
}

/// Resolves the final configuration.
///
/// `user` is the loaded config file and the path it came from.
///
/// # Errors
///
/// Returns an error only for broken built-in defaults.
pub fn resolve(
    registry: &Registry,
    user: Option<(&Path, &Config)>,
    overrides: &Overrides,
) -> Result<Resolution, FatalRunError> {
    let mut resolver = Resolver {
        registry,
        config: defaults(registry)?,
        warnings: Vec::new(),
    };

    if let Some((path, config)) = user {
        debug!("Applying config file {}", path.display());
        resolver.apply_file(path, config);
    }
    if !overrides.is_empty() {
        resolver.apply_overrides(overrides);
    }

    for w in &resolver.warnings {
        warn!("{}: {}", w.path.display(), w.message);
    }

    Ok(Resolution {
        config: resolver.config,
        warnings: resolver.warnings,
    })
}

struct Resolver<'a> {
    registry: &'a Registry,
    config: ResolvedConfig,
    warnings: Vec<Diagnostic>,
}

impl Resolver<'_> {
    fn warn(&mut self, source: &Path, message: String) {
        self.warnings.push(Diagnostic::config_warning(source, message));
    }

    fn apply_file(&mut self, path: &Path, config: &Config) {
        for key in config.analyzer.unknown.keys() {
            self.warn(path, format!("unknown option `analyzer.{key}`"));
        }

        for (name, value) in &config.sections {
            let Some(file_type) = FileType::from_section(name) else {
                self.warn(path, format!("unknown section `[{name}]`"));
                continue;
            };
            let Some(table) = value.as_table() else {
                self.warn(
                    path,
                    format!("section `[{name}]` must be a table, found {}", value.type_str()),
                );
                continue;
            };

            for (key, value) in table {
                if key == "rules" {
                    self.apply_rules_table(path, file_type, value);
                } else {
                    self.apply_option(path, file_type, key, value);
                }
            }
        }
    }

    fn apply_rules_table(&mut self, path: &Path, file_type: FileType, value: &toml::Value) {
        let section = file_type.section();
        let Some(rules) = value.as_table() else {
            self.warn(
                path,
                format!("`{section}.rules` must be a table, found {}", value.type_str()),
            );
            return;
        };

        for (rule_id, rule_value) in rules {
            if !self.check_rule_section(path, rule_id, Some(file_type)) {
                continue;
            }
            let rule_config: RuleConfig = match rule_value.clone().try_into() {
                Ok(c) => c,
                Err(e) => {
                    self.warn(
                        path,
                        format!("invalid settings for rule `{rule_id}`: {}", e.message()),
                    );
                    continue;
                }
            };
            let declared = self.registry.get(rule_id).map_or(&[][..], |r| r.options);
            let (known, unknown): (Vec<_>, Vec<_>) = rule_config
                .options
                .0
                .into_iter()
                .partition(|(key, _)| declared.contains(&key.as_str()));
            for (key, _) in unknown {
                self.warn(
                    path,
                    format!("rule `{rule_id}` has no option `{key}`; ignoring it"),
                );
            }

            if let Some(setting) = self.config.setting_mut(file_type, rule_id) {
                if let Some(enabled) = rule_config.enabled {
                    setting.enabled = enabled;
                }
                if let Some(severity) = rule_config.severity {
                    setting.severity = severity;
                }
                setting.options.0.extend(known);
            }
        }
    }

    /// Returns true if `rule_id` exists and (when given) lives under
    /// `section`. Emits a warning otherwise.
    fn check_rule_section(
        &mut self,
        path: &Path,
        rule_id: &str,
        section: Option<FileType>,
    ) -> bool {
        let Some(rule) = self.registry.get(rule_id) else {
            self.warn(path, format!("unknown rule `{rule_id}`"));
            return false;
        };
        let owner = rule.applies_to();
        match section {
            Some(placed) if placed != owner => {
                self.warn(
                    path,
                    format!(
                        "rule `{rule_id}` belongs in `[{}.rules]`, not `[{}.rules]`",
                        owner.section(),
                        placed.section()
                    ),
                );
                false
            }
            _ => true,
        }
    }

    fn apply_option(&mut self, path: &Path, file_type: FileType, key: &str, value: &toml::Value) {
        if let Err(e) = self.config.set_option(file_type, key, value) {
            self.warn(
                path,
                format!("option `{}.{key}` {e}; keeping the default", file_type.section()),
            );
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        let source = PathBuf::from(OVERRIDES_SOURCE);

        for (rule_id, severity) in &overrides.severities {
            if let Some(setting) = self.rule_setting(&source, rule_id) {
                setting.severity = *severity;
            }
        }
        for rule_id in &overrides.disabled {
            if let Some(setting) = self.rule_setting(&source, rule_id) {
                setting.enabled = false;
            }
        }
        for rule_id in &overrides.enabled {
            if let Some(setting) = self.rule_setting(&source, rule_id) {
                setting.enabled = true;
            }
        }
        for (dotted, value) in &overrides.options {
            let Some((section, key)) = dotted.split_once('.') else {
                self.warn(
                    &source,
                    format!("option `{dotted}` must be written as `section.key`"),
                );
                continue;
            };
            let Some(file_type) = FileType::from_section(section) else {
                self.warn(&source, format!("unknown section `[{section}]`"));
                continue;
            };
            self.apply_option(&source, file_type, key, value);
        }
    }

    fn rule_setting(&mut self, source: &Path, rule_id: &str) -> Option<&mut RuleSetting> {
        if !self.check_rule_section(source, rule_id, None) {
            return None;
        }
        let file_type = self.registry.get(rule_id)?.applies_to();
        self.config.setting_mut(file_type, rule_id)
    }
}

/// Per-type rule settings as a plain map, mostly for reporting.
#[must_use]
pub fn effective_settings(config: &ResolvedConfig) -> BTreeMap<String, (bool, Severity)> {
    config
        .rules
        .values()
        .flat_map(|rules| rules.iter())
        .map(|(id, s)| (id.clone(), (s.enabled, s.severity)))
        .collect()
}
