//! Rule descriptors and the rule registry.

use std::collections::HashSet;
use std::fmt;

use crate::context::RuleContext;
use crate::error::FatalRunError;
use crate::file_type::FileType;
use crate::model::{Crontab, Dockerfile, EnvFile, Makefile, ParsedModel, SystemdUnit};
use crate::types::{
    Diagnostic, Severity, CONFIG_WARNING, INTERNAL_ERROR, LOAD_ERROR, PARSE_ERROR, TIMEOUT,
};

/// Check function over a Dockerfile model.
pub type DockerfileCheck = fn(&Dockerfile, &RuleContext<'_>) -> Vec<Diagnostic>;
/// Check function over a Makefile model.
pub type MakefileCheck = fn(&Makefile, &RuleContext<'_>) -> Vec<Diagnostic>;
/// Check function over an env model.
pub type EnvCheck = fn(&EnvFile, &RuleContext<'_>) -> Vec<Diagnostic>;
/// Check function over a crontab model.
pub type CrontabCheck = fn(&Crontab, &RuleContext<'_>) -> Vec<Diagnostic>;
/// Check function over a systemd unit model.
pub type SystemdCheck = fn(&SystemdUnit, &RuleContext<'_>) -> Vec<Diagnostic>;

/// A format-tagged pure check function. The tag decides which files the
/// rule applies to.
#[derive(Clone, Copy)]
pub enum Check {
    /// Runs on Dockerfiles.
    Dockerfile(DockerfileCheck),
    /// Runs on Makefiles.
    Makefile(MakefileCheck),
    /// Runs on `.env` files.
    Env(EnvCheck),
    /// Runs on crontabs.
    Crontab(CrontabCheck),
    /// Runs on systemd units.
    SystemdUnit(SystemdCheck),
}

impl Check {
    /// File type this check applies to.
    #[must_use]
    pub fn file_type(&self) -> FileType {
        match self {
            Self::Dockerfile(_) => FileType::Dockerfile,
            Self::Makefile(_) => FileType::Makefile,
            Self::Env(_) => FileType::Env,
            Self::Crontab(_) => FileType::Crontab,
            Self::SystemdUnit(_) => FileType::SystemdUnit,
        }
    }

    /// Runs the check. A model of another type yields nothing.
    #[must_use]
    pub fn run(&self, model: &ParsedModel, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        match (self, model) {
            (Self::Dockerfile(f), ParsedModel::Dockerfile(m)) => f(m, ctx),
            (Self::Makefile(f), ParsedModel::Makefile(m)) => f(m, ctx),
            (Self::Env(f), ParsedModel::Env(m)) => f(m, ctx),
            (Self::Crontab(f), ParsedModel::Crontab(m)) => f(m, ctx),
            (Self::SystemdUnit(f), ParsedModel::SystemdUnit(m)) => f(m, ctx),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Check::{:?}", self.file_type())
    }
}

/// A registered rule.
///
/// # Example
///
/// ```ignore
/// use infralint_core::model::Dockerfile;
/// use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};
///
/// fn check(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
///     model
///         .instructions_named("MAINTAINER")
///         .map(|i| ctx.diagnostic(i.line, i.column, "MAINTAINER is deprecated"))
///         .collect()
/// }
///
/// pub const RULE: RuleDescriptor = RuleDescriptor {
///     id: "dockerfile-maintainer",
///     description: "MAINTAINER is deprecated; use a LABEL",
///     default_severity: Severity::Info,
///     options: &[],
///     check: Check::Dockerfile(check),
/// };
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RuleDescriptor {
    /// Stable kebab-case id (e.g. "dockerfile-latest-tag").
    pub id: &'static str,
    /// Brief description of what the rule checks.
    pub description: &'static str,
    /// Severity used unless configuration overrides it.
    pub default_severity: Severity,
    /// Keys accepted in `[<section>.rules.<id>]` besides `enabled` and
    /// `severity`.
    pub options: &'static [&'static str],
    /// The check function, tagged by file type.
    pub check: Check,
}

impl RuleDescriptor {
    /// File type this rule applies to.
    #[must_use]
    pub fn applies_to(&self) -> FileType {
        self.check.file_type()
    }
}

const RESERVED_IDS: &[&str] = &[PARSE_ERROR, LOAD_ERROR, CONFIG_WARNING, TIMEOUT, INTERNAL_ERROR];

/// The fixed set of rules for a run, in registration order.
#[derive(Debug, Clone)]
pub struct Registry {
    rules: Vec<RuleDescriptor>,
}

impl Registry {
    /// Builds a registry, preserving the given order.
    ///
    /// # Errors
    ///
    /// Returns [`FatalRunError::DuplicateRuleId`] if two rules share an id,
    /// and [`FatalRunError::InvalidDefault`] for ids that are empty, not
    /// kebab-case, or reserved for engine diagnostics.
    pub fn new(rules: impl IntoIterator<Item = RuleDescriptor>) -> Result<Self, FatalRunError> {
        let rules: Vec<RuleDescriptor> = rules.into_iter().collect();
        let mut seen = HashSet::new();

        for rule in &rules {
            if !is_kebab_case(rule.id) {
                return Err(FatalRunError::InvalidDefault {
                    rule_id: rule.id.to_string(),
                    message: "id must be non-empty kebab-case".to_string(),
                });
            }
            if RESERVED_IDS.contains(&rule.id) {
                return Err(FatalRunError::InvalidDefault {
                    rule_id: rule.id.to_string(),
                    message: "id is reserved for engine diagnostics".to_string(),
                });
            }
            if !seen.insert(rule.id) {
                return Err(FatalRunError::DuplicateRuleId {
                    id: rule.id.to_string(),
                });
            }
        }

        Ok(Self { rules })
    }

    /// All rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[RuleDescriptor] {
        &self.rules
    }

    /// Rules applying to `file_type`, in registration order.
    pub fn for_type(&self, file_type: FileType) -> impl Iterator<Item = &RuleDescriptor> {
        self.rules
            .iter()
            .filter(move |r| r.applies_to() == file_type)
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RuleDescriptor> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn is_kebab_case(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('-')
        && !id.ends_with('-')
        && !id.contains("--")
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, ResolvedConfig};
    use std::path::Path;

    fn flag_every_from(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        model
            .instructions_named("FROM")
            .map(|i| ctx.diagnostic(i.line, i.column, "from"))
            .collect()
    }

    fn nothing(_: &EnvFile, _: &RuleContext<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }

    const FROM_RULE: RuleDescriptor = RuleDescriptor {
        id: "test-from",
        description: "flags FROM",
        default_severity: Severity::Info,
        options: &[],
        check: Check::Dockerfile(flag_every_from),
    };

    const ENV_RULE: RuleDescriptor = RuleDescriptor {
        id: "test-env",
        description: "",
        default_severity: Severity::Warning,
        options: &[],
        check: Check::Env(nothing),
    };

    #[test]
    fn registry_keeps_order_and_partitions() {
        let registry = Registry::new([ENV_RULE, FROM_RULE]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.rules()[0].id, "test-env");
        let docker: Vec<_> = registry.for_type(FileType::Dockerfile).map(|r| r.id).collect();
        assert_eq!(docker, vec!["test-from"]);
        assert_eq!(registry.get("test-env").map(RuleDescriptor::applies_to), Some(FileType::Env));
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn registry_rejects_duplicates() {
        let err = Registry::new([FROM_RULE, ENV_RULE, FROM_RULE]).unwrap_err();
        assert!(matches!(err, FatalRunError::DuplicateRuleId { id } if id == "test-from"));
    }

    #[test]
    fn registry_rejects_bad_and_reserved_ids() {
        let mut bad = ENV_RULE;
        bad.id = "Not_Kebab";
        assert!(matches!(
            Registry::new([bad]),
            Err(FatalRunError::InvalidDefault { .. })
        ));

        let mut reserved = ENV_RULE;
        reserved.id = "parse-error";
        assert!(matches!(
            Registry::new([reserved]),
            Err(FatalRunError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn check_dispatches_on_model_type() {
        let model = ParsedModel::Dockerfile(crate::parser::dockerfile::parse("FROM a\nFROM b\n").0);
        let config = ResolvedConfig::default();
        let options = Options::default();
        let ctx = RuleContext::new(Path::new("Dockerfile"), "test-from", Severity::Info, &options, &config);

        assert_eq!(FROM_RULE.check.run(&model, &ctx).len(), 2);
        assert!(ENV_RULE.check.run(&model, &ctx).is_empty());
    }
}
