//! Rule evaluation for a single file.

use tracing::debug;

use crate::aggregate::FileOutcome;
use crate::config::{Options, ResolvedConfig};
use crate::context::{RuleContext, SourceFile};
use crate::file_type::FileType;
use crate::parser::{self, ParseOutput};
use crate::rule::Registry;
use crate::types::Diagnostic;

/// Parses `source` and runs every applicable, enabled rule in registration
/// order.
///
/// Parse errors come first, then each rule's output. The same source and
/// configuration always produce the same sequence. Unknown files produce
/// nothing.
#[must_use]
pub fn evaluate(source: &SourceFile, registry: &Registry, config: &ResolvedConfig) -> Vec<Diagnostic> {
    let Some(ParseOutput { model, issues }) = parser::parse(source.file_type, &source.text) else {
        return Vec::new();
    };

    let mut diagnostics: Vec<Diagnostic> = issues
        .into_iter()
        .map(|issue| Diagnostic::parse_error(&source.path, issue.line, issue.column, issue.message))
        .collect();

    let no_options = Options::default();
    for rule in registry.for_type(source.file_type) {
        let (enabled, severity, options) = match config.setting(source.file_type, rule.id) {
            Some(s) => (s.enabled, s.severity, &s.options),
            None => (true, rule.default_severity, &no_options),
        };
        if !enabled {
            debug!("Skipping disabled rule: {}", rule.id);
            continue;
        }

        let ctx = RuleContext::new(&source.path, rule.id, severity, options, config);
        let mut found = rule.check.run(&model, &ctx);
        for d in &mut found {
            d.severity = severity;
        }
        diagnostics.extend(found);
    }

    diagnostics
}

/// Evaluates `source` and wraps the result as a per-file outcome.
#[must_use]
pub fn check_source(source: &SourceFile, registry: &Registry, config: &ResolvedConfig) -> FileOutcome {
    if source.file_type == FileType::Unknown {
        debug!("Skipping {}: unknown file type", source.path.display());
        return FileOutcome::Skipped;
    }
    debug!("Checking {} as {}", source.path.display(), source.file_type);
    FileOutcome::Checked(evaluate(source, registry, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dockerfile, Makefile};
    use crate::resolve::{resolve, Overrides};
    use crate::rule::{Check, RuleDescriptor};
    use crate::types::{Severity, PARSE_ERROR};

    fn every_from(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        model
            .instructions_named("FROM")
            .map(|i| ctx.diagnostic(i.line, 0, "from"))
            .collect()
    }

    fn every_target(model: &Makefile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        model
            .targets
            .iter()
            .map(|t| ctx.diagnostic(t.line, 0, t.name.clone()))
            .collect()
    }

    fn registry() -> Registry {
        Registry::new([
            RuleDescriptor {
                id: "every-from",
                description: "",
                default_severity: Severity::Info,
                options: &[],
                check: Check::Dockerfile(every_from),
            },
            RuleDescriptor {
                id: "every-target",
                description: "",
                default_severity: Severity::Warning,
                options: &[],
                check: Check::Makefile(every_target),
            },
        ])
        .unwrap()
    }

    fn config(overrides: &Overrides) -> ResolvedConfig {
        resolve(&registry(), None, overrides).unwrap().config
    }

    #[test]
    fn runs_only_applicable_rules() {
        let source = SourceFile::new("Dockerfile", "FROM a\nFROM b\n");
        let diagnostics = evaluate(&source, &registry(), &config(&Overrides::default()));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.rule_id == "every-from"));
    }

    #[test]
    fn parse_errors_come_first() {
        let source = SourceFile::new("Makefile", "all:\n    echo spaces\nbuild:\n");
        let diagnostics = evaluate(&source, &registry(), &config(&Overrides::default()));
        let ids: Vec<_> = diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
        assert_eq!(ids, vec![PARSE_ERROR, "every-target", "every-target"]);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn disabled_rules_are_skipped_and_overrides_stamped() {
        let overrides = Overrides {
            severities: vec![("every-from".into(), Severity::Error)],
            disabled: vec!["every-target".into()],
            ..Overrides::default()
        };
        let config = config(&overrides);

        let docker = evaluate(&SourceFile::new("Dockerfile", "FROM a\n"), &registry(), &config);
        assert_eq!(docker[0].severity, Severity::Error);

        let make = evaluate(&SourceFile::new("Makefile", "all:\n"), &registry(), &config);
        assert!(make.is_empty());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let source = SourceFile::new("Makefile", "a:\nb:\n\techo\nc: ; x\n");
        let config = config(&Overrides::default());
        let first = evaluate(&source, &registry(), &config);
        let second = evaluate(&source, &registry(), &config);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_files_are_skipped() {
        let source = SourceFile::new("README.md", "# hello\n");
        assert_eq!(
            check_source(&source, &registry(), &config(&Overrides::default())),
            FileOutcome::Skipped
        );
    }
}
