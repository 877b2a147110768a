//! Rule to require `.PHONY` for targets that do not build a file.
//!
//! # Rationale
//!
//! A target like `clean` that never creates a file named `clean` silently
//! stops running once such a file appears in the directory.
//!
//! # Heuristics
//!
//! A target is reported (once, at its first definition) unless it is
//! declared `.PHONY`, is a special or pattern target, has a file-like name
//! (contains `.`, `/` or a variable), is an empty marker target such as
//! `FORCE:`, or has a recipe that plausibly writes the target file
//! (`$@`, `-o name`, `> name`, `touch name`).

use std::collections::HashSet;

use infralint_core::model::{Makefile, Target};
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "makefile-missing-phony";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Targets that do not create a file should be declared `.PHONY`",
    default_severity: Severity::Info,
    options: &["require_phony"],
    check: Check::Makefile(check),
};

const WRITERS: &[&str] = &["-o", ">", ">>", "touch", "mkdir", "-p"];

fn check(model: &Makefile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let required = ctx
        .options
        .get_bool("require_phony", ctx.config.makefile.require_phony);
    if !required {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut diagnostics = Vec::new();

    for target in &model.targets {
        let name = target.name.as_str();
        if !seen.insert(name) || model.phony.contains(name) || looks_like_file(target) {
            continue;
        }

        let occurrences: Vec<&Target> = model.targets.iter().filter(|t| t.name == name).collect();
        let is_marker = occurrences
            .iter()
            .all(|t| t.prerequisites.is_empty() && t.recipe_lines.is_empty());
        if is_marker || occurrences.iter().any(|t| writes_target(t)) {
            continue;
        }

        diagnostics.push(ctx.diagnostic(
            target.line,
            1,
            format!("target `{name}` does not create a file and is not declared `.PHONY`"),
        ));
    }

    diagnostics
}

fn looks_like_file(target: &Target) -> bool {
    target.is_special()
        || target
            .name
            .contains(|c| matches!(c, '.' | '/' | '%' | '$'))
}

fn writes_target(target: &Target) -> bool {
    target.recipe_lines.iter().any(|recipe| {
        if recipe.text.contains("$@") || recipe.text.contains("$(@") || recipe.text.contains("${@") {
            return true;
        }
        let tokens: Vec<&str> = recipe.text.split_whitespace().collect();
        tokens.windows(2).any(|pair| {
            pair[1].trim_matches(|c| c == '"' || c == '\'') == target.name
                && WRITERS.contains(&pair[0])
        }) || tokens
            .iter()
            .any(|t| t.strip_prefix('>').is_some_and(|rest| rest == target.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, check_with};

    fn names(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .map(|d| d.message.split('`').nth(1).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_reports_command_targets() {
        let diagnostics = check(
            RULE,
            "Makefile",
            "build:\n\tgo build ./...\nclean:\n\trm -rf bin\nbuild:\n\tgo vet\n",
        );
        assert_eq!(names(&diagnostics), vec!["build", "clean"]);
        assert_eq!(diagnostics[0].line, 1);
    }

    #[test]
    fn test_phony_targets_are_fine() {
        let diagnostics = check(
            RULE,
            "Makefile",
            ".PHONY: build clean\nbuild:\n\tgo build\nclean:\n\trm -rf bin\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_file_targets_are_fine() {
        let diagnostics = check(
            RULE,
            "Makefile",
            "app: main.o\n\tcc -o app main.o\n\
             main.o: main.c\n\tcc -c main.c\n\
             stamp:\n\ttouch stamp\n\
             out:\n\tcp in $@\n\
             %.txt: %.md\n\tpandoc $< > $@\n\
             FORCE:\n",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_aggregate_targets_are_reported() {
        let diagnostics = check(RULE, "Makefile", "all: app docs\n");
        assert_eq!(names(&diagnostics), vec!["all"]);
    }

    #[test]
    fn test_option_disables_rule() {
        let diagnostics = check_with(
            RULE,
            "Makefile",
            "clean:\n\trm -rf bin\n",
            &[("makefile.require_phony", "false")],
        );
        assert!(diagnostics.is_empty());
    }
}
