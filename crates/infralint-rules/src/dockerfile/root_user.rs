//! Rule to flag images whose final user is root.
//!
//! Only `USER` instructions after the last `FROM` matter: earlier stages
//! never run in the final image.

use infralint_core::model::Dockerfile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "dockerfile-root-user";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "The final `USER` of an image should not be root",
    default_severity: Severity::Warning,
    options: &[],
    check: Check::Dockerfile(check),
};

fn check(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let final_stage_start = model.last_from().map_or(0, |from| from.line);
    let last_user = model
        .instructions_named("USER")
        .filter(|i| i.line >= final_stage_start)
        .last();

    let Some(user) = last_user else {
        return Vec::new();
    };
    let name = user
        .arguments
        .split_whitespace()
        .next()
        .and_then(|spec| spec.split(':').next())
        .unwrap_or_default();

    if name == "root" || name == "0" {
        vec![ctx.diagnostic(
            user.line,
            user.column,
            format!("the final `USER {name}` runs the container as root"),
        )]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::check;

    #[test]
    fn test_detects_root() {
        let diagnostics = check(
            RULE,
            "Dockerfile",
            "FROM debian:12\nUSER app\nRUN id\nUSER root:root\n",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 4);
    }

    #[test]
    fn test_detects_uid_zero() {
        assert_eq!(check(RULE, "Dockerfile", "FROM debian:12\nUSER 0\n").len(), 1);
    }

    #[test]
    fn test_dropping_privileges_is_fine() {
        let diagnostics = check(
            RULE,
            "Dockerfile",
            "FROM debian:12\nUSER root\nRUN apt-get update\nUSER 1000:1000\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_earlier_stages_are_ignored() {
        let diagnostics = check(
            RULE,
            "Dockerfile",
            "FROM debian:12 AS build\nUSER root\nFROM gcr.io/distroless/static:nonroot\n",
        );
        assert!(diagnostics.is_empty());
    }
}
