//! Rule to require a `USER` instruction.
//!
//! # Rationale
//!
//! Without `USER` every process in the container runs as root.

use infralint_core::model::Dockerfile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

use super::anchor_line;

/// Rule id.
pub const ID: &str = "dockerfile-missing-user";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Images should switch to a non-root user with `USER`",
    default_severity: Severity::Warning,
    options: &[],
    check: Check::Dockerfile(check),
};

fn check(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    if model.is_empty() || model.has("USER") {
        return Vec::new();
    }
    vec![ctx.diagnostic(
        anchor_line(model),
        0,
        "no `USER` instruction; the container runs as root",
    )]
}
