//! Rule to require a `HEALTHCHECK` instruction.

use infralint_core::model::Dockerfile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

use super::anchor_line;

/// Rule id.
pub const ID: &str = "dockerfile-missing-healthcheck";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Images should declare a `HEALTHCHECK`",
    default_severity: Severity::Info,
    options: &["require_healthcheck"],
    check: Check::Dockerfile(check),
};

fn check(model: &Dockerfile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let required = ctx
        .options
        .get_bool("require_healthcheck", ctx.config.dockerfile.require_healthcheck);
    if !required || model.is_empty() || model.has("HEALTHCHECK") {
        return Vec::new();
    }
    vec![ctx.diagnostic(anchor_line(model), 0, "no `HEALTHCHECK` instruction")]
}
