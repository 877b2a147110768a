//! Rule to require `Description=` in `[Unit]`.

use infralint_core::model::SystemdUnit;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "systemd-missing-description";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Units should describe themselves with `Description=`",
    default_severity: Severity::Info,
    options: &[],
    check: Check::SystemdUnit(check),
};

fn check(model: &SystemdUnit, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let described = model
        .value("Unit", "Description")
        .is_some_and(|d| !d.trim().is_empty());
    if described {
        return Vec::new();
    }

    let anchor = model
        .sections_named("Unit")
        .next()
        .or_else(|| model.sections.first());
    match anchor {
        Some(section) => vec![ctx.diagnostic(
            section.line,
            1,
            "unit has no `Description=` in `[Unit]`",
        )],
        None => Vec::new(),
    }
}
