//! Rule to flag jobs scheduled every minute.
//!
//! An every-minute minute field is usually a forgotten placeholder. It is
//! reported even when other fields narrow the schedule (`* 3 * * *` runs
//! sixty times between 03:00 and 03:59).

use infralint_core::model::Crontab;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "crontab-every-minute";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Jobs should not run every minute",
    default_severity: Severity::Info,
    options: &[],
    check: Check::Crontab(check),
};

const EVERY_MINUTE: &[&str] = &["*", "*/1", "0-59", "0-59/1"];

fn check(model: &Crontab, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    model
        .entries
        .iter()
        .filter(|e| !e.is_reboot() && EVERY_MINUTE.contains(&e.minute.as_str()))
        .map(|e| {
            ctx.diagnostic(
                e.line,
                0,
                format!("job `{}` runs every minute", short(&e.command)),
            )
        })
        .collect()
}

fn short(command: &str) -> String {
    const MAX: usize = 40;
    if command.chars().count() <= MAX {
        command.to_string()
    } else {
        let head: String = command.chars().take(MAX).collect();
        format!("{head}...")
    }
}
