//! Rule to flag whitespace around `=`.
//!
//! `KEY = value` works in some loaders and is a syntax error when the file
//! is sourced by a shell.

use infralint_core::model::EnvFile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "env-malformed-spacing";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Assignments must not have whitespace around `=`",
    default_severity: Severity::Warning,
    options: &[],
    check: Check::Env(check),
};

fn check(model: &EnvFile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    model
        .assignments
        .iter()
        .filter_map(|a| {
            let before = a.raw_key.ends_with(char::is_whitespace);
            let after = a.raw_value.starts_with(char::is_whitespace);
            let place = match (before, after) {
                (true, true) => "around",
                (true, false) => "before",
                (false, true) => "after",
                (false, false) => return None,
            };
            Some(ctx.diagnostic(
                a.line,
                a.column,
                format!("whitespace {place} `=` in assignment to `{}`", a.key),
            ))
        })
        .collect()
}
