//! Rule to forbid assigning the same key twice.
//!
//! Loaders disagree on whether the first or the last assignment wins, so a
//! repeated key is ambiguous.

use std::collections::HashMap;

use infralint_core::model::EnvFile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "env-duplicate-key";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "A key must be assigned only once",
    default_severity: Severity::Error,
    options: &[],
    check: Check::Env(check),
};

fn check(model: &EnvFile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut diagnostics = Vec::new();

    for assignment in &model.assignments {
        match first_seen.get(assignment.key.as_str()) {
            Some(first) => diagnostics.push(ctx.diagnostic(
                assignment.line,
                assignment.column,
                format!("key `{}` is already defined on line {first}", assignment.key),
            )),
            None => {
                first_seen.insert(&assignment.key, assignment.line);
            }
        }
    }

    diagnostics
}
