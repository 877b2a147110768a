//! Rule to forbid redefining a target.
//!
//! # Rationale
//!
//! When a single-colon target is defined twice, make keeps only one
//! recipe and prints a warning that is easy to miss.
//!
//! # Exempt
//!
//! Double-colon rules (`target::`) and special targets such as `.PHONY`,
//! which are meant to be repeated.

use std::collections::HashMap;

use infralint_core::model::Makefile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "makefile-duplicate-target";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "A target must be defined only once",
    default_severity: Severity::Error,
    options: &[],
    check: Check::Makefile(check),
};

fn check(model: &Makefile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut diagnostics = Vec::new();

    for target in &model.targets {
        if target.double_colon || target.is_special() {
            continue;
        }
        match first_seen.get(target.name.as_str()) {
            Some(first) => diagnostics.push(ctx.diagnostic(
                target.line,
                1,
                format!("target `{}` is already defined on line {first}", target.name),
            )),
            None => {
                first_seen.insert(&target.name, target.line);
            }
        }
    }

    diagnostics
}
