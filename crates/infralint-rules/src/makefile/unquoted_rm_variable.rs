//! Rule to flag recursive `rm` on unquoted variables.
//!
//! # Rationale
//!
//! `rm -rf $(BUILD_DIR)/` with an empty or space-containing variable
//! deletes far more than intended.
//!
//! # Detected Patterns
//!
//! ```text
//! clean:
//! 	rm -rf $(BUILD_DIR)
//! ```
//!
//! # Good Patterns
//!
//! ```text
//! clean:
//! 	rm -rf "$(BUILD_DIR)"
//! ```

use infralint_core::model::{Makefile, VariableRef};
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "makefile-unquoted-rm-variable";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Variables passed to `rm -r` should be quoted",
    default_severity: Severity::Warning,
    options: &[],
    check: Check::Makefile(check),
};

fn check(model: &Makefile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen_lines = Vec::new();

    for recipe in model.targets.iter().flat_map(|t| t.recipe_lines.iter()) {
        // A recipe shared by several targets is listed once per target.
        if seen_lines.contains(&recipe.line) {
            continue;
        }
        seen_lines.push(recipe.line);

        let removals: Vec<&str> = commands(&recipe.text)
            .filter(|cmd| is_recursive_rm(cmd))
            .collect();
        if removals.is_empty() {
            continue;
        }

        for var in model
            .variable_refs
            .iter()
            .filter(|v| v.line == recipe.line && !v.quoted)
            .filter(|v| removals.iter().any(|cmd| mentions(cmd, v)))
        {
            diagnostics.push(ctx.diagnostic(
                var.line,
                var.column,
                format!("`rm -r` on unquoted variable `$({})`", var.name),
            ));
        }
    }

    diagnostics
}

/// Splits a shell line into simple commands.
fn commands(text: &str) -> impl Iterator<Item = &str> {
    text.split(['&', '|', ';']).map(str::trim).filter(|c| !c.is_empty())
}

fn is_recursive_rm(command: &str) -> bool {
    let mut tokens = command
        .trim_start_matches(['@', '-', '+'])
        .split_whitespace()
        .skip_while(|t| *t == "sudo" || *t == "command");

    let is_rm = tokens
        .next()
        .is_some_and(|program| program == "rm" || program.ends_with("/rm"));

    is_rm
        && tokens.any(|t| {
            t == "--recursive"
                || (t.starts_with('-') && !t.starts_with("--") && t.contains(['r', 'R']))
        })
}

/// True if `command` references `var` outside of quotes.
fn mentions(command: &str, var: &VariableRef) -> bool {
    let forms = [format!("$({}", var.name), format!("${{{}", var.name)];
    let mut in_single = false;
    let mut in_double = false;

    for (idx, c) in command.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '$' if !in_single && !in_double => {
                let rest = &command[idx..];
                let whole_name = forms.iter().any(|f| {
                    rest.strip_prefix(f.as_str())
                        .is_some_and(|after| after.starts_with([')', '}', ':']))
                });
                if whole_name {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
