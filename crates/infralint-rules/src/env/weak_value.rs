//! Rule to flag weak secrets in `.env` files.
//!
//! # Rationale
//!
//! Default or guessable credentials committed next to the service are a
//! common way in.
//!
//! # Detected Patterns
//!
//! A key containing a sensitive marker (`password`, `secret`, `token` by
//! default, case-insensitive) whose unquoted value is
//!
//! - in the weak-value denylist,
//! - shorter than `min_secret_length` characters, or
//! - below `min_secret_entropy` bits (length times Shannon entropy per
//!   character).
//!
//! Empty values and references such as `${DB_PASSWORD}` are skipped;
//! values matching an `allowed_weak_patterns` glob are never reported.

use std::collections::HashMap;

use infralint_core::model::{Assignment, EnvFile};
use infralint_core::{Check, Diagnostic, EnvOptions, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "env-weak-value";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Secrets must not use weak, short or predictable values",
    default_severity: Severity::Error,
    options: &["check_weak_passwords"],
    check: Check::Env(check),
};

fn check(model: &EnvFile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let options = &ctx.config.env;
    if !ctx
        .options
        .get_bool("check_weak_passwords", options.check_weak_passwords)
    {
        return Vec::new();
    }

    model
        .assignments
        .iter()
        .filter(|a| is_sensitive(&a.key, options))
        .filter_map(|a| {
            weakness(a, options).map(|reason| {
                ctx.diagnostic(a.line, a.column, format!("value of `{}` {reason}", a.key))
            })
        })
        .collect()
}

fn is_sensitive(key: &str, options: &EnvOptions) -> bool {
    let key = key.to_lowercase();
    options.sensitive_markers.iter().any(|m| key.contains(m.as_str()))
}

fn weakness(assignment: &Assignment, options: &EnvOptions) -> Option<String> {
    let value = assignment.value.as_str();
    if value.is_empty() || assignment.is_reference() {
        return None;
    }
    if options.allowed_weak_patterns.iter().any(|p| p.matches(value)) {
        return None;
    }

    if options.weak_values.contains(&value.to_lowercase()) {
        return Some("is a commonly used weak secret".to_string());
    }

    let length = value.chars().count();
    if length < options.min_secret_length {
        return Some(format!(
            "is shorter than {} characters",
            options.min_secret_length
        ));
    }

    let bits = entropy_bits(value);
    if bits < options.min_secret_entropy {
        return Some(format!(
            "is too predictable ({bits:.1} bits of entropy, minimum {:.1})",
            options.min_secret_entropy
        ));
    }

    None
}

/// Total Shannon entropy of `value` in bits.
#[allow(clippy::cast_precision_loss)]
fn entropy_bits(value: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let len = value.chars().count() as f64;
    let per_char: f64 = counts
        .values()
        .map(|&n| {
            let p = n as f64 / len;
            p * (1.0 / p).log2()
        })
        .sum();
    per_char * len
}
