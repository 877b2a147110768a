//! Rule to require portable variable names.

use infralint_core::model::EnvFile;
use infralint_core::{Check, Diagnostic, RuleContext, RuleDescriptor, Severity};

/// Rule id.
pub const ID: &str = "env-invalid-key";

/// Registration entry.
pub const RULE: RuleDescriptor = RuleDescriptor {
    id: ID,
    description: "Keys must match `[A-Za-z_][A-Za-z0-9_]*`",
    default_severity: Severity::Warning,
    options: &[],
    check: Check::Env(check),
};

fn check(model: &EnvFile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    model
        .assignments
        .iter()
        .filter(|a| !is_valid_key(&a.key))
        .map(|a| {
            ctx.diagnostic(
                a.line,
                a.column,
                format!("`{}` is not a valid variable name", a.key),
            )
        })
        .collect()
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, lines};

    #[test]
    fn test_detects_invalid_keys() {
        let diagnostics = check(RULE, ".env", "1ST=a\nMY-KEY=b\nok_key=c\n_PRIVATE=d\nA.B=e\n");
        assert_eq!(lines(&diagnostics), vec![1, 2, 5]);
    }

    #[test]
    fn test_key_rules() {
        assert!(is_valid_key("DATABASE_URL"));
        assert!(!is_valid_key("DATABASE URL"));
        assert!(!is_valid_key("ÄPFEL"));
    }
}
