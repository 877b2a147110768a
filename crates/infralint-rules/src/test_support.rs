//! Helpers shared by rule tests.

use infralint_core::{
    evaluate, resolve, Diagnostic, Overrides, Registry, RuleDescriptor, SourceFile,
};

/// Runs `rule` alone over `text` read as `path`, returning only its
/// diagnostics.
pub fn check(rule: RuleDescriptor, path: &str, text: &str) -> Vec<Diagnostic> {
    check_with(rule, path, text, &[])
}

/// Like [`check`], with `section.key` option overrides written as TOML.
pub fn check_with(
    rule: RuleDescriptor,
    path: &str,
    text: &str,
    options: &[(&str, &str)],
) -> Vec<Diagnostic> {
    let registry = Registry::new([rule]).expect("Failed to build registry");
    let overrides = Overrides {
        options: options
            .iter()
            .map(|(key, value)| {
                let value: toml::Value = format!("v = {value}")
                    .parse::<toml::Table>()
                    .expect("Failed to parse option value")
                    .remove("v")
                    .expect("missing value");
                ((*key).to_string(), value)
            })
            .collect(),
        ..Overrides::default()
    };
    let resolution = resolve(&registry, None, &overrides).expect("Failed to resolve config");
    assert!(
        resolution.warnings.is_empty(),
        "unexpected config warnings: {:?}",
        resolution.warnings
    );

    evaluate(&SourceFile::new(path, text), &registry, &resolution.config)
        .into_iter()
        .filter(|d| d.rule_id == rule.id)
        .collect()
}

/// Line numbers of `diagnostics`.
pub fn lines(diagnostics: &[Diagnostic]) -> Vec<usize> {
    diagnostics.iter().map(|d| d.line).collect()
}
