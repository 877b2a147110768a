//! List rules command implementation.

use std::fmt::Write as _;

use anyhow::Result;
use infralint_core::resolve::effective_settings;
use infralint_core::{resolve, Overrides, Registry, ResolvedConfig};
use infralint_rules::builtin_registry;

use crate::config_resolver::ConfigSource;

/// Runs the list-rules command with the effective configuration.
pub fn run(source: &ConfigSource) -> Result<()> {
    let registry = builtin_registry()?;
    let loaded = source.load()?;
    let resolution = resolve(
        &registry,
        loaded.as_ref().map(|(path, config)| (path.as_path(), config)),
        &Overrides::default(),
    )?;

    print!("{}", render(&registry, &resolution.config));
    Ok(())
}

fn render(registry: &Registry, config: &ResolvedConfig) -> String {
    let settings = effective_settings(config);
    let mut out = String::new();

    let _ = writeln!(out, "Available rules:\n");
    let _ = writeln!(
        out,
        "{:<32} {:<10} {:<9} Description",
        "Id", "Type", "Severity"
    );
    let _ = writeln!(out, "{}", "-".repeat(100));

    for rule in registry.rules() {
        let (enabled, severity) = settings
            .get(rule.id)
            .copied()
            .unwrap_or((true, rule.default_severity));
        let severity = if enabled {
            severity.to_string()
        } else {
            "off".to_string()
        };
        let _ = writeln!(
            out,
            "{:<32} {:<10} {:<9} {}",
            rule.id,
            rule.applies_to().section(),
            severity,
            rule.description
        );
    }

    let _ = writeln!(out, "\nConfigure rules under [<type>.rules.<id>] in infralint.toml, e.g.:");
    let _ = writeln!(out, "  [dockerfile.rules.dockerfile-latest-tag]");
    let _ = writeln!(out, "  severity = \"error\"");
    let _ = writeln!(out, "\nOr per run: infralint check --severity RULE=LEVEL --disable RULE");
    out
}
