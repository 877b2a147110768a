//! Check command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use infralint_core::discover::discover;
use infralint_core::{resolve, Analyzer, Overrides, Severity};
use infralint_rules::builtin_registry;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Arguments of `infralint check`.
#[derive(Debug)]
pub struct CheckArgs {
    /// Files and directories to check.
    pub paths: Vec<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// Worker count, overriding `[analyzer] parallelism`.
    pub parallelism: Option<usize>,
    /// Run timeout in seconds, overriding `[analyzer] timeout_secs`.
    pub timeout: Option<u64>,
    /// Size limit, overriding `[analyzer] max_file_size`.
    pub max_file_size: Option<u64>,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
    /// Per-run rule and option overrides.
    pub overrides: Overrides,
}

/// Runs the check command and returns the process exit code.
pub async fn run(args: CheckArgs, source: &ConfigSource) -> Result<u8> {
    let registry = builtin_registry()?;
    let loaded = source.load()?;

    let mut analyzer_config = loaded
        .as_ref()
        .map(|(_, config)| config.analyzer.clone())
        .unwrap_or_default();
    analyzer_config.exclude.extend(args.exclude);

    let resolution = resolve(
        &registry,
        loaded.as_ref().map(|(path, config)| (path.as_path(), config)),
        &args.overrides,
    )?;

    let files = discover(&args.paths, &analyzer_config).context("Failed to collect input files")?;

    let mut builder = Analyzer::builder().registry(registry).resolution(resolution);
    if let Some(workers) = args.parallelism.or(analyzer_config.parallelism) {
        builder = builder.parallelism(workers);
    }
    if let Some(secs) = args.timeout.or(analyzer_config.timeout_secs) {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(bytes) = args.max_file_size.or(analyzer_config.max_file_size) {
        builder = builder.max_file_size(bytes);
    }
    let analyzer = builder.build()?;

    tracing::info!(
        "Checking {} files with {} rules",
        files.len(),
        analyzer.rule_count()
    );

    let result = analyzer.analyze(&files).await;
    super::output::print(&result, args.format)?;

    Ok(u8::try_from(result.exit_code()).unwrap_or(2))
}

/// Parses `RULE=LEVEL` for `--severity`.
///
/// # Errors
///
/// Returns a message for clap when the argument is malformed.
pub fn parse_severity_override(arg: &str) -> Result<(String, Severity), String> {
    let (rule, level) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected RULE=LEVEL, found `{arg}`"))?;
    let rule = rule.trim();
    if rule.is_empty() {
        return Err("rule id is empty".to_string());
    }
    let severity = Severity::parse(level.trim())
        .ok_or_else(|| format!("unknown severity `{level}` (expected info, warning or error)"))?;
    Ok((rule.to_string(), severity))
}

/// Parses `SECTION.KEY=VALUE` for `--set`. The value uses TOML syntax;
/// anything that is not valid TOML is taken as a plain string.
///
/// # Errors
///
/// Returns a message for clap when the argument is malformed.
pub fn parse_option_override(arg: &str) -> Result<(String, toml::Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION.KEY=VALUE, found `{arg}`"))?;
    let key = key.trim();
    if !key.contains('.') {
        return Err(format!("option `{key}` must be written as `section.key`"));
    }

    let value = format!("value = {}", raw.trim())
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.trim().to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn severity_override() {
        assert_eq!(
            parse_severity_override("dockerfile-latest-tag=ERROR"),
            Ok(("dockerfile-latest-tag".to_string(), Severity::Error))
        );
        assert!(parse_severity_override("dockerfile-latest-tag").is_err());
        assert!(parse_severity_override("=error").is_err());
        assert!(parse_severity_override("x=fatal").is_err());
    }

    #[test]
    fn option_override_values() {
        let (key, value) = parse_option_override("env.min_secret_length=12").unwrap();
        assert_eq!(key, "env.min_secret_length");
        assert_eq!(value, toml::Value::Integer(12));

        let (_, value) = parse_option_override("env.allowed_weak_patterns=[\"dev-*\"]").unwrap();
        assert_eq!(
            value,
            toml::Value::Array(vec![toml::Value::String("dev-*".into())])
        );

        let (_, value) = parse_option_override("dockerfile.allow_latest_tag=true").unwrap();
        assert_eq!(value, toml::Value::Boolean(true));

        let (_, value) = parse_option_override("env.note=plain words").unwrap();
        assert_eq!(value, toml::Value::String("plain words".into()));
    }

    #[test]
    fn option_override_needs_section() {
        assert!(parse_option_override("min_secret_length=3").is_err());
        assert!(parse_option_override("env.min_secret_length").is_err());
    }

    #[tokio::test]
    async fn exit_codes() {
        let tmp = TempDir::new().unwrap();
        let env = tmp.path().join(".env");
        fs::write(&env, "DB_PASSWORD=123456\n").unwrap();

        let args = |overrides: Overrides| CheckArgs {
            paths: vec![env.clone()],
            format: OutputFormat::Compact,
            parallelism: Some(1),
            timeout: None,
            max_file_size: None,
            exclude: Vec::new(),
            overrides,
        };

        assert_eq!(run(args(Overrides::default()), &ConfigSource::Default).await.unwrap(), 1);

        let disabled = Overrides {
            disabled: vec!["env-weak-value".into()],
            ..Overrides::default()
        };
        assert_eq!(run(args(disabled), &ConfigSource::Default).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreadable_config_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("infralint.toml");
        fs::write(&config, "not = [valid").unwrap();

        let args = CheckArgs {
            paths: vec![tmp.path().to_path_buf()],
            format: OutputFormat::Compact,
            parallelism: None,
            timeout: None,
            max_file_size: None,
            exclude: Vec::new(),
            overrides: Overrides::default(),
        };
        assert!(run(args, &ConfigSource::Explicit(config)).await.is_err());
    }
}
