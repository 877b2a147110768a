//! Rendering of lint results.

use std::fmt::Write as _;
use std::io::IsTerminal;

use anyhow::Result;
use infralint_core::{LintResult, Severity};

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(result, std::io::stdout().is_terminal()),
        OutputFormat::Json => render_json(result)?,
        OutputFormat::Compact => render_compact(result),
    };
    print!("{rendered}");
    Ok(())
}

fn paint(severity: Severity, color: bool) -> String {
    let label = severity.label();
    if !color {
        return format!("[{label}]");
    }
    let code = match severity {
        Severity::Error => "31",
        Severity::Warning => "33",
        Severity::Info => "34",
    };
    format!("\x1b[{code}m[{label}]\x1b[0m")
}

/// `[SEVERITY] path:line:column: message` lines plus a summary.
pub fn render_text(result: &LintResult, color: bool) -> String {
    let mut out = String::new();

    for d in &result.diagnostics {
        let _ = writeln!(
            out,
            "{} {}:{}:{}: {}",
            paint(d.severity, color),
            d.path.display(),
            d.line,
            d.column,
            d.message
        );
    }

    if !result.diagnostics.is_empty() {
        out.push('\n');
    }
    let _ = write!(
        out,
        "Found {} error(s), {} warning(s), {} info(s) in {} file(s)",
        result.counts.errors, result.counts.warnings, result.counts.infos, result.files_checked
    );
    if result.files_skipped > 0 || result.files_failed > 0 {
        let _ = write!(
            out,
            " ({} skipped, {} failed)",
            result.files_skipped, result.files_failed
        );
    }
    out.push('\n');
    out
}

/// Pretty-printed JSON of the whole result.
pub fn render_json(result: &LintResult) -> Result<String> {
    let mut json = serde_json::to_string_pretty(result)?;
    json.push('\n');
    Ok(json)
}

/// `path:line:column: severity [rule-id] message`, one per line.
pub fn render_compact(result: &LintResult) -> String {
    let mut out = String::new();
    for d in &result.diagnostics {
        let _ = writeln!(
            out,
            "{}:{}:{}: {} [{}] {}",
            d.path.display(),
            d.line,
            d.column,
            d.severity,
            d.rule_id,
            d.message
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use infralint_core::{aggregate, Diagnostic, FileOutcome};

    fn sample() -> LintResult {
        aggregate(
            vec![
                FileOutcome::Checked(vec![
                    Diagnostic::new(
                        Severity::Error,
                        ".env",
                        2,
                        1,
                        "env-weak-value",
                        "value of `DB_PASSWORD` is a commonly used weak secret",
                    ),
                    Diagnostic::new(
                        Severity::Info,
                        ".env",
                        1,
                        0,
                        "env-example",
                        "example",
                    ),
                ]),
                FileOutcome::Skipped,
            ],
            Vec::new(),
        )
    }

    #[test]
    fn text_output() {
        insta::assert_snapshot!(render_text(&sample(), false), @r"
        [INFO] .env:1:0: example
        [ERROR] .env:2:1: value of `DB_PASSWORD` is a commonly used weak secret

        Found 1 error(s), 0 warning(s), 1 info(s) in 1 file(s) (1 skipped, 0 failed)
        ");
    }

    #[test]
    fn text_output_without_findings() {
        let result = aggregate(Vec::new(), Vec::new());
        assert_eq!(
            render_text(&result, false),
            "Found 0 error(s), 0 warning(s), 0 info(s) in 0 file(s)\n"
        );
    }

    #[test]
    fn colored_labels() {
        assert_eq!(paint(Severity::Error, true), "\x1b[31m[ERROR]\x1b[0m");
    }

    #[test]
    fn compact_output() {
        insta::assert_snapshot!(render_compact(&sample()), @r"
        .env:1:0: info [env-example] example
        .env:2:1: error [env-weak-value] value of `DB_PASSWORD` is a commonly used weak secret
        ");
    }

    #[test]
    fn json_output() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["counts"]["errors"], 1);
        assert_eq!(json["files_skipped"], 1);
        assert_eq!(json["diagnostics"][1]["rule_id"], "env-weak-value");
        assert_eq!(json["diagnostics"][1]["severity"], "error");
    }
}
