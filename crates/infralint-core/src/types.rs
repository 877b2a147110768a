//! Core types for diagnostics and run results.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Rule id stamped on diagnostics produced by a format parser.
pub const PARSE_ERROR: &str = "parse-error";
/// Rule id stamped on diagnostics for inputs that could not be loaded.
pub const LOAD_ERROR: &str = "load-error";
/// Rule id stamped on diagnostics produced while resolving configuration.
pub const CONFIG_WARNING: &str = "config-warning";
/// Rule id stamped on diagnostics for inputs cut off by the run timeout.
pub const TIMEOUT: &str = "timeout";
/// Rule id stamped on diagnostics for a worker that failed unexpectedly.
pub const INTERNAL_ERROR: &str = "internal-error";

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational suggestion, never fails a run.
    Info,
    /// Something that should be addressed.
    Warning,
    /// Something that must be fixed; fails the run.
    Error,
}

impl Severity {
    /// Parses a severity name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Upper-case label used by reporters (`INFO`, `WARNING`, `ERROR`).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single finding reported for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of this finding.
    pub severity: Severity,
    /// File the finding belongs to.
    pub path: PathBuf,
    /// Line number (1-indexed, 0 for file-level findings).
    pub line: usize,
    /// Column number (1-indexed, 0 when not applicable).
    pub column: usize,
    /// Id of the rule (or engine stage) that produced the finding.
    pub rule_id: String,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        severity: Severity,
        path: impl Into<PathBuf>,
        line: usize,
        column: usize,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            path: path.into(),
            line,
            column,
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// A parser-emitted error at the given position.
    #[must_use]
    pub fn parse_error(path: &Path, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, path, line, column, PARSE_ERROR, message)
    }

    /// A configuration warning attributed to `source`.
    #[must_use]
    pub fn config_warning(source: &Path, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, source, 0, 0, CONFIG_WARNING, message)
    }

    /// Orders diagnostics by file, line, column and rule id.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.line.cmp(&other.line))
            .then(self.column.cmp(&other.column))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}:{}:{}: {} ({})",
            self.severity.label(),
            self.path.display(),
            self.line,
            self.column,
            self.message,
            self.rule_id
        )
    }
}

/// Diagnostic counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Number of `ERROR` diagnostics.
    pub errors: usize,
    /// Number of `WARNING` diagnostics.
    pub warnings: usize,
    /// Number of `INFO` diagnostics.
    pub infos: usize,
}

impl SeverityCounts {
    /// Counts the severities of `diagnostics`.
    #[must_use]
    pub fn tally<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Self {
        let mut counts = Self::default();
        for d in diagnostics {
            match d.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.infos += 1,
            }
        }
        counts
    }
}

/// Overall outcome of a run, mapped to the process exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No `ERROR` diagnostics among processed files.
    #[default]
    Success,
    /// At least one `ERROR` diagnostic among processed files.
    Failure,
    /// Inputs failed and nothing could be processed, or the run itself failed.
    Fatal,
}

impl RunStatus {
    /// Process exit code for this status.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Fatal => 2,
        }
    }
}

/// Result of linting a set of inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics, sorted by file, line, column and rule id.
    pub diagnostics: Vec<Diagnostic>,
    /// Per-severity counts over `diagnostics`.
    pub counts: SeverityCounts,
    /// Number of files parsed and evaluated.
    pub files_checked: usize,
    /// Number of inputs skipped because their type is unknown.
    pub files_skipped: usize,
    /// Number of inputs that failed to load or timed out.
    pub files_failed: usize,
    /// Derived run status.
    pub status: RunStatus,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process exit code derived from the run status.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }

    /// Returns diagnostics produced by the given rule id.
    #[must_use]
    pub fn by_rule(&self, rule_id: &str) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.rule_id == rule_id)
            .collect()
    }

    /// Returns true if diagnostics are non-decreasing in sort order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.diagnostics
            .windows(2)
            .all(|w| w[0].sort_cmp(&w[1]) != Ordering::Greater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(path: &str, line: usize, column: usize, rule: &str) -> Diagnostic {
        Diagnostic::new(Severity::Warning, path, line, column, rule, "msg")
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn severity_parse() {
        assert_eq!(Severity::parse("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::parse("warn"), Some(Severity::Warning));
        assert_eq!(Severity::parse("Info"), Some(Severity::Info));
        assert_eq!(Severity::parse("style"), None);
    }

    #[test]
    fn sort_cmp_orders_by_file_line_column_rule() {
        let mut diagnostics = vec![
            make("b", 1, 1, "a-rule"),
            make("a", 2, 0, "a-rule"),
            make("a", 1, 5, "z-rule"),
            make("a", 1, 5, "b-rule"),
            make("a", 1, 0, "z-rule"),
        ];
        diagnostics.sort_by(Diagnostic::sort_cmp);

        let keys: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.path.display().to_string(), d.line, d.column, d.rule_id.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), 1, 0, "z-rule".to_string()),
                ("a".to_string(), 1, 5, "b-rule".to_string()),
                ("a".to_string(), 1, 5, "z-rule".to_string()),
                ("a".to_string(), 2, 0, "a-rule".to_string()),
                ("b".to_string(), 1, 1, "a-rule".to_string()),
            ]
        );
    }

    #[test]
    fn display_uses_reporter_layout() {
        let d = Diagnostic::new(
            Severity::Error,
            "app/.env",
            4,
            0,
            "env-duplicate-key",
            "duplicate key",
        );
        assert_eq!(
            d.to_string(),
            "[ERROR] app/.env:4:0: duplicate key (env-duplicate-key)"
        );
    }

    #[test]
    fn tally_counts_each_severity() {
        let diagnostics = vec![
            Diagnostic::new(Severity::Error, "f", 1, 0, "r", "m"),
            Diagnostic::new(Severity::Error, "f", 2, 0, "r", "m"),
            Diagnostic::new(Severity::Info, "f", 3, 0, "r", "m"),
        ];
        let counts = SeverityCounts::tally(&diagnostics);
        assert_eq!(counts.errors, 2);
        assert_eq!(counts.warnings, 0);
        assert_eq!(counts.infos, 1);
    }

    #[test]
    fn run_status_codes() {
        assert_eq!(RunStatus::Success.code(), 0);
        assert_eq!(RunStatus::Failure.code(), 1);
        assert_eq!(RunStatus::Fatal.code(), 2);
    }
}
