//! Context types for rule execution.

use std::path::{Path, PathBuf};

use crate::config::{Options, ResolvedConfig};
use crate::file_type::FileType;
use crate::types::{Diagnostic, Severity};

/// A loaded input: path, immutable text and detected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as given by the caller.
    pub path: PathBuf,
    /// Full file text.
    pub text: String,
    /// Detected file type.
    pub file_type: FileType,
}

impl SourceFile {
    /// Creates a source file, detecting its type from name and content.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let file_type = FileType::detect(&path, Some(&text));
        Self {
            path,
            text,
            file_type,
        }
    }
}

/// What a rule sees besides the parsed model.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// File under evaluation.
    pub path: &'a Path,
    /// Id of the running rule.
    pub rule_id: &'a str,
    /// Resolved severity for this rule.
    pub severity: Severity,
    /// Rule-specific options.
    pub options: &'a Options,
    /// The whole resolved configuration.
    pub config: &'a ResolvedConfig,
}

impl<'a> RuleContext<'a> {
    /// Creates a new rule context.
    #[must_use]
    pub fn new(
        path: &'a Path,
        rule_id: &'a str,
        severity: Severity,
        options: &'a Options,
        config: &'a ResolvedConfig,
    ) -> Self {
        Self {
            path,
            rule_id,
            severity,
            options,
            config,
        }
    }

    /// Builds a diagnostic for the running rule at `line`/`column`.
    #[must_use]
    pub fn diagnostic(&self, line: usize, column: usize, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(
            self.severity,
            self.path,
            line,
            column,
            self.rule_id,
            message,
        )
    }
}
