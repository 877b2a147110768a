//! Merges per-file outcomes into a [`LintResult`].

use crate::types::{Diagnostic, LintResult, RunStatus, Severity, SeverityCounts};

/// What happened to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Parsed and evaluated; diagnostics in evaluation order.
    Checked(Vec<Diagnostic>),
    /// Not a supported file type.
    Skipped,
    /// Could not be processed (load error, timeout, worker failure).
    Failed(Diagnostic),
}

/// Builds the run result.
///
/// `outcomes` must be in input order; `run_diagnostics` (config warnings)
/// are merged in before sorting. The sort is stable, so equal keys keep
/// input order.
#[must_use]
pub fn aggregate(outcomes: Vec<FileOutcome>, run_diagnostics: Vec<Diagnostic>) -> LintResult {
    let mut result = LintResult::new();
    let mut checked_error = false;
    let mut diagnostics = run_diagnostics;

    for outcome in outcomes {
        match outcome {
            FileOutcome::Checked(found) => {
                result.files_checked += 1;
                checked_error |= found.iter().any(|d| d.severity == Severity::Error);
                diagnostics.extend(found);
            }
            FileOutcome::Skipped => result.files_skipped += 1,
            FileOutcome::Failed(d) => {
                result.files_failed += 1;
                diagnostics.push(d);
            }
        }
    }

    diagnostics.sort_by(Diagnostic::sort_cmp);
    result.counts = SeverityCounts::tally(&diagnostics);
    result.diagnostics = diagnostics;
    result.status = status(result.files_checked, result.files_failed, checked_error);
    result
}

fn status(files_checked: usize, files_failed: usize, checked_error: bool) -> RunStatus {
    if files_failed > 0 && files_checked == 0 {
        RunStatus::Fatal
    } else if checked_error {
        RunStatus::Failure
    } else {
        RunStatus::Success
    }
}
