//! Core analyzer for orchestrating lint execution.
//!
//! Files are processed by a bounded pool of tokio tasks. Each task loads,
//! detects, parses and evaluates one input; results land in input-index
//! slots so the final [`LintResult`] does not depend on scheduling.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, FileOutcome};
use crate::config::ResolvedConfig;
use crate::context::SourceFile;
use crate::engine;
use crate::error::FatalRunError;
use crate::file_type::FileType;
use crate::loader::{self, DEFAULT_MAX_FILE_SIZE};
use crate::resolve::Resolution;
use crate::rule::Registry;
use crate::types::{Diagnostic, LintResult, Severity, INTERNAL_ERROR, TIMEOUT};

/// Errors that can occur while building an analyzer.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum AnalyzerError {
    /// No registry was supplied.
    #[error("no rule registry configured")]
    #[diagnostic(code(infralint::analyzer::no_registry))]
    MissingRegistry,

    /// The registry or its defaults are unusable.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fatal(#[from] FatalRunError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    registry: Option<Arc<Registry>>,
    config: Option<ResolvedConfig>,
    run_diagnostics: Vec<Diagnostic>,
    parallelism: Option<usize>,
    timeout: Option<Duration>,
    max_file_size: Option<u64>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule registry.
    #[must_use]
    pub fn registry(mut self, registry: impl Into<Arc<Registry>>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Sets the resolved configuration.
    #[must_use]
    pub fn config(mut self, config: ResolvedConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses a resolution: its configuration plus its warnings, which are
    /// reported with every run.
    #[must_use]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.config = Some(resolution.config);
        self.run_diagnostics.extend(resolution.warnings);
        self
    }

    /// Sets the maximum number of files processed at once (minimum 1).
    #[must_use]
    pub fn parallelism(mut self, workers: usize) -> Self {
        self.parallelism = Some(workers);
        self
    }

    /// Sets the run-wide timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the largest file size that will be loaded.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if no registry was set, or if the configuration
    /// has to be derived from broken built-in defaults.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let registry = self.registry.ok_or(AnalyzerError::MissingRegistry)?;
        let config = match self.config {
            Some(config) => config,
            None => crate::resolve::defaults(&registry)?,
        };

        Ok(Analyzer {
            registry,
            config: Arc::new(config),
            run_diagnostics: self.run_diagnostics,
            parallelism: self.parallelism.unwrap_or_else(default_parallelism).max(1),
            timeout: self.timeout,
            max_file_size: self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
        })
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    registry: Arc<Registry>,
    config: Arc<ResolvedConfig>,
    run_diagnostics: Vec<Diagnostic>,
    parallelism: usize,
    timeout: Option<Duration>,
    max_file_size: u64,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the worker count.
    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Returns the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Analyzes `inputs` and returns the aggregated result.
    ///
    /// Repeated paths are processed once. Load failures, timeouts and
    /// worker failures become diagnostics; the run itself never fails.
    ///
    /// On timeout, files still loading are cancelled and files not yet
    /// evaluated are never evaluated. A file whose rules are already running
    /// on the blocking pool cannot be interrupted: that evaluation finishes
    /// in the background and its result is discarded.
    pub async fn analyze(&self, inputs: &[PathBuf]) -> LintResult {
        let inputs = dedup(inputs);
        info!(
            "Starting analysis of {} inputs with {} workers",
            inputs.len(),
            self.parallelism
        );

        let outcomes = self.run_pool(&inputs).await;
        let result = aggregate(outcomes, self.run_diagnostics.clone());

        info!(
            "Analysis complete: {} diagnostics in {} files ({} skipped, {} failed)",
            result.diagnostics.len(),
            result.files_checked,
            result.files_skipped,
            result.files_failed
        );
        result
    }

    /// Checks in-memory text as if it were read from `path`.
    #[must_use]
    pub fn check_text(&self, path: impl Into<PathBuf>, text: impl Into<String>) -> LintResult {
        let source = SourceFile::new(path, text);
        let outcome = engine::check_source(&source, &self.registry, &self.config);
        aggregate(vec![outcome], self.run_diagnostics.clone())
    }

    async fn run_pool(&self, inputs: &[PathBuf]) -> Vec<FileOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let started: Arc<Vec<AtomicBool>> =
            Arc::new(inputs.iter().map(|_| AtomicBool::new(false)).collect());
        let mut slots: Vec<Option<FileOutcome>> = vec![None; inputs.len()];
        let mut tasks = JoinSet::new();
        let deadline = self.timeout.map(|t| Instant::now() + t);

        for (idx, path) in inputs.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let started = Arc::clone(&started);
            let registry = Arc::clone(&self.registry);
            let config = Arc::clone(&self.config);
            let path = path.clone();
            let max_file_size = self.max_file_size;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, internal_error(&path, "worker pool closed"));
                };
                started[idx].store(true, Ordering::SeqCst);
                (idx, process(path, registry, config, max_file_size, deadline).await)
            });
        }

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!("Run timeout reached; aborting outstanding files");
                        tasks.abort_all();
                        while let Some(joined) = tasks.join_next().await {
                            if let Ok((idx, outcome)) = joined {
                                slots[idx] = Some(outcome);
                            }
                        }
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            match next {
                Some(Ok((idx, outcome))) => slots[idx] = Some(outcome),
                Some(Err(e)) => warn!("Worker task failed: {e}"),
                None => break,
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    let path = &inputs[idx];
                    if self.timeout.is_some() {
                        timed_out(path, started[idx].load(Ordering::SeqCst))
                    } else {
                        internal_error(path, "worker stopped without a result")
                    }
                })
            })
            .collect()
    }
}

async fn process(
    path: PathBuf,
    registry: Arc<Registry>,
    config: Arc<ResolvedConfig>,
    max_file_size: u64,
    deadline: Option<Instant>,
) -> FileOutcome {
    let text = match loader::load(&path, max_file_size).await {
        Ok(text) => text,
        Err(e) if e.is_content_rejection() && FileType::from_name(&path).is_none() => {
            debug!("Skipping {}: {e}", path.display());
            return FileOutcome::Skipped;
        }
        Err(e) => {
            warn!("Failed to load {}: {e}", path.display());
            return FileOutcome::Failed(e.to_diagnostic(&path));
        }
    };

    let source = SourceFile::new(path.clone(), text);
    if source.file_type == FileType::Unknown {
        debug!("Skipping {}: unknown file type", path.display());
        return FileOutcome::Skipped;
    }

    if deadline.is_some_and(|d| Instant::now() >= d) {
        return timed_out(&path, true);
    }

    let evaluated =
        tokio::task::spawn_blocking(move || engine::check_source(&source, &registry, &config)).await;
    match evaluated {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Evaluation of {} failed: {e}", path.display());
            internal_error(&path, format!("rule evaluation failed: {e}"))
        }
    }
}

fn timed_out(path: &Path, started: bool) -> FileOutcome {
    let message = if started {
        "run timed out while this file was being processed"
    } else {
        "run timed out before this file was started"
    };
    FileOutcome::Failed(Diagnostic::new(
        Severity::Error,
        path,
        0,
        0,
        TIMEOUT,
        message,
    ))
}

fn internal_error(path: &Path, message: impl Into<String>) -> FileOutcome {
    FileOutcome::Failed(Diagnostic::new(
        Severity::Error,
        path,
        0,
        0,
        INTERNAL_ERROR,
        message,
    ))
}

fn dedup(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter(|p| seen.insert(p.as_path()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RuleContext;
    use crate::model::EnvFile;
    use crate::rule::{Check, RuleDescriptor};
    use crate::types::{RunStatus, LOAD_ERROR};
    use std::fs;
    use tempfile::TempDir;

    fn every_key(model: &EnvFile, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        model
            .assignments
            .iter()
            .map(|a| ctx.diagnostic(a.line, a.column, a.key.clone()))
            .collect()
    }

    fn boom(_: &EnvFile, _: &RuleContext<'_>) -> Vec<Diagnostic> {
        panic!("rule bug")
    }

    fn registry() -> Registry {
        Registry::new([RuleDescriptor {
            id: "every-key",
            description: "",
            default_severity: Severity::Warning,
            options: &[],
            check: Check::Env(every_key),
        }])
        .unwrap()
    }

    fn analyzer(workers: usize) -> Analyzer {
        Analyzer::builder()
            .registry(registry())
            .parallelism(workers)
            .build()
            .expect("Failed to build analyzer")
    }

    #[test]
    fn test_builder() {
        let analyzer = analyzer(0);
        assert_eq!(analyzer.parallelism(), 1);
        assert_eq!(analyzer.rule_count(), 1);
        assert!(matches!(
            Analyzer::builder().build(),
            Err(AnalyzerError::MissingRegistry)
        ));
    }

    #[tokio::test]
    async fn analyzes_files_and_skips_unknown() {
        let tmp = TempDir::new().unwrap();
        let env = tmp.path().join(".env");
        let readme = tmp.path().join("README.md");
        fs::write(&env, "A=1\nB=2\n").unwrap();
        fs::write(&readme, "# hi\n").unwrap();

        let result = analyzer(2).analyze(&[env.clone(), readme, env]).await;
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.files_skipped, 1);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn missing_input_becomes_load_error() {
        let tmp = TempDir::new().unwrap();
        let env = tmp.path().join(".env");
        fs::write(&env, "A=1\n").unwrap();

        let result = analyzer(1)
            .analyze(&[tmp.path().join("missing.env"), env])
            .await;
        assert_eq!(result.files_failed, 1);
        assert_eq!(result.by_rule(LOAD_ERROR).len(), 1);
        assert_eq!(result.exit_code(), 0);
    }

    #[tokio::test]
    async fn binary_unknown_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let blob = tmp.path().join("image.png");
        fs::write(&blob, [0x89, b'P', b'N', b'G', 0xff]).unwrap();

        let result = analyzer(1).analyze(&[blob]).await;
        assert_eq!(result.files_skipped, 1);
        assert!(result.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn panicking_rule_is_internal_error() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join(".env");
        fs::write(&bad, "A=1\n").unwrap();
        let good = tmp.path().join("svc.service");
        fs::write(&good, "[Unit]\n").unwrap();

        let registry = Registry::new([RuleDescriptor {
            id: "boom",
            description: "",
            default_severity: Severity::Info,
            options: &[],
            check: Check::Env(boom),
        }])
        .unwrap();
        let analyzer = Analyzer::builder().registry(registry).build().unwrap();

        let result = analyzer.analyze(&[bad, good]).await;
        assert_eq!(result.by_rule(INTERNAL_ERROR).len(), 1);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.files_failed, 1);
    }

    #[tokio::test]
    async fn zero_timeout_reports_every_file() {
        let tmp = TempDir::new().unwrap();
        let inputs: Vec<PathBuf> = (0..4)
            .map(|i| {
                let p = tmp.path().join(format!("{i}.env"));
                fs::write(&p, "A=1\n").unwrap();
                p
            })
            .collect();

        let analyzer = Analyzer::builder()
            .registry(registry())
            .parallelism(1)
            .timeout(Duration::ZERO)
            .build()
            .unwrap();
        let result = analyzer.analyze(&inputs).await;

        // Files that finished keep their diagnostics; the rest time out.
        assert_eq!(result.files_checked + result.files_failed, 4);
        assert_eq!(result.by_rule(TIMEOUT).len(), result.files_failed);
        assert!(result.is_sorted());
    }

    #[tokio::test]
    async fn elapsed_deadline_skips_evaluation() {
        let tmp = TempDir::new().unwrap();
        let env = tmp.path().join(".env");
        fs::write(&env, "A=1\n").unwrap();

        let outcome = process(
            env.clone(),
            Arc::new(registry()),
            Arc::new(ResolvedConfig::default()),
            DEFAULT_MAX_FILE_SIZE,
            Some(Instant::now()),
        )
        .await;
        let FileOutcome::Failed(diagnostic) = outcome else {
            panic!("expected a timeout, got {outcome:?}");
        };
        assert_eq!(diagnostic.rule_id, TIMEOUT);
        assert_eq!(diagnostic.path, env);
        assert!(diagnostic.message.contains("being processed"));
    }

    #[test]
    fn check_text_runs_synchronously() {
        let result = analyzer(1).check_text("prod.env", "TOKEN=x\n");
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.by_rule("every-key").len(), 1);
    }
}
