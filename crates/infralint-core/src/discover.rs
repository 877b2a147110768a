//! Expands directory inputs into candidate files.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::file_type::FileType;

/// Errors raised while preparing discovery.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// An exclude pattern is not a valid glob.
    #[error("invalid exclude pattern `{pattern}`: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: glob::PatternError,
    },
}

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled exclude globs.
#[derive(Debug, Clone, Default)]
pub struct Excludes(Vec<Pattern>);

impl Excludes {
    /// Compiles `patterns`.
    ///
    /// # Errors
    ///
    /// Returns an error for the first invalid pattern.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, DiscoverError> {
        patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|source| DiscoverError::Pattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Whether `path` (absolute or relative to `root`) is excluded.
    #[must_use]
    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.0
            .iter()
            .any(|p| p.matches_path_with(path, MATCH) || p.matches_path_with(relative, MATCH))
    }

    /// Whether everything below directory `dir` is excluded.
    fn prunes(&self, root: &Path, dir: &Path) -> bool {
        self.matches(root, &dir.join("_"))
    }
}

/// Whether a file found by walking a directory is worth loading.
///
/// Names that detect a type qualify, as do crontab-looking names whose
/// type is only decided by content.
#[must_use]
pub fn is_candidate(path: &Path) -> bool {
    if FileType::from_name(path).is_some() {
        return true;
    }
    let in_cron_dir = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == "cron.d" || n.starts_with("cron."));
    let cron_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().contains("cron"));
    in_cron_dir || cron_name
}

/// Expands `inputs` into the files to check.
///
/// Directories are walked (hidden files included, `.gitignore` honoured
/// when configured) and filtered by [`is_candidate`] and the exclude globs;
/// each directory's files come out sorted. Anything else, including paths
/// that do not exist, is passed through so the loader can report on it.
///
/// # Errors
///
/// Returns an error if an exclude pattern is invalid.
pub fn discover(inputs: &[PathBuf], config: &AnalyzerConfig) -> Result<Vec<PathBuf>, DiscoverError> {
    let excludes = Excludes::new(&config.exclude)?;
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            files.extend(walk(input, &excludes, config.respect_gitignore));
        } else {
            files.push(input.clone());
        }
    }

    debug!("Discovered {} files from {} inputs", files.len(), inputs.len());
    Ok(files)
}

fn walk(root: &Path, excludes: &Excludes, respect_gitignore: bool) -> Vec<PathBuf> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_exclude(respect_gitignore)
        .git_global(respect_gitignore)
        .require_git(false)
        .ignore(false)
        .parents(respect_gitignore);

    let prune_root = root.to_path_buf();
    let prune = excludes.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        !(is_dir && entry.depth() > 0 && prune.prunes(&prune_root, entry.path()))
    });

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        if excludes.matches(root, path) {
            debug!("Excluding: {}", path.display());
            continue;
        }
        if is_candidate(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}
