//! Locating and loading the configuration file.
//!
//! Lookup order:
//!
//! 1. `--config PATH`
//! 2. `infralint.toml` or `.infralint.toml` in the working directory
//! 3. `$INFRALINT_CONFIG_DIR/config.toml`, else `~/.infralint/config.toml`
//! 4. built-in defaults

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use infralint_core::Config;

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the working directory.
    Project(PathBuf),
    /// Found in the per-user config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// The file to read, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Loads the file, if any.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML for a
    /// [`Config`]. Unknown rules and mistyped options are not errors here;
    /// resolution turns them into warnings.
    pub fn load(&self) -> Result<Option<(PathBuf, Config)>> {
        let Some(path) = self.path() else {
            tracing::debug!("No config file found, using defaults");
            return Ok(None);
        };
        let config = Config::from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?;
        tracing::info!("Using config {}", path.display());
        Ok(Some((path.to_path_buf(), config)))
    }
}

/// Names looked for in the working directory, in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["infralint.toml", ".infralint.toml"];

/// File name inside the per-user config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Environment variable overriding the per-user config directory.
pub const CONFIG_DIR_ENV: &str = "INFRALINT_CONFIG_DIR";

/// Finds the configuration for a run started in `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

/// `resolve` with the global directory passed in, so tests need no env vars.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_file())
    {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    match global_dir.map(|dir| dir.join(GLOBAL_CONFIG_NAME)) {
        Some(candidate) if candidate.is_file() => {
            tracing::debug!("Found global config: {}", candidate.display());
            ConfigSource::Global(candidate)
        }
        _ => ConfigSource::Default,
    }
}

/// The per-user config directory: `$INFRALINT_CONFIG_DIR`, else
/// `~/.infralint/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".infralint"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("infralint.toml"), "").unwrap();

        let result = resolve_inner(project.path(), Some(Path::new("/nonexistent.toml")), None);
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn project_names_in_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".infralint.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(tmp.path(), None, None),
            ConfigSource::Project(tmp.path().join(".infralint.toml"))
        );

        fs::write(tmp.path().join("infralint.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(tmp.path(), None, None),
            ConfigSource::Project(tmp.path().join("infralint.toml"))
        );
    }

    #[test]
    fn global_is_the_fallback() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        assert_eq!(
            resolve_inner(project.path(), None, Some(global.path().to_path_buf())),
            ConfigSource::Default
        );

        fs::write(global.path().join("config.toml"), "").unwrap();
        assert_eq!(
            resolve_inner(project.path(), None, Some(global.path().to_path_buf())),
            ConfigSource::Global(global.path().join("config.toml"))
        );

        fs::write(project.path().join("infralint.toml"), "").unwrap();
        assert!(matches!(
            resolve_inner(project.path(), None, Some(global.path().to_path_buf())),
            ConfigSource::Project(_)
        ));
    }

    #[test]
    fn loads_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("infralint.toml");
        fs::write(&path, "[analyzer]\nparallelism = 3\n\n[dockerfile]\nallow_latest_tag = true\n").unwrap();

        let (loaded_from, config) = ConfigSource::Project(path.clone()).load().unwrap().unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.analyzer.parallelism, Some(3));
        assert!(config.sections.contains_key("dockerfile"));
        assert!(ConfigSource::Default.load().unwrap().is_none());
    }

    #[test]
    fn broken_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("infralint.toml");
        fs::write(&path, "[analyzer\n").unwrap();
        assert!(ConfigSource::Explicit(path).load().is_err());
        assert!(ConfigSource::Explicit(tmp.path().join("missing.toml"))
            .load()
            .is_err());
    }
}
