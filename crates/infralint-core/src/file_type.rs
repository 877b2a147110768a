//! File type detection.
//!
//! Detection order: exact basename, then extension, then name patterns,
//! then a content sniff for crontabs. Anything else is [`FileType::Unknown`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::parser::crontab;

/// The closed set of supported config grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// `Dockerfile` / `Containerfile`.
    Dockerfile,
    /// GNU make `Makefile`.
    Makefile,
    /// dotenv `.env` file.
    Env,
    /// crontab schedule file.
    Crontab,
    /// systemd unit (`.service`, `.timer`, `.socket`).
    #[serde(rename = "systemd")]
    SystemdUnit,
    /// Anything else; skipped.
    Unknown,
}

impl FileType {
    /// All supported (non-unknown) types, in config-section order.
    pub const SUPPORTED: [FileType; 5] = [
        FileType::Dockerfile,
        FileType::Makefile,
        FileType::Env,
        FileType::Crontab,
        FileType::SystemdUnit,
    ];

    /// Name of the config section holding options for this type.
    #[must_use]
    pub fn section(self) -> &'static str {
        match self {
            Self::Dockerfile => "dockerfile",
            Self::Makefile => "makefile",
            Self::Env => "env",
            Self::Crontab => "crontab",
            Self::SystemdUnit => "systemd",
            Self::Unknown => "unknown",
        }
    }

    /// Looks a type up by its config section name.
    #[must_use]
    pub fn from_section(name: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|t| t.section() == name)
    }

    /// Detects the type of `path`, sniffing `content` only when the name
    /// is inconclusive.
    #[must_use]
    pub fn detect(path: &Path, content: Option<&str>) -> Self {
        if let Some(by_name) = Self::from_name(path) {
            return by_name;
        }
        match content {
            Some(text) if looks_like_crontab(text) => Self::Crontab,
            _ => Self::Unknown,
        }
    }

    /// Detects the type from the file name alone.
    #[must_use]
    pub fn from_name(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;

        match name {
            "Dockerfile" | "Containerfile" => return Some(Self::Dockerfile),
            "Makefile" | "makefile" | "GNUmakefile" => return Some(Self::Makefile),
            ".env" => return Some(Self::Env),
            "crontab" => return Some(Self::Crontab),
            _ => {}
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("env") => return Some(Self::Env),
            Some("mk") => return Some(Self::Makefile),
            Some("service" | "timer" | "socket") => return Some(Self::SystemdUnit),
            Some("cron") => return Some(Self::Crontab),
            Some("dockerfile") => return Some(Self::Dockerfile),
            _ => {}
        }

        if name.starts_with("Dockerfile.") || name.starts_with("Containerfile.") {
            return Some(Self::Dockerfile);
        }
        if name.starts_with(".env.") {
            return Some(Self::Env);
        }

        None
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.section())
    }
}

/// True when the first meaningful line reads like a cron schedule.
fn looks_like_crontab(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .find(|l| !crontab::is_environment_line(l))
        .is_some_and(crontab::looks_like_schedule_line)
}
