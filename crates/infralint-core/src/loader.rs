//! Source loading.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::types::{Diagnostic, Severity, LOAD_ERROR};

/// Default size limit for a single input (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Why an input could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing exists at the path.
    #[error("file not found")]
    NotFound,

    /// The path exists but is not a regular file.
    #[error("not a regular file")]
    NotAFile,

    /// The file exists but could not be read.
    #[error("cannot read file: {source}")]
    Unreadable {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The file exceeds the configured size limit.
    #[error("file is {size} bytes, larger than the {limit} byte limit")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// The file is not valid UTF-8.
    #[error("file is not valid UTF-8 (invalid byte at offset {valid_up_to})")]
    NotUtf8 {
        /// Length of the valid prefix.
        valid_up_to: usize,
    },
}

impl LoadError {
    fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Unreadable { source: err }
        }
    }

    /// Failures that mean "probably not a config file" rather than a
    /// broken input: oversized or binary content.
    #[must_use]
    pub fn is_content_rejection(&self) -> bool {
        matches!(self, Self::TooLarge { .. } | Self::NotUtf8 { .. })
    }

    /// The `load-error` diagnostic for `path`.
    #[must_use]
    pub fn to_diagnostic(&self, path: &Path) -> Diagnostic {
        Diagnostic::new(Severity::Error, path, 0, 0, LOAD_ERROR, self.to_string())
    }
}

/// Reads `path` as UTF-8 text, refusing files larger than `max_bytes`.
///
/// A leading byte-order mark is removed.
///
/// # Errors
///
/// Returns a [`LoadError`] describing why the file cannot be used.
pub async fn load(path: &Path, max_bytes: u64) -> Result<String, LoadError> {
    let metadata = tokio::fs::metadata(path).await.map_err(LoadError::from_io)?;
    if !metadata.is_file() {
        return Err(LoadError::NotAFile);
    }
    if metadata.len() > max_bytes {
        return Err(LoadError::TooLarge {
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(LoadError::from_io)?;
    decode(bytes, max_bytes)
}

fn decode(bytes: Vec<u8>, max_bytes: u64) -> Result<String, LoadError> {
    // The file may have grown between stat and read.
    let size = bytes.len() as u64;
    if size > max_bytes {
        return Err(LoadError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut text = String::from_utf8(bytes).map_err(|e| LoadError::NotUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })?;
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        fs::write(&path, "\u{feff}A=1\n").unwrap();
        assert_eq!(load(&path, DEFAULT_MAX_FILE_SIZE).await.unwrap(), "A=1\n");
    }

    #[tokio::test]
    async fn missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("nope"), DEFAULT_MAX_FILE_SIZE)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound));
        let d = err.to_diagnostic(Path::new("nope"));
        assert_eq!(d.rule_id, LOAD_ERROR);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.line, 0);
        assert_eq!(d.message, "file not found");
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let tmp = TempDir::new().unwrap();
        let err = load(tmp.path(), DEFAULT_MAX_FILE_SIZE).await.unwrap_err();
        assert!(matches!(err, LoadError::NotAFile));
    }

    #[tokio::test]
    async fn too_large() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Dockerfile");
        fs::write(&path, "FROM alpine:3\n").unwrap();
        let err = load(&path, 4).await.unwrap_err();
        assert!(matches!(err, LoadError::TooLarge { size: 14, limit: 4 }));
        assert!(err.is_content_rejection());
    }

    #[tokio::test]
    async fn not_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.bin");
        fs::write(&path, [b'o', b'k', 0xff, 0xfe]).unwrap();
        let err = load(&path, DEFAULT_MAX_FILE_SIZE).await.unwrap_err();
        assert!(matches!(err, LoadError::NotUtf8 { valid_up_to: 2 }));
        assert!(err.is_content_rejection());
    }
}
