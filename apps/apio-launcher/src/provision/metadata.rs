//! Install metadata sidecar.
//!
//! A successful install writes `download-metadata.json` next to the apio
//! binary, recording the URL the bundle came from and when it was installed:
//!
//! ```json
//! {
//!     "url": "https://github.com/fpgawars/apio/releases/download/...",
//!     "time": "2026-01-30T10:15:00.123Z"
//! }
//! ```
//!
//! The file is advisory cache-invalidation data. Reading never fails: any
//! problem degrades to "no metadata", which makes the coordinator reinstall.

use std::io::ErrorKind;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record written by a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMetadata {
    /// URL of the bundle that was installed.
    pub url: String,
    /// ISO 8601 UTC timestamp of the install.
    pub time: String,
}

impl InstallMetadata {
    /// Creates metadata for `url` stamped with the current time.
    #[must_use]
    pub fn now(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Metadata as found on disk. Every field is optional; an absent or invalid
/// file reads as the default (all `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoredMetadata {
    pub url: Option<String>,
    pub time: Option<String>,
}

/// Why a metadata file could not be loaded.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata file does not exist")]
    Missing,
    #[error("metadata file is unreadable")]
    Unreadable(#[source] std::io::Error),
    #[error("metadata file is empty")]
    Empty,
    #[error("metadata file is not valid JSON")]
    Malformed(#[source] serde_json::Error),
}

/// Loads the metadata file, reporting why it is unusable.
///
/// # Errors
///
/// Returns the reason the file could not be used.
pub async fn load_metadata(path: &Path) -> Result<StoredMetadata, MetadataError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(MetadataError::Missing),
        Err(e) => return Err(MetadataError::Unreadable(e)),
    };
    if content.trim().is_empty() {
        return Err(MetadataError::Empty);
    }
    serde_json::from_str(&content).map_err(MetadataError::Malformed)
}

/// Reads the metadata file, returning the empty default on any problem.
pub async fn read_metadata(path: &Path) -> StoredMetadata {
    match load_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!(path = %path.display(), reason = %e, "no usable install metadata");
            StoredMetadata::default()
        }
    }
}

/// Writes `data` as 4-space indented JSON with a trailing newline.
///
/// Creates parent directories as needed and overwrites an existing file.
/// Returns `false` on any error instead of failing.
pub async fn write_metadata(path: &Path, data: &InstallMetadata) -> bool {
    match try_write_metadata(path, data).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to write install metadata");
            false
        }
    }
}

async fn try_write_metadata(path: &Path, data: &InstallMetadata) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut content = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
    data.serialize(&mut serializer)?;
    content.push(b'\n');

    tokio::fs::write(path, content).await
}
