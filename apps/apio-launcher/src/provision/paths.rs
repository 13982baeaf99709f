//! Path management for the apio installation.
//!
//! The default root directory is `~/.apio/`, which can be overridden by
//! setting the `APIO_LAUNCHER_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.apio/                       # Root directory (or APIO_LAUNCHER_HOME)
//!   tmp/                         # Downloaded bundles and extraction scratch
//!     apio/                      # Top-level directory of every bundle
//!   bin/                         # Installed bundle (replaced as a whole)
//!     apio[.exe]                 # The apio binary
//!     download-metadata.json     # URL and time of the last install
//! ```

use std::path::{Path, PathBuf};

use super::PlatformId;
use crate::errors::ProvisionError;

/// Environment variable to override the default root directory.
pub const APIO_LAUNCHER_HOME_ENV: &str = "APIO_LAUNCHER_HOME";

/// Name of the top-level directory inside every bundle archive.
pub const EXTRACTED_DIR_NAME: &str = "apio";

/// Name of the install metadata sidecar, stored next to the binary.
pub const METADATA_FILE_NAME: &str = "download-metadata.json";

/// Stem of the apio executable.
pub const BINARY_STEM: &str = "apio";

/// Paths of the apio installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApioPaths {
    /// Root directory (`~/.apio` or `APIO_LAUNCHER_HOME`).
    pub root: PathBuf,
    /// Scratch directory for downloads and extraction.
    pub tmp: PathBuf,
    /// Canonical install directory.
    pub bin: PathBuf,
}

impl ApioPaths {
    /// Creates a new `ApioPaths` instance.
    ///
    /// The root directory is determined by:
    /// 1. The `APIO_LAUNCHER_HOME` environment variable if set and non-empty
    /// 2. `~/.apio` in the user's home directory
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, ProvisionError> {
        let root = match std::env::var(APIO_LAUNCHER_HOME_ENV) {
            Ok(home) if !home.trim().is_empty() => PathBuf::from(home.trim()),
            _ => dirs::home_dir()
                .ok_or_else(|| {
                    ProvisionError::io(
                        format!(
                            "Cannot determine home directory. Set {APIO_LAUNCHER_HOME_ENV} environment variable."
                        ),
                        std::io::Error::from(std::io::ErrorKind::NotFound),
                    )
                })?
                .join(".apio"),
        };

        Ok(Self::with_root(root))
    }

    /// Creates a new `ApioPaths` instance with a specific root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            tmp: root.join("tmp"),
            bin: root.join("bin"),
            root,
        }
    }

    /// Returns the canonical path of the apio binary.
    #[must_use]
    pub fn binary_path(&self, platform: PlatformId) -> PathBuf {
        self.bin.join(platform.executable_name(BINARY_STEM))
    }

    /// Returns the path of the install metadata sidecar.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.bin.join(METADATA_FILE_NAME)
    }

    /// Returns the directory a bundle extracts to.
    #[must_use]
    pub fn extracted_dir(&self) -> PathBuf {
        self.tmp_child(EXTRACTED_DIR_NAME)
    }

    /// Returns the path of a file or directory in the scratch directory.
    #[must_use]
    pub fn tmp_child(&self, name: impl AsRef<Path>) -> PathBuf {
        self.tmp.join(name)
    }
}
