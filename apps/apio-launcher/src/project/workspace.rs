//! Apio project detection.

use std::path::{Path, PathBuf};

/// Name of the apio project file.
pub const APIO_INI: &str = "apio.ini";

/// What is known about a candidate project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceInfo {
    pub dir: PathBuf,
    pub apio_ini_path: PathBuf,
    /// Whether the directory is an apio project.
    pub apio_ini_exists: bool,
}

impl WorkspaceInfo {
    /// Inspects `dir` for an `apio.ini` file.
    #[must_use]
    pub fn detect(dir: &Path) -> Self {
        let apio_ini_path = dir.join(APIO_INI);
        let apio_ini_exists = apio_ini_path.is_file();
        tracing::debug!(
            path = %apio_ini_path.display(),
            exists = apio_ini_exists,
            "checked for apio.ini"
        );
        Self {
            dir: dir.to_path_buf(),
            apio_ini_path,
            apio_ini_exists,
        }
    }
}
