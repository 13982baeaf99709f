//! Doctor command for the apio launcher.
//!
//! Reports the health of the apio installation without changing it.
//!
//! ## Checks Performed
//!
//! - Platform detection
//! - Apio home directory existence
//! - Apio binary presence and permissions
//! - Install metadata freshness against the configured release
//! - Another `apio` on PATH shadowing the managed one

use anyhow::Result;
use std::path::Path;

use crate::provision::paths::BINARY_STEM;
use crate::provision::{ApioPaths, PlatformId, ProvisionStatus, Provisioner};

/// Status of a doctor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorCheckStatus {
    Ok,
    Warning,
    Error,
}

/// Result of a single doctor check.
#[derive(Debug, Clone)]
pub struct DoctorCheck {
    pub name: String,
    pub status: DoctorCheckStatus,
    pub message: String,
}

impl DoctorCheck {
    #[must_use]
    pub fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, DoctorCheckStatus::Ok, message)
    }

    #[must_use]
    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, DoctorCheckStatus::Warning, message)
    }

    #[must_use]
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, DoctorCheckStatus::Error, message)
    }

    fn new(name: impl Into<String>, status: DoctorCheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns the CLI prefix for this check status.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self.status {
            DoctorCheckStatus::Ok => "[OK]",
            DoctorCheckStatus::Warning => "[WARN]",
            DoctorCheckStatus::Error => "[FAIL]",
        }
    }
}

/// Executes the doctor command.
///
/// # Errors
///
/// Never fails; problems are reported as failed checks.
#[allow(clippy::unnecessary_wraps)]
pub async fn execute() -> Result<()> {
    println!("Checking apio installation...");
    println!();

    let checks = run_all_checks().await;

    let mut has_errors = false;
    let mut has_warnings = false;
    for check in &checks {
        println!("  {} {}: {}", check.prefix(), check.name, check.message);
        match check.status {
            DoctorCheckStatus::Ok => {}
            DoctorCheckStatus::Warning => has_warnings = true,
            DoctorCheckStatus::Error => has_errors = true,
        }
    }

    println!();
    if has_errors {
        println!("Some checks failed.");
    } else if has_warnings {
        println!("Some warnings were found. Run 'apio-launcher install' to fix the installation.");
    } else {
        println!("All checks passed. apio is ready to use.");
    }

    Ok(())
}

/// Runs all doctor checks and returns the results.
pub async fn run_all_checks() -> Vec<DoctorCheck> {
    let platform = match PlatformId::current() {
        Ok(platform) => platform,
        Err(e) => {
            let supported = PlatformId::ALL.map(PlatformId::as_str);
            return vec![DoctorCheck::error(
                "Platform",
                format!("{e}. Supported: {}", supported.join(", ")),
            )];
        }
    };
    let mut checks = vec![DoctorCheck::ok("Platform", format!("Detected {platform}"))];

    let provisioner = match Provisioner::new() {
        Ok(provisioner) => provisioner,
        Err(e) => {
            checks.push(DoctorCheck::error("Apio directory", format!("Cannot determine path: {e}")));
            return checks;
        }
    };

    checks.push(check_home_directory(provisioner.paths()));
    let status = provisioner.status().await;
    checks.push(check_binary(&status));
    checks.push(check_metadata(&status));
    if let Some(check) = check_path_shadowing(&status.binary_path, platform) {
        checks.push(check);
    }
    checks
}

fn check_home_directory(paths: &ApioPaths) -> DoctorCheck {
    if paths.root.is_dir() {
        DoctorCheck::ok("Apio directory", format!("Found at {}", paths.root.display()))
    } else {
        DoctorCheck::warning(
            "Apio directory",
            format!("Not found at {}", paths.root.display()),
        )
    }
}

fn check_binary(status: &ProvisionStatus) -> DoctorCheck {
    if status.binary_usable {
        DoctorCheck::ok("Apio binary", format!("Found at {}", status.binary_path.display()))
    } else if status.binary_path.exists() {
        DoctorCheck::error(
            "Apio binary",
            format!("{} is not executable", status.binary_path.display()),
        )
    } else {
        DoctorCheck::warning(
            "Apio binary",
            format!("Not installed at {}", status.binary_path.display()),
        )
    }
}

fn check_metadata(status: &ProvisionStatus) -> DoctorCheck {
    match status.metadata.url.as_deref() {
        Some(url) if url == status.expected_url => {
            let time = status.metadata.time.as_deref().unwrap_or("unknown time");
            DoctorCheck::ok("Install metadata", format!("Current, installed {time}"))
        }
        Some(url) => DoctorCheck::warning(
            "Install metadata",
            format!("Installed from {url}, configured release is {}", status.expected_url),
        ),
        None => DoctorCheck::warning("Install metadata", "Missing or unreadable"),
    }
}

/// Reports an `apio` on PATH that is not the managed binary.
fn check_path_shadowing(managed: &Path, platform: PlatformId) -> Option<DoctorCheck> {
    let name = platform.executable_name(BINARY_STEM);
    let found = which::which(&name).ok()?;
    if found == managed {
        return Some(DoctorCheck::ok("PATH", format!("'{name}' resolves to the managed binary")));
    }
    Some(DoctorCheck::warning(
        "PATH",
        format!(
            "'{name}' on PATH resolves to {}, not the managed {}",
            found.display(),
            managed.display()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::metadata::StoredMetadata;
    use std::path::PathBuf;

    fn status(usable: bool, url: Option<&str>) -> ProvisionStatus {
        ProvisionStatus {
            binary_path: PathBuf::from("/nonexistent/.apio/bin/apio"),
            binary_usable: usable,
            metadata: StoredMetadata {
                url: url.map(str::to_string),
                time: Some("2026-01-30T10:00:00.000Z".to_string()),
            },
            expected_url: "https://example.com/a.tgz".to_string(),
        }
    }

    #[test]
    fn prefixes_match_status() {
        assert_eq!(DoctorCheck::ok("a", "b").prefix(), "[OK]");
        assert_eq!(DoctorCheck::warning("a", "b").prefix(), "[WARN]");
        assert_eq!(DoctorCheck::error("a", "b").prefix(), "[FAIL]");
    }

    #[test]
    fn missing_binary_is_a_warning() {
        let check = check_binary(&status(false, None));
        assert_eq!(check.status, DoctorCheckStatus::Warning);
        assert!(check.message.contains("Not installed"));
    }

    #[test]
    fn usable_binary_is_ok() {
        assert_eq!(
            check_binary(&status(true, None)).status,
            DoctorCheckStatus::Ok
        );
    }

    #[test]
    fn metadata_freshness_is_reported() {
        let current = check_metadata(&status(true, Some("https://example.com/a.tgz")));
        assert_eq!(current.status, DoctorCheckStatus::Ok);
        assert!(current.message.contains("2026-01-30"));

        let stale = check_metadata(&status(true, Some("https://example.com/old.tgz")));
        assert_eq!(stale.status, DoctorCheckStatus::Warning);
        assert!(stale.message.contains("old.tgz"));

        let missing = check_metadata(&status(true, None));
        assert_eq!(missing.status, DoctorCheckStatus::Warning);
    }

    #[test]
    fn home_directory_check_reports_missing_root() {
        let paths = ApioPaths::with_root(std::env::temp_dir().join(format!(
            "apio_launcher_test_doctor_{}",
            rand::random::<u64>()
        )));
        assert_eq!(
            check_home_directory(&paths).status,
            DoctorCheckStatus::Warning
        );
    }
}
