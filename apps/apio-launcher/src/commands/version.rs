//! Version command for the apio launcher.
//!
//! Displays the launcher version. In verbose mode, also shows the build
//! commit, the detected platform and the pinned apio release.

use anyhow::Result;
use clap::Args;

use crate::provision::{PlatformId, ReleaseConfig};

/// Arguments for the version command.
#[derive(Args)]
pub struct VersionArgs {
    /// Show build, platform and release information.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

/// Executes the version command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(args: &VersionArgs) -> Result<()> {
    println!("apio-launcher {}", env!("CARGO_PKG_VERSION"));
    if args.verbose {
        print_verbose_version();
    }
    Ok(())
}

fn print_verbose_version() {
    let release = ReleaseConfig::from_env();
    println!();
    println!("Build Information:");
    println!("  Version:  {}", env!("CARGO_PKG_VERSION"));
    println!("  Commit:   {}", git_commit());
    println!("  Platform: {}", platform_string());
    println!();
    println!("Apio Release:");
    println!("  Repository: {}", release.repo);
    println!("  Tag:        {}", release.tag);
}

/// Returns the git commit hash from environment or a fallback.
fn git_commit() -> &'static str {
    option_env!("APIO_LAUNCHER_GIT_COMMIT").unwrap_or("unknown")
}

fn platform_string() -> String {
    PlatformId::current().map_or_else(
        |_| {
            format!(
                "unsupported ({}-{})",
                std::env::consts::OS,
                std::env::consts::ARCH
            )
        },
        |platform| format!("{platform} ({})", platform.family()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_with_verbose_false_succeeds() {
        assert!(execute(&VersionArgs { verbose: false }).is_ok());
    }

    #[test]
    fn execute_with_verbose_true_succeeds() {
        assert!(execute(&VersionArgs { verbose: true }).is_ok());
    }

    #[test]
    fn platform_string_is_not_empty() {
        assert!(platform_string().contains('-'));
    }

    #[test]
    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn platform_string_names_the_family() {
        assert!(platform_string().ends_with("(Linux)"));
    }

    #[test]
    fn git_commit_returns_value() {
        assert!(!git_commit().is_empty());
    }
}
