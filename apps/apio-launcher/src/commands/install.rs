//! Install command for the apio launcher.
//!
//! Provisions the apio binary of the configured release and prints its path.
//! Nothing is downloaded when the installed binary is already current.
//!
//! ## Usage
//!
//! ```bash
//! apio-launcher install
//! APIO_LAUNCHER_RELEASE_TAG=2025-12-07 apio-launcher install
//! ```

use anyhow::Result;

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the platform is unsupported or the installation
/// fails.
pub async fn execute() -> Result<()> {
    let provisioner = super::provisioner()?;
    let status = provisioner.status().await;

    if status.is_current() {
        println!("apio is up to date.");
    } else {
        println!(
            "Installing apio {} for {}...",
            provisioner.release().tag,
            provisioner.platform()
        );
    }

    let binary = super::ensure_binary(&provisioner).await?;
    println!("{}", binary.display());
    Ok(())
}
