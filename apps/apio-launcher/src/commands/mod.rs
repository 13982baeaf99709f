//! Command modules for the apio launcher.
//!
//! ## Provisioning Commands
//!
//! - [`install`] - Provision the apio binary
//! - [`doctor`] - Check installation health
//!
//! ## Project Commands
//!
//! - [`run`] - Run apio with the provisioned binary
//! - [`file`] - Run an apio command on one project file
//! - [`envs`] - List the envs of an apio project
//!
//! ## Information Commands
//!
//! - [`version`] - Display version information

pub mod doctor;
pub mod envs;
pub mod file;
pub mod install;
pub mod run;
pub mod version;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::errors::ProvisionError;
use crate::provision::Provisioner;
use crate::provision::release::{DIST_SERVER_ENV, RELEASE_TAG_ENV};

/// Creates and initializes the host provisioner.
pub(crate) fn provisioner() -> Result<Provisioner> {
    let provisioner = Provisioner::new().context("Cannot set up apio provisioning")?;
    provisioner.init()?;
    Ok(provisioner)
}

/// Resolves `--project-dir`, defaulting to the current directory.
pub(crate) fn project_dir(arg: Option<&PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Cannot determine the current directory"),
    }
}

/// Provisions the apio binary, adding a remediation hint to common failures.
pub(crate) async fn ensure_binary(provisioner: &Provisioner) -> Result<PathBuf> {
    match provisioner.ensure_binary().await {
        Ok(binary) => Ok(binary),
        Err(e) => match failure_hint(provisioner, e.root_cause()) {
            Some(hint) => Err(anyhow::Error::new(e).context(hint)),
            None => Err(e.into()),
        },
    }
}

fn failure_hint(provisioner: &Provisioner, cause: &ProvisionError) -> Option<String> {
    match cause {
        ProvisionError::HttpStatus { status: 404, .. } => Some(format!(
            "No apio bundle for {} in release {} of {}. Check {RELEASE_TAG_ENV}.",
            provisioner.platform(),
            provisioner.release().tag,
            provisioner.release().repo
        )),
        ProvisionError::Network { .. } => Some(format!(
            "Cannot reach {}. Check your connection or {DIST_SERVER_ENV}.",
            provisioner.release().dist_server
        )),
        _ => None,
    }
}
