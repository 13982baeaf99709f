//! Envs command for the apio launcher.
//!
//! Lists the envs declared in the project's `apio.ini`, preceded by the
//! `(default)` pseudo env.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::errors::LauncherError;
use crate::project::{ENV_DEFAULT, WorkspaceInfo, extract_envs};

/// Arguments for the envs command.
#[derive(Args)]
pub struct EnvsArgs {
    /// Project directory (defaults to the current directory).
    #[clap(long = "project-dir", short = 'p')]
    pub project_dir: Option<PathBuf>,
}

/// Executes the envs command.
///
/// # Errors
///
/// Returns an error if the directory is not an apio project.
pub fn execute(args: &EnvsArgs) -> Result<()> {
    let dir = super::project_dir(args.project_dir.as_ref())?;
    let workspace = WorkspaceInfo::detect(&dir);
    if !workspace.apio_ini_exists {
        return Err(LauncherError::not_apio_project(dir).into());
    }

    println!("{ENV_DEFAULT}");
    for env in extract_envs(&workspace.apio_ini_path) {
        println!("{env}");
    }
    Ok(())
}
