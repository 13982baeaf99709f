//! Run command for the apio launcher.
//!
//! Provisions the apio binary and runs it with the given arguments inside a
//! project directory.
//!
//! ## Execution Pipeline
//!
//! 1. **Validate** - Check the requested env against `apio.ini`
//! 2. **Provision** - Install or reuse the apio binary
//! 3. **Expand** - Build the argv from `{apio-bin} <args> {env-flag}`
//! 4. **Execute** - Run apio and propagate its exit code
//!
//! ```bash
//! apio-launcher run -- build
//! apio-launcher run --env icezum -- upload
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::errors::LauncherError;
use crate::project::{CommandTemplate, ENV_DEFAULT, TemplateContext, WorkspaceInfo, extract_envs};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// `apio.ini` env to use; `(default)` uses the project default.
    #[clap(long, short = 'e')]
    pub env: Option<String>,

    /// Project directory (defaults to the current directory).
    #[clap(long = "project-dir", short = 'p')]
    pub project_dir: Option<PathBuf>,

    /// Arguments passed to apio.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes the run command.
///
/// ## Exit Codes
///
/// - Returns `Ok(())` if apio succeeds
/// - Returns `Err(LauncherError::ProcessExitCode)` if apio exits with a
///   non-zero code
///
/// # Errors
///
/// Returns an error if the env is unknown, provisioning fails, or apio
/// cannot be started.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let dir = super::project_dir(args.project_dir.as_ref())?;
    let workspace = WorkspaceInfo::detect(&dir);
    let env = selected_env(args.env.as_deref(), &workspace)?;

    let provisioner = super::provisioner()?;
    let apio_bin = super::ensure_binary(&provisioner).await?;

    let context = TemplateContext {
        apio_bin,
        env,
        context_path: None,
    };
    let argv = CommandTemplate::parse("{apio-bin}")
        .with_literal_args(args.args.iter().cloned())
        .then("{env-flag}")
        .expand(&context);

    run_apio(&argv, &dir).await
}

/// Validates the requested env. Named envs require a project that declares
/// them.
pub(crate) fn selected_env(env: Option<&str>, workspace: &WorkspaceInfo) -> Result<Option<String>> {
    let Some(env) = env.map(str::trim).filter(|e| !e.is_empty() && *e != ENV_DEFAULT) else {
        return Ok(None);
    };

    if !workspace.apio_ini_exists {
        return Err(LauncherError::not_apio_project(&workspace.dir).into());
    }

    let available = extract_envs(&workspace.apio_ini_path);
    if !available.iter().any(|name| name == env) {
        return Err(LauncherError::UnknownEnv {
            env: env.to_string(),
            available: available.join(", "),
        }
        .into());
    }

    Ok(Some(env.to_string()))
}

/// Runs an expanded argv in `dir`, mapping a non-zero exit to
/// `LauncherError::ProcessExitCode`.
pub(crate) async fn run_apio(argv: &[OsString], dir: &Path) -> Result<()> {
    let Some((program, rest)) = argv.split_first() else {
        anyhow::bail!("Empty apio command line");
    };
    let program = Path::new(program);
    tracing::info!(program = %program.display(), args = ?rest, dir = %dir.display(), "running apio");

    let status = tokio::process::Command::new(program)
        .args(rest)
        .current_dir(dir)
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to execute apio at {}", program.display()))?;

    if status.success() {
        Ok(())
    } else {
        let code = status.code().unwrap_or(1);
        Err(LauncherError::process_exit_code(code).into())
    }
}
