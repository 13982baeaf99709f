//! File command for the apio launcher.
//!
//! Runs an apio command that acts on a single project file, such as
//! simulating one testbench or formatting one source file. The file is
//! passed to apio relative to the project directory.
//!
//! ```bash
//! apio-launcher file sim src/main_tb.v
//! apio-launcher file lint --env icezum src/main.v
//! ```

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

use crate::project::{CommandTemplate, TemplateContext, WorkspaceInfo};

/// Apio commands that accept a file argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileAction {
    /// Simulate a testbench and show the waveforms.
    Sim,
    /// Run a testbench.
    Test,
    /// Lint a source file.
    Lint,
    /// Format a source file.
    Format,
}

impl FileAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Sim => "sim",
            Self::Test => "test",
            Self::Lint => "lint",
            Self::Format => "format",
        }
    }
}

/// Arguments for the file command.
#[derive(Args)]
pub struct FileArgs {
    /// Apio command to run on the file.
    #[clap(value_enum)]
    pub action: FileAction,

    /// File to act on. Relative paths are resolved against the project
    /// directory.
    pub file: PathBuf,

    /// `apio.ini` env to use; `(default)` uses the project default.
    #[clap(long, short = 'e')]
    pub env: Option<String>,

    /// Project directory (defaults to the current directory).
    #[clap(long = "project-dir", short = 'p')]
    pub project_dir: Option<PathBuf>,
}

/// Executes the file command.
///
/// # Errors
///
/// Returns an error if the file does not exist, the env is unknown,
/// provisioning fails, or apio exits with a non-zero code.
pub async fn execute(args: &FileArgs) -> Result<()> {
    let dir = super::project_dir(args.project_dir.as_ref())?;
    let workspace = WorkspaceInfo::detect(&dir);
    let env = super::run::selected_env(args.env.as_deref(), &workspace)?;
    let context_path = context_path(&dir, &args.file)?;

    let provisioner = super::provisioner()?;
    let apio_bin = super::ensure_binary(&provisioner).await?;

    let context = TemplateContext {
        apio_bin,
        env,
        context_path: Some(context_path),
    };
    let argv = CommandTemplate::parse("{apio-bin}")
        .then(args.action.as_str())
        .then("{context-path} {env-flag}")
        .expand(&context);

    super::run::run_apio(&argv, &dir).await
}

/// Returns `file` relative to `dir`, or its absolute path when it lies
/// outside the project.
fn context_path(dir: &Path, file: &Path) -> Result<PathBuf> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", dir.display()))?;
    let file = dir
        .join(file)
        .canonicalize()
        .with_context(|| format!("File not found: {}", file.display()))?;
    if !file.is_file() {
        anyhow::bail!("Not a file: {}", file.display());
    }

    Ok(file
        .strip_prefix(&dir)
        .map_or_else(|_| file.clone(), Path::to_path_buf))
}
