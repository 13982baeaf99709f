#![warn(clippy::pedantic)]

//! # Apio Launcher
//!
//! The `apio-launcher` command keeps a pre-built apio binary provisioned in
//! `~/.apio/bin` and runs it inside apio projects.
//!
//! ## Subcommands
//!
//! - `install` - Provision the apio binary and print its path
//! - `run` - Run apio with the provisioned binary
//! - `file` - Run `sim`, `test`, `lint` or `format` on one project file
//! - `envs` - List the envs of an apio project
//! - `doctor` - Check installation health
//! - `version` - Display version information
//!
//! ## Examples
//!
//! Build the project in the current directory:
//! ```bash
//! apio-launcher run -- build
//! ```
//!
//! Upload using a specific `apio.ini` env:
//! ```bash
//! apio-launcher run --env icezum -- upload
//! ```
//!
//! Simulate one testbench:
//! ```bash
//! apio-launcher file sim src/main_tb.v
//! ```

mod commands;
mod errors;
mod project;
mod provision;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{doctor, envs, file, install, run, version};
use errors::LauncherError;

/// Provisions and runs the apio FPGA toolchain.
#[derive(Parser)]
#[command(
    name = "apio-launcher",
    author,
    version,
    about = "Provisions and runs the apio FPGA toolchain",
    long_about = "The 'apio-launcher' command downloads the pre-built apio bundle for this \
    platform into ~/.apio/bin, keeps it in sync with the pinned apio release, and runs it \
    inside apio projects.",
    after_help = "\
ENVIRONMENT VARIABLES:
    APIO_LAUNCHER_HOME          Install directory (default: ~/.apio)
    APIO_LAUNCHER_DIST_SERVER   Distribution server URL (default: https://github.com)
    APIO_LAUNCHER_RELEASE_REPO  Release repository (default: fpgawars/apio)
    APIO_LAUNCHER_RELEASE_TAG   Release tag, YYYY-MM-DD
    RUST_LOG                    Log filter, overrides -v"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the apio launcher.
#[derive(Subcommand)]
pub enum Commands {
    /// Provision the apio binary.
    ///
    /// Downloads and installs the apio bundle of the configured release
    /// unless the installed binary is already current, then prints its path.
    Install,

    /// Run apio with the provisioned binary.
    ///
    /// Provisions apio if needed and runs it in the project directory with
    /// the given arguments, followed by `-e <env>` when an env is selected.
    Run(run::RunArgs),

    /// Run an apio command on one project file.
    ///
    /// Passes the file relative to the project directory, followed by
    /// `-e <env>` when an env is selected.
    File(file::FileArgs),

    /// List the envs of an apio project.
    Envs(envs::EnvsArgs),

    /// Check installation health.
    Doctor,

    /// Display version information.
    Version(version::VersionArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = execute(cli.command).await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Initializes logging to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

/// Handles an error and returns the appropriate exit code.
///
/// For `ProcessExitCode` errors, returns the embedded exit code without
/// printing an error message (apio already printed its output).
/// For all other errors, prints the error and returns exit code 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(LauncherError::ProcessExitCode { code }) = e.downcast_ref::<LauncherError>() {
        return *code;
    }
    eprintln!("Error: {e:?}");
    1
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Install => install::execute().await,
        Commands::Run(args) => run::execute(&args).await,
        Commands::File(args) => file::execute(&args).await,
        Commands::Envs(args) => envs::execute(&args),
        Commands::Doctor => doctor::execute().await,
        Commands::Version(args) => version::execute(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_keeps_hyphenated_apio_args() {
        let cli = Cli::try_parse_from([
            "apio-launcher",
            "run",
            "--env",
            "icezum",
            "--",
            "build",
            "--verbose",
        ])
        .expect("Should parse");
        let Commands::Run(args) = cli.command else {
            panic!("Expected run command");
        };
        assert_eq!(args.env.as_deref(), Some("icezum"));
        assert_eq!(args.args, vec!["build", "--verbose"]);
    }

    #[test]
    fn file_parses_action_and_path() {
        let cli = Cli::try_parse_from(["apio-launcher", "file", "sim", "src/main_tb.v", "-e", "icezum"])
            .expect("Should parse");
        let Commands::File(args) = cli.command else {
            panic!("Expected file command");
        };
        assert_eq!(args.action, file::FileAction::Sim);
        assert_eq!(args.file, std::path::PathBuf::from("src/main_tb.v"));
        assert_eq!(args.env.as_deref(), Some("icezum"));

        assert!(Cli::try_parse_from(["apio-launcher", "file", "upload", "x.v"]).is_err());
    }

    #[test]
    fn verbosity_is_counted() {
        let cli = Cli::try_parse_from(["apio-launcher", "-vv", "doctor"]).expect("Should parse");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn handle_error_propagates_process_exit_code() {
        let err: anyhow::Error = LauncherError::process_exit_code(42).into();
        assert_eq!(handle_error(&err), 42);
    }
}
