//! Error types for the apio launcher.
//!
//! `ProvisionError` covers every failure of the binary provisioning pipeline
//! (platform detection, fetching, extraction, installation). `LauncherError`
//! covers the command-line surface. Command handlers wrap both in
//! `anyhow::Error` with additional context.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Failures of the provisioning pipeline.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The host OS/architecture pair has no published apio bundle.
    #[error("unsupported platform: {os}-{arch}")]
    UnsupportedPlatform {
        /// Host operating system, as reported by `std::env::consts::OS`.
        os: String,
        /// Host architecture, as reported by `std::env::consts::ARCH`.
        arch: String,
    },

    /// `Provisioner::init` was called a second time.
    #[error("provisioner should be initialized at most once")]
    AlreadyInitialized,

    /// The provisioner was used before `Provisioner::init`.
    #[error("provisioner used before initialization")]
    NotInitialized,

    /// The redirect budget was exhausted.
    #[error("too many redirects (limit {limit}) while fetching {url}")]
    TooManyRedirects {
        /// The URL originally requested.
        url: String,
        /// The redirect budget.
        limit: u32,
    },

    /// The download URL is not a valid absolute URL.
    #[error("invalid download URL '{url}'")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// The URL parse failure.
        #[source]
        source: url::ParseError,
    },

    /// A redirect status arrived without a `Location` header.
    #[error("HTTP {status} without Location header from {url}")]
    RedirectWithoutLocation {
        /// The redirect status code.
        status: u16,
        /// The URL that answered with the redirect.
        url: String,
    },

    /// A `Location` header could not be resolved against the current URL.
    #[error("invalid redirect location '{location}' from {url}")]
    InvalidRedirect {
        /// The raw header value.
        location: String,
        /// The URL that answered with the redirect.
        url: String,
        /// The URL parse failure.
        #[source]
        source: url::ParseError,
    },

    /// Terminal, non-success HTTP status.
    #[error("HTTP error {status} from {url}")]
    HttpStatus {
        /// The status code.
        status: u16,
        /// The URL that answered.
        url: String,
    },

    /// Connection or body-stream failure.
    #[error("request to {url} failed")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    /// Filesystem failure with a description of the operation.
    #[error("{message}")]
    Io {
        /// What was being done.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The downloaded package is neither `.zip` nor `.tgz`.
    #[error("unexpected package extension: {}", path.display())]
    UnexpectedExtension {
        /// The package path.
        path: PathBuf,
    },

    /// The archive is corrupt or contains unsafe entries.
    #[error("failed to extract {}: {message}", path.display())]
    Extraction {
        /// The archive path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Extraction did not produce the conventional top-level directory.
    #[error("archive did not contain \"{name}/\" directory")]
    MissingExtractedDir {
        /// The expected directory name.
        name: String,
    },

    /// The install metadata sidecar could not be written.
    #[error("failed to write download metadata to {}", path.display())]
    MetadataWrite {
        /// The metadata file path.
        path: PathBuf,
    },

    /// The binary is absent from the freshly installed directory.
    #[error("apio binary not found after extraction: {}", path.display())]
    BinaryNotFound {
        /// The canonical binary path.
        path: PathBuf,
    },

    /// Any failure of an installation attempt, as observed by every caller
    /// that was waiting on it.
    #[error("apio binary installation failed: {cause}")]
    InstallFailed {
        /// The step failure.
        #[source]
        cause: Arc<ProvisionError>,
    },
}

impl ProvisionError {
    /// Creates a new `Io` error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `Extraction` error.
    #[must_use]
    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the step failure behind an `InstallFailed`, or `self`.
    #[must_use]
    pub fn root_cause(&self) -> &ProvisionError {
        match self {
            Self::InstallFailed { cause } => cause.root_cause(),
            other => other,
        }
    }
}

/// Failures of the command-line surface.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// The directory has no `apio.ini`.
    #[error("not an apio project (no apio.ini in {})", dir.display())]
    NotApioProject {
        /// The directory that was inspected.
        dir: PathBuf,
    },

    /// The requested env is not declared in `apio.ini`.
    #[error("unknown apio.ini env '{env}' (available: {available})")]
    UnknownEnv {
        /// The requested env name.
        env: String,
        /// Comma separated list of declared envs.
        available: String,
    },

    /// Subprocess exited with non-zero code.
    ///
    /// The child already printed its own diagnostics, so `main` propagates
    /// the code without printing anything else.
    #[error("process exited with code {code}")]
    ProcessExitCode {
        /// The exit code from the subprocess.
        code: i32,
    },
}

impl LauncherError {
    /// Creates a new `NotApioProject` error.
    #[must_use]
    pub fn not_apio_project(dir: impl Into<PathBuf>) -> Self {
        Self::NotApioProject { dir: dir.into() }
    }

    /// Creates a new `ProcessExitCode` error.
    #[must_use]
    pub const fn process_exit_code(code: i32) -> Self {
        Self::ProcessExitCode { code }
    }
}
