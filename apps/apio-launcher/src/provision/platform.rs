//! Platform detection for apio bundle selection.
//!
//! Maps the host OS and architecture to one of the five platform ids used in
//! apio release asset names:
//!
//! - `darwin-arm64`, `darwin-x86-64`
//! - `linux-x86-64`, `linux-aarch64`
//! - `windows-amd64`

use std::fmt;
use std::sync::OnceLock;

use crate::errors::ProvisionError;

/// A platform with a published apio bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    /// macOS on Apple Silicon
    DarwinArm64,
    /// macOS on Intel
    DarwinX86_64,
    /// Linux on `x86_64`
    LinuxX86_64,
    /// Linux on ARM64
    LinuxAarch64,
    /// Windows on `x86_64`
    WindowsAmd64,
}

impl PlatformId {
    /// Every supported platform, in release-page order.
    pub const ALL: [PlatformId; 5] = [
        Self::DarwinArm64,
        Self::DarwinX86_64,
        Self::LinuxX86_64,
        Self::LinuxAarch64,
        Self::WindowsAmd64,
    ];

    /// Maps an OS/architecture pair, in `std::env::consts` vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::UnsupportedPlatform` for any other pair.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self, ProvisionError> {
        match (os, arch) {
            ("macos", "aarch64") => Ok(Self::DarwinArm64),
            ("macos", "x86_64") => Ok(Self::DarwinX86_64),
            ("linux", "x86_64") => Ok(Self::LinuxX86_64),
            ("linux", "aarch64") => Ok(Self::LinuxAarch64),
            ("windows", "x86_64") => Ok(Self::WindowsAmd64),
            _ => Err(ProvisionError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Detects the host platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the host has no published bundle.
    pub fn detect() -> Result<Self, ProvisionError> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Returns the host platform, detecting it on the first call only.
    ///
    /// # Errors
    ///
    /// Returns an error if the host has no published bundle. Failures are
    /// not cached; they are simply reported again.
    pub fn current() -> Result<Self, ProvisionError> {
        static CURRENT: OnceLock<PlatformId> = OnceLock::new();

        if let Some(id) = CURRENT.get() {
            return Ok(*id);
        }
        let id = Self::detect()?;
        Ok(*CURRENT.get_or_init(|| id))
    }

    /// Returns the id string used in release asset names.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DarwinArm64 => "darwin-arm64",
            Self::DarwinX86_64 => "darwin-x86-64",
            Self::LinuxX86_64 => "linux-x86-64",
            Self::LinuxAarch64 => "linux-aarch64",
            Self::WindowsAmd64 => "windows-amd64",
        }
    }

    #[must_use]
    pub fn is_windows(self) -> bool {
        self.as_str().starts_with("windows-")
    }

    #[must_use]
    pub fn is_darwin(self) -> bool {
        self.as_str().starts_with("darwin-")
    }

    #[must_use]
    pub fn is_linux(self) -> bool {
        self.as_str().starts_with("linux-")
    }

    /// Returns the human-readable operating system family.
    #[must_use]
    pub fn family(self) -> &'static str {
        if self.is_linux() {
            "Linux"
        } else if self.is_darwin() {
            "macOS"
        } else {
            "Windows"
        }
    }

    /// Returns the bundle archive extension, without the leading dot.
    #[must_use]
    pub fn archive_extension(self) -> &'static str {
        if self.is_windows() { "zip" } else { "tgz" }
    }

    /// Returns the file name of an executable called `stem` on this platform.
    #[must_use]
    pub fn executable_name(self, stem: &str) -> String {
        if self.is_windows() {
            format!("{stem}.exe")
        } else {
            stem.to_string()
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
