//! Release selection and download descriptors.
//!
//! A bundle is identified by the release repository, a date-coded release
//! tag (`YYYY-MM-DD`) and the platform id. Asset names follow
//!
//! ```text
//! <prefix>-<platform>-<YYYYMMDD>-bundle.<zip|tgz>
//! ```
//!
//! and are downloaded from
//! `<server>/<repo>/releases/download/<tag>/<asset>`. The server defaults to
//! GitHub and can be overridden via `APIO_LAUNCHER_DIST_SERVER` for testing or
//! using a mirror.

use std::path::PathBuf;

use super::{ApioPaths, PlatformId};

/// Environment variable to override the distribution server URL.
pub const DIST_SERVER_ENV: &str = "APIO_LAUNCHER_DIST_SERVER";

/// Environment variable to override the release repository.
pub const RELEASE_REPO_ENV: &str = "APIO_LAUNCHER_RELEASE_REPO";

/// Environment variable to override the release tag.
pub const RELEASE_TAG_ENV: &str = "APIO_LAUNCHER_RELEASE_TAG";

/// Default distribution server URL.
pub const DEFAULT_DIST_SERVER: &str = "https://github.com";

/// Repository hosting the pre-built apio bundles.
pub const DEFAULT_RELEASE_REPO: &str = "fpgawars/apio";

/// Release tag of the bundle this launcher is pinned to.
pub const DEFAULT_RELEASE_TAG: &str = "2026-01-30";

/// Prefix of every bundle asset name.
pub const PACKAGE_PREFIX: &str = "apio-cli";

/// Which release to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Base URL of the distribution server, without trailing slash.
    pub dist_server: String,
    /// Repository identifier, e.g. `fpgawars/apio`.
    pub repo: String,
    /// Date-coded release tag, e.g. `2025-12-07`.
    pub tag: String,
    /// Asset name prefix.
    pub package_prefix: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIST_SERVER, DEFAULT_RELEASE_REPO, DEFAULT_RELEASE_TAG)
    }
}

impl ReleaseConfig {
    #[must_use]
    pub fn new(dist_server: &str, repo: &str, tag: &str) -> Self {
        Self {
            dist_server: dist_server.trim().trim_end_matches('/').to_string(),
            repo: repo.trim().trim_matches('/').to_string(),
            tag: tag.trim().to_string(),
            package_prefix: PACKAGE_PREFIX.to_string(),
        }
    }

    /// Builds the configuration from the defaults and environment overrides.
    ///
    /// Empty or whitespace-only values are treated as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self::new(
            &var(DIST_SERVER_ENV, DEFAULT_DIST_SERVER),
            &var(RELEASE_REPO_ENV, DEFAULT_RELEASE_REPO),
            &var(RELEASE_TAG_ENV, DEFAULT_RELEASE_TAG),
        )
    }

    /// Returns the bundle asset name for `platform`.
    #[must_use]
    pub fn archive_name(&self, platform: PlatformId) -> String {
        let yyyymmdd = self.tag.replace('-', "");
        format!(
            "{}-{platform}-{yyyymmdd}-bundle.{}",
            self.package_prefix,
            platform.archive_extension()
        )
    }

    /// Returns the download URL of the bundle for `platform`.
    #[must_use]
    pub fn download_url(&self, platform: PlatformId) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.dist_server,
            self.repo,
            self.tag,
            self.archive_name(platform)
        )
    }
}

/// Where a bundle comes from and where it is downloaded to.
///
/// Pure configuration: stable for a given release and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDescriptor {
    pub source_url: String,
    pub destination_path: PathBuf,
}

impl DownloadDescriptor {
    #[must_use]
    pub fn new(release: &ReleaseConfig, platform: PlatformId, paths: &ApioPaths) -> Self {
        Self {
            source_url: release.download_url(platform),
            destination_path: paths.tmp_child(release.archive_name(platform)),
        }
    }
}
