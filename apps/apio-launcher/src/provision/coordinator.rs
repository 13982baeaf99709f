//! Provisioning coordinator.
//!
//! `Provisioner` is the single context object of the pipeline: it owns the
//! paths, the release selection and the detected platform, and hands out the
//! path of a ready-to-run apio binary. Installs are coalesced so at most one
//! is in flight at a time; every caller arriving meanwhile awaits the same
//! install and observes its outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use super::download::HttpFetcher;
use super::installer::Installer;
use super::metadata::{StoredMetadata, read_metadata};
use super::{ApioPaths, DownloadDescriptor, PlatformId, ReleaseConfig};
use crate::errors::ProvisionError;

type InstallFuture = Shared<BoxFuture<'static, Result<PathBuf, Arc<ProvisionError>>>>;

/// Hands out a provisioned apio binary.
pub struct Provisioner {
    paths: ApioPaths,
    release: ReleaseConfig,
    platform: PlatformId,
    fetcher: HttpFetcher,
    descriptor: OnceLock<DownloadDescriptor>,
    in_flight: Mutex<Option<InstallFuture>>,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("paths", &self.paths)
            .field("release", &self.release)
            .field("platform", &self.platform)
            .field("descriptor", &self.descriptor.get())
            .finish_non_exhaustive()
    }
}

/// Read-only view of the install state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionStatus {
    pub binary_path: PathBuf,
    /// The binary exists and is executable.
    pub binary_usable: bool,
    pub metadata: StoredMetadata,
    /// URL of the bundle the current configuration selects.
    pub expected_url: String,
}

impl ProvisionStatus {
    /// Whether `ensure_binary` would return without installing.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.binary_usable && self.metadata.url.as_deref() == Some(self.expected_url.as_str())
    }
}

impl Provisioner {
    /// Creates a provisioner for the host platform, configured from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported, the home directory
    /// cannot be determined, or the HTTP client cannot be built.
    pub fn new() -> Result<Self, ProvisionError> {
        Self::with_parts(
            ApioPaths::new()?,
            ReleaseConfig::from_env(),
            PlatformId::current()?,
        )
    }

    /// Creates a provisioner from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_parts(
        paths: ApioPaths,
        release: ReleaseConfig,
        platform: PlatformId,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            paths,
            release,
            platform,
            fetcher: HttpFetcher::new()?,
            descriptor: OnceLock::new(),
            in_flight: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn paths(&self) -> &ApioPaths {
        &self.paths
    }

    #[must_use]
    pub fn release(&self) -> &ReleaseConfig {
        &self.release
    }

    #[must_use]
    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    /// Computes the download descriptor. Must be called exactly once before
    /// `ensure_binary`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` on a second call.
    pub fn init(&self) -> Result<(), ProvisionError> {
        let descriptor = DownloadDescriptor::new(&self.release, self.platform, &self.paths);
        tracing::debug!(url = %descriptor.source_url, "provisioner initialized");
        self.descriptor
            .set(descriptor)
            .map_err(|_| ProvisionError::AlreadyInitialized)
    }

    /// Returns the descriptor computed by `init`.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`.
    pub fn descriptor(&self) -> Result<&DownloadDescriptor, ProvisionError> {
        self.descriptor.get().ok_or(ProvisionError::NotInitialized)
    }

    /// Returns the path of a ready-to-run apio binary, installing the
    /// configured bundle first when the binary is missing, not executable,
    /// or was installed from a different URL.
    ///
    /// Safe to call repeatedly and concurrently.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before `init`, or `InstallFailed` wrapping
    /// the failing install step. A failed install is not retried; the next
    /// call starts a fresh attempt.
    pub async fn ensure_binary(&self) -> Result<PathBuf, ProvisionError> {
        let descriptor = self.descriptor()?;

        if let Some(binary) = self.cached_binary(descriptor).await {
            return Ok(binary);
        }

        let install = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(pending) if pending.peek().is_none() => {
                    tracing::debug!("joining in-flight install");
                    pending.clone()
                }
                _ => {
                    // Another caller may have finished an install while we
                    // waited for the slot.
                    if let Some(binary) = self.cached_binary(descriptor).await {
                        return Ok(binary);
                    }
                    let pending = self.start_install(descriptor.clone());
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let outcome = install.clone().await;

        {
            let mut slot = self.in_flight.lock().await;
            if slot.as_ref().is_some_and(|pending| pending.ptr_eq(&install)) {
                *slot = None;
            }
        }

        outcome.map_err(|cause| ProvisionError::InstallFailed { cause })
    }

    /// Reports the install state without installing anything.
    pub async fn status(&self) -> ProvisionStatus {
        let binary_path = self.paths.binary_path(self.platform);
        ProvisionStatus {
            binary_usable: binary_usable(&binary_path, self.platform).await,
            binary_path,
            metadata: read_metadata(&self.paths.metadata_path()).await,
            expected_url: self.release.download_url(self.platform),
        }
    }

    fn start_install(&self, descriptor: DownloadDescriptor) -> InstallFuture {
        let installer = Installer::new(
            self.paths.clone(),
            self.platform,
            descriptor,
            self.fetcher.clone(),
        );

        async move {
            installer.install().await.map_err(|e| {
                tracing::error!(error = %e, "apio installation failed");
                Arc::new(e)
            })
        }
        .boxed()
        .shared()
    }

    async fn cached_binary(&self, descriptor: &DownloadDescriptor) -> Option<PathBuf> {
        let binary = self.paths.binary_path(self.platform);
        if !binary_usable(&binary, self.platform).await {
            tracing::debug!(binary = %binary.display(), "apio binary missing or not executable");
            return None;
        }

        let metadata = read_metadata(&self.paths.metadata_path()).await;
        if metadata.url.as_deref() != Some(descriptor.source_url.as_str()) {
            tracing::debug!(
                installed = metadata.url.as_deref().unwrap_or("<none>"),
                expected = %descriptor.source_url,
                "installed bundle is stale"
            );
            return None;
        }

        tracing::debug!(binary = %binary.display(), "apio binary is current");
        Some(binary)
    }
}

/// The binary exists and, outside Windows, the current user may read and
/// execute it.
async fn binary_usable(binary: &Path, platform: PlatformId) -> bool {
    let Ok(metadata) = tokio::fs::metadata(binary).await else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    if !platform.is_windows() {
        use nix::unistd::{AccessFlags, access};
        return access(binary, AccessFlags::R_OK | AccessFlags::X_OK).is_ok();
    }
    #[cfg(not(unix))]
    let _ = platform;

    true
}
