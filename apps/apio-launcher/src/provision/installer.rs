//! Installs an apio bundle into the canonical `bin/` directory.
//!
//! The bundle is downloaded and unpacked under `tmp/`, stamped with install
//! metadata and only then swapped into place with a single rename. Until
//! that rename the previous install stays fully usable, and any failure
//! before it leaves the previous install untouched.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::archive::{extract_archive, set_executable, strip_extended_attributes};
use super::download::{DEFAULT_MAX_REDIRECTS, HttpFetcher, download_file};
use super::metadata::{InstallMetadata, write_metadata};
use super::paths::{EXTRACTED_DIR_NAME, METADATA_FILE_NAME};
use super::{ApioPaths, DownloadDescriptor, PlatformId};
use crate::errors::ProvisionError;

/// Performs one full installation. Not re-entrant: callers serialize
/// installs through the coordinator.
#[derive(Debug, Clone)]
pub struct Installer {
    paths: ApioPaths,
    platform: PlatformId,
    descriptor: DownloadDescriptor,
    fetcher: HttpFetcher,
}

impl Installer {
    #[must_use]
    pub fn new(
        paths: ApioPaths,
        platform: PlatformId,
        descriptor: DownloadDescriptor,
        fetcher: HttpFetcher,
    ) -> Self {
        Self {
            paths,
            platform,
            descriptor,
            fetcher,
        }
    }

    /// Downloads, unpacks and installs the bundle, returning the path of the
    /// installed binary.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step. The previous install is
    /// only touched once the new tree is complete and stamped.
    pub async fn install(&self) -> Result<PathBuf, ProvisionError> {
        let archive_path = &self.descriptor.destination_path;

        tokio::fs::create_dir_all(&self.paths.tmp)
            .await
            .map_err(|e| {
                ProvisionError::io(
                    format!("Failed to create directory: {}", self.paths.tmp.display()),
                    e,
                )
            })?;

        tracing::info!(url = %self.descriptor.source_url, "downloading apio bundle");
        let summary = download_file(
            &self.fetcher,
            &self.descriptor.source_url,
            archive_path,
            DEFAULT_MAX_REDIRECTS,
        )
        .await?;
        tracing::debug!(
            final_url = %summary.final_url,
            redirects = summary.redirects,
            bytes = summary.bytes,
            "bundle downloaded"
        );

        if self.platform.is_darwin() {
            match strip_extended_attributes(archive_path).await {
                Ok(()) => tracing::debug!("cleared extended attributes"),
                Err(e) => tracing::warn!(
                    path = %archive_path.display(),
                    error = %e,
                    "failed to clear extended attributes"
                ),
            }
        }

        let extracted_dir = self.paths.extracted_dir();
        remove_dir_if_exists(&extracted_dir).await?;

        tracing::info!(archive = %archive_path.display(), "extracting apio bundle");
        let (archive, dest) = (archive_path.clone(), self.paths.tmp.clone());
        tokio::task::spawn_blocking(move || extract_archive(&archive, &dest))
            .await
            .map_err(|e| {
                ProvisionError::extraction(archive_path, format!("extraction task failed: {e}"))
            })??;

        if let Err(e) = tokio::fs::remove_file(archive_path).await {
            tracing::warn!(
                path = %archive_path.display(),
                error = %e,
                "failed to delete downloaded archive"
            );
        }

        if !is_dir(&extracted_dir).await {
            return Err(ProvisionError::MissingExtractedDir {
                name: EXTRACTED_DIR_NAME.to_string(),
            });
        }

        let metadata_path = extracted_dir.join(METADATA_FILE_NAME);
        let metadata = InstallMetadata::now(&self.descriptor.source_url);
        if !write_metadata(&metadata_path, &metadata).await {
            return Err(ProvisionError::MetadataWrite {
                path: metadata_path,
            });
        }

        remove_dir_if_exists(&self.paths.bin).await?;
        tokio::fs::rename(&extracted_dir, &self.paths.bin)
            .await
            .map_err(|e| {
                ProvisionError::io(
                    format!(
                        "Failed to move {} to {}",
                        extracted_dir.display(),
                        self.paths.bin.display()
                    ),
                    e,
                )
            })?;

        let binary = self.paths.binary_path(self.platform);
        if !is_file(&binary).await {
            return Err(ProvisionError::BinaryNotFound { path: binary });
        }

        if !self.platform.is_windows() {
            set_executable(&binary)?;
        }

        tracing::info!(binary = %binary.display(), "apio installed");
        Ok(binary)
    }
}

async fn remove_dir_if_exists(dir: &Path) -> Result<(), ProvisionError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionError::io(
            format!("Failed to remove directory: {}", dir.display()),
            e,
        )),
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}
