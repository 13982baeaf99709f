//! Archive extraction utilities for apio bundles.
//!
//! Windows bundles are ZIP archives, all others are gzip-compressed tarballs.
//! Paths are extracted as stored: every bundle carries a top-level `apio/`
//! directory, which the installer relies on.

use std::fs::File;
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::errors::ProvisionError;

/// Bundle archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Detects the format from the file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Extracts a bundle to `dest_dir`, choosing the format by file extension.
///
/// # Errors
///
/// Returns `UnexpectedExtension` for anything but `.zip`, `.tgz` and
/// `.tar.gz`, and an extraction or I/O error if unpacking fails.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<(), ProvisionError> {
    match ArchiveKind::from_path(archive_path) {
        Some(ArchiveKind::Zip) => extract_zip(archive_path, dest_dir),
        Some(ArchiveKind::TarGz) => extract_tar_gz(archive_path, dest_dir),
        None => Err(ProvisionError::UnexpectedExtension {
            path: archive_path.to_path_buf(),
        }),
    }
}

/// Extracts a ZIP archive to the destination directory.
///
/// Unix permission bits stored in the archive are restored.
///
/// # Errors
///
/// Returns an error if the archive cannot be read, contains an unsafe path,
/// or a file cannot be written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ProvisionError> {
    let file = File::open(archive_path).map_err(|e| {
        ProvisionError::io(format!("Failed to open archive: {}", archive_path.display()), e)
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ProvisionError::extraction(archive_path, format!("invalid ZIP archive: {e}")))?;

    create_dir(dest_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ProvisionError::extraction(archive_path, format!("entry {i}: {e}")))?;

        let Some(entry_path) = entry.enclosed_name() else {
            return Err(ProvisionError::extraction(
                archive_path,
                format!("refusing to extract unsafe path: {}", entry.name()),
            ));
        };
        ensure_relative(archive_path, &entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            create_dir(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            create_dir(parent)?;
        }

        let mut outfile = File::create(&output_path).map_err(|e| {
            ProvisionError::io(format!("Failed to create file: {}", output_path.display()), e)
        })?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| {
            ProvisionError::io(format!("Failed to extract: {}", output_path.display()), e)
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;

            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| {
                    ProvisionError::io(
                        format!("Failed to set permissions: {}", output_path.display()),
                        e,
                    )
                })?;
        }
    }

    Ok(())
}

/// Extracts a gzip-compressed tarball to the destination directory.
///
/// # Errors
///
/// Returns an error if the archive cannot be read, contains an unsafe path,
/// or an entry cannot be unpacked.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), ProvisionError> {
    create_dir(dest_dir)?;

    let file = File::open(archive_path).map_err(|e| {
        ProvisionError::io(format!("Failed to open archive: {}", archive_path.display()), e)
    })?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    let entries = archive
        .entries()
        .map_err(|e| ProvisionError::extraction(archive_path, format!("unreadable tar: {e}")))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| ProvisionError::extraction(archive_path, format!("bad tar entry: {e}")))?;

        let entry_path = entry
            .path()
            .map_err(|e| ProvisionError::extraction(archive_path, format!("bad entry path: {e}")))?
            .into_owned();
        ensure_relative(archive_path, &entry_path)?;

        // Resolves hard-link targets against dest_dir rather than the cwd.
        let unpacked = entry.unpack_in(dest_dir).map_err(|e| {
            ProvisionError::io(
                format!("Failed to extract: {}", dest_dir.join(&entry_path).display()),
                e,
            )
        })?;
        if !unpacked {
            return Err(ProvisionError::extraction(
                archive_path,
                format!("refusing to extract {}", entry_path.display()),
            ));
        }
    }

    Ok(())
}

/// Rejects absolute paths and parent directory references.
fn ensure_relative(archive_path: &Path, entry_path: &Path) -> Result<(), ProvisionError> {
    let escapes = entry_path.is_absolute()
        || entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ProvisionError::extraction(
            archive_path,
            format!(
                "refusing to extract path with parent directory or absolute reference: {}",
                entry_path.display()
            ),
        ));
    }
    Ok(())
}

fn create_dir(dir: &Path) -> Result<(), ProvisionError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ProvisionError::io(format!("Failed to create directory: {}", dir.display()), e))
}

/// Sets mode `0o755` on `path` (no-op on Windows).
///
/// # Errors
///
/// Returns an error if the permissions cannot be changed.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| ProvisionError::io(format!("Failed to set permissions: {}", path.display()), e))
}

/// Sets executable permissions (no-op on Windows).
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
pub fn set_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}

/// Clears extended attributes, such as the quarantine flag, with `xattr -c`.
///
/// Only meaningful on macOS. The caller decides whether a failure matters.
///
/// # Errors
///
/// Returns an error if `xattr` cannot be spawned or exits unsuccessfully.
pub async fn strip_extended_attributes(path: &Path) -> std::io::Result<()> {
    let output = tokio::process::Command::new("xattr")
        .arg("-c")
        .arg(path)
        .output()
        .await?;

    if output.status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "xattr exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}
