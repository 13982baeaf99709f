//! Provisioning of the apio binary.
//!
//! Downloads the platform bundle of the configured apio release, unpacks it
//! into `~/.apio/bin` and keeps it there until the configured release
//! changes.
//!
//! ## Module Structure
//!
//! - [`platform`] - Host platform identification
//! - [`paths`] - Install directory layout
//! - [`release`] - Release selection and download URLs
//! - [`metadata`] - Install metadata sidecar
//! - [`download`] - HTTP download with manual redirect handling
//! - [`archive`] - ZIP and tar.gz extraction utilities
//! - [`installer`] - The install sequence
//! - [`coordinator`] - Cache checks and install coalescing

pub mod archive;
pub mod coordinator;
pub mod download;
pub mod installer;
pub mod metadata;
pub mod paths;
pub mod platform;
pub mod release;

#[cfg(test)]
pub(crate) mod fixtures;

pub use coordinator::{ProvisionStatus, Provisioner};
pub use paths::ApioPaths;
pub use platform::PlatformId;
pub use release::{DownloadDescriptor, ReleaseConfig};
