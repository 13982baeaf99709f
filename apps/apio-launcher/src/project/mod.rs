//! Apio project support.
//!
//! An apio project is a directory holding an `apio.ini` file. This module
//! detects projects, lists the envs they declare and expands the command
//! templates used to run apio inside them.
//!
//! ## Modules
//!
//! - [`apio_ini`] - `apio.ini` env scanning
//! - [`template`] - Command template expansion
//! - [`workspace`] - Project detection

pub mod apio_ini;
pub mod template;
pub mod workspace;

pub use apio_ini::{ENV_DEFAULT, extract_envs};
pub use template::{CommandTemplate, TemplateContext};
pub use workspace::WorkspaceInfo;
