//! Scanning of `apio.ini` for env sections.
//!
//! Only section headers are inspected; envs are declared as `[env:<name>]`.
//! This is not a general INI parser.

use std::path::Path;

/// Pseudo env selecting the project's default env.
pub const ENV_DEFAULT: &str = "(default)";

/// Returns the env names declared in `apio.ini`, in file order.
///
/// Blank lines and `;`/`#` comments are skipped. A file that cannot be read
/// yields an empty list.
#[must_use]
pub fn extract_envs(apio_ini: &Path) -> Vec<String> {
    match std::fs::read_to_string(apio_ini) {
        Ok(content) => parse_envs(&content),
        Err(e) => {
            tracing::warn!(path = %apio_ini.display(), error = %e, "failed to read apio.ini");
            Vec::new()
        }
    }
}

fn parse_envs(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';') && !line.starts_with('#'))
        .filter_map(env_header)
        .collect()
}

/// Matches `[env:<name>]` where the name is non-empty and has no `]`.
fn env_header(line: &str) -> Option<String> {
    let name = line.strip_prefix("[env:")?.strip_suffix(']')?;
    if name.is_empty() || name.contains(']') {
        return None;
    }
    Some(name.trim().to_string())
}
