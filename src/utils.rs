//! Shared utility functions for the CLI and TUI interfaces.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable naming the export directory.
pub const EXPORT_DIR_ENV_VAR: &str = "TAGSCOPE_EXPORT_DIR";

/// Gets the directory exports are written to.
///
/// Resolution order:
/// - `TAGSCOPE_EXPORT_DIR`, when set and non-empty
/// - the platform download directory (`~/Downloads` on most systems)
/// - the current working directory
///
/// # Errors
///
/// Returns an error only when every option is exhausted and the current
/// directory cannot be determined.
pub fn get_export_directory() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(EXPORT_DIR_ENV_VAR)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    if let Some(dir) = dirs::download_dir() {
        return Ok(dir);
    }

    std::env::current_dir().context("Failed to determine current directory")
}
