//! Root folder resolution and bootstrap
//!
//! Every DermaLens service stores its working data (uploads, snapshots,
//! the SQLite database) under one root folder, resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `DLENS_ROOT_FOLDER` environment variable
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "DLENS_ROOT_FOLDER";

/// Resolve the root folder from CLI argument, environment, TOML, or default
pub fn resolve_root_folder(cli_arg: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = root_folder_from_config_file() {
        return path;
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Read `root_folder` from the platform config file, if present
fn root_folder_from_config_file() -> Option<PathBuf> {
    let config_path = config_file_path()?;
    let contents = std::fs::read_to_string(&config_path).ok()?;
    let value: toml::Value = toml::from_str(&contents).ok()?;
    value
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// Platform config file location (`~/.config/dlens/config.toml` or equivalent)
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dlens").join("config.toml"))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("dlens"))
        .unwrap_or_else(|| PathBuf::from("./dlens_data"))
}

/// Create the root folder (and its uploads subdirectory) if missing
///
/// Returns the uploads directory path.
pub fn ensure_root_folder(root: &Path) -> Result<PathBuf> {
    let uploads = root.join("uploads");
    std::fs::create_dir_all(&uploads).map_err(|e| {
        Error::Config(format!(
            "Failed to create root folder {}: {}",
            root.display(),
            e
        ))
    })?;
    Ok(uploads)
}

/// Database file path within the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("dlens.db")
}
