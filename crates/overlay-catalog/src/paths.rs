//! Data directory path resolution.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the data directory.
pub const DATA_DIR_ENV_VAR: &str = "OVERLAY_DATA_DIR";

/// Directory used when neither a flag nor the environment names one.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Manifest file name looked up inside the data directory.
pub const MANIFEST_FILE: &str = "overlays.toml";

/// Resolve the data directory.
///
/// Resolution order:
/// 1. an explicit path (the `--data-dir` flag)
/// 2. `OVERLAY_DATA_DIR` environment variable
/// 3. `data/` relative to the current directory
pub fn data_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(root) = std::env::var(DATA_DIR_ENV_VAR)
        && !root.trim().is_empty()
    {
        return PathBuf::from(root);
    }
    PathBuf::from(DEFAULT_DATA_DIR)
}

pub fn manifest_path(data_dir: &Path) -> PathBuf {
    data_dir.join(MANIFEST_FILE)
}
