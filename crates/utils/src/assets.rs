use std::path::PathBuf;

use directories::ProjectDirs;

/// Directory holding the config file and the SQLite databases.
///
/// Debug builds keep everything under `dev_assets/` in the working directory so
/// local runs never touch the user's real data.
pub fn asset_dir() -> PathBuf {
    let path = if cfg!(debug_assertions) {
        PathBuf::from("dev_assets")
    } else {
        ProjectDirs::from("app", "garden", "garden-manager")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("garden-data"))
    };

    if !path.exists() {
        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to create asset directory");
        }
    }

    path
}

pub fn config_path() -> PathBuf {
    asset_dir().join("config.json")
}
