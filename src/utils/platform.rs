//! Per-user paths for Converso
//!
//! Settings live in a dot-directory under the user's home so the same layout
//! works on every platform:
//! - Settings: ~/.converso/settings.json
//! - Downloads: ~/Downloads/Converso

use std::path::PathBuf;
use tracing::warn;

const APP_DIR_NAME: &str = ".converso";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Returns the user's home directory, or the current directory as a last resort
fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

/// Returns the configuration directory (`~/.converso`)
pub fn config_dir() -> PathBuf {
    home_dir().join(APP_DIR_NAME)
}

/// Returns the settings file path (`~/.converso/settings.json`)
pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE_NAME)
}

/// Returns the default download directory
/// - All platforms: ~/Downloads/Converso
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .unwrap_or_else(|| home_dir().join("Downloads"))
        .join("Converso")
}
