//! Build and release identity

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "Converso Downloader";
pub const DESCRIPTION: &str = "YouTube downloader with smart search";
pub const REPO_URL: &str = "https://github.com/Converso-Empire/converso-downloader";

/// Version as shown to users, e.g. `v2.1.3`
pub fn version_string() -> String {
    format!("v{}", VERSION)
}
