//! Utility modules for error handling, configuration and formatting

pub mod config;
pub mod display;
pub mod error;
pub mod files;
pub mod platform;

// Re-export for convenience
pub use config::{Settings, SettingsStore, Theme};
pub use display::{format_duration, format_size, format_upload_date};
pub use error::ConversoError;
pub use files::with_extension;
pub use platform::{config_dir, default_download_dir, settings_path};
