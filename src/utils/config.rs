//! Application configuration
//!
//! Settings are a flat JSON object on disk. Loading always starts from the
//! defaults and overlays whatever keys the file provides, so keys introduced
//! by newer versions always have a value.

use crate::formats::QualityTier;
use crate::utils::error::ConversoError;
use crate::utils::platform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Download location
    pub download_location: PathBuf,

    /// Preferred video quality tier
    pub quality_preference: QualityTier,

    /// Preferred container for merged downloads
    pub output_format: String,

    /// Maximum concurrent downloads (advisory; downloads run one at a time)
    pub concurrent_downloads: u32,

    pub embed_thumbnail: bool,
    pub embed_metadata: bool,
    pub embed_chapters: bool,

    /// UI theme
    pub theme: Theme,

    pub notifications_enabled: bool,
    pub keep_history_days: u32,

    /// Output file name, with `{title}`, `{id}`, `{uploader}`, `{resolution}`
    /// and `{upload_date}` placeholders
    pub filename_template: String,

    /// Audio bitrate used when extracting audio, e.g. "192k"
    pub audio_bitrate: String,

    pub download_subtitles: bool,
    pub subtitle_languages: Vec<String>,
    pub subtitle_format: String,

    /// Retry attempts handed to yt-dlp
    pub retry_attempts: u32,

    /// Socket timeout in seconds
    pub timeout: u64,

    /// Rate limit such as "2M", or "unlimited"
    pub speed_limit: String,

    pub auto_convert: bool,
    pub extract_audio_copy: bool,
    pub normalize_audio: bool,
    pub add_to_library: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_location: platform::default_download_dir(),
            quality_preference: QualityTier::Best,
            output_format: "mp4".to_string(),
            concurrent_downloads: 3,
            embed_thumbnail: true,
            embed_metadata: true,
            embed_chapters: false,
            theme: Theme::Dark,
            notifications_enabled: true,
            keep_history_days: 30,
            filename_template: "{title}_{resolution}".to_string(),
            audio_bitrate: "192k".to_string(),
            download_subtitles: false,
            subtitle_languages: vec!["en".to_string()],
            subtitle_format: "srt".to_string(),
            retry_attempts: 3,
            timeout: 30,
            speed_limit: "unlimited".to_string(),
            auto_convert: false,
            extract_audio_copy: false,
            normalize_audio: false,
            add_to_library: false,
        }
    }
}

impl Settings {
    /// Rate limit to hand to yt-dlp, if any
    pub fn rate_limit(&self) -> Option<&str> {
        let limit = self.speed_limit.trim();
        if limit.is_empty() || limit.eq_ignore_ascii_case("unlimited") {
            None
        } else {
            Some(limit)
        }
    }

    /// Translate `filename_template` into a yt-dlp output template (without extension)
    pub fn output_template(&self) -> String {
        let template = if self.filename_template.trim().is_empty() {
            "{title}"
        } else {
            self.filename_template.trim()
        };

        template
            .replace("{title}", "%(title)s")
            .replace("{id}", "%(id)s")
            .replace("{uploader}", "%(uploader)s")
            .replace("{resolution}", "%(resolution)s")
            .replace("{upload_date}", "%(upload_date)s")
    }

    fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Names of every recognised settings key
    pub fn keys() -> Vec<String> {
        Settings::default().to_map().keys().cloned().collect()
    }
}

/// UI theme options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

/// Settings bound to the file they are persisted in
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Open the store at the default per-user location
    pub fn open_default() -> Self {
        Self::open(platform::settings_path())
    }

    /// Open the store at `path`.
    ///
    /// A missing or unreadable file yields the default settings; the problem
    /// is logged and the session continues with in-memory values.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings from {}: {:#}", path.display(), e);
                Settings::default()
            }
        };
        Self { path, settings }
    }

    /// Read settings from `path`, backfilling missing keys from the defaults
    pub fn load_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let loaded: Value = serde_json::from_str(&json).context("Settings file is not valid JSON")?;

        let Value::Object(loaded) = loaded else {
            return Err(ConversoError::Configuration(
                "settings file must contain a JSON object".to_string(),
            )
            .into());
        };

        let mut settings = Settings::default();
        for (key, value) in loaded {
            if let Err(e) = apply_key(&mut settings, &key, value) {
                warn!("Ignoring setting '{}': {}", key, e);
            }
        }
        Ok(settings)
    }

    /// Write the current settings to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.settings)
            .context("Failed to serialize settings")?;
        std::fs::write(&self.path, json)
            .map_err(|e| ConversoError::Configuration(format!("{}: {}", self.path.display(), e)))?;

        info!("Settings saved to {}", self.path.display());
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a single key as JSON
    pub fn get(&self, key: &str) -> Option<Value> {
        self.settings.to_map().remove(key)
    }

    /// Set a single key. Unknown keys and ill-typed values are rejected and
    /// leave the settings untouched.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        apply_key(&mut self.settings, key, value)?;
        Ok(())
    }

    /// Reset every key to its default and persist the result
    pub fn reset_to_defaults(&mut self) -> Result<()> {
        self.settings = Settings::default();
        self.save()
    }
}

fn apply_key(settings: &mut Settings, key: &str, value: Value) -> Result<(), ConversoError> {
    let mut map = settings.to_map();
    if !map.contains_key(key) {
        return Err(ConversoError::Configuration(format!(
            "unknown setting '{}'",
            key
        )));
    }

    map.insert(key.to_string(), value);
    let updated: Settings = serde_json::from_value(Value::Object(map))
        .map_err(|e| ConversoError::Configuration(format!("invalid value for '{}': {}", key, e)))?;
    *settings = updated;
    Ok(())
}
