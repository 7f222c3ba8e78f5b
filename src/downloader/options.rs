//! Typed download options
//!
//! A closed set of named fields with defaults. Deserialization rejects
//! unknown keys and `validate` rejects values yt-dlp would choke on.

use crate::utils::config::Settings;
use crate::utils::error::ConversoError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Containers accepted for merged output
pub const MERGE_CONTAINERS: [&str; 6] = ["mp4", "mkv", "webm", "mov", "avi", "flv"];

/// Subtitle formats accepted for conversion
pub const SUBTITLE_FORMATS: [&str; 5] = ["srt", "vtt", "ass", "lrc", "best"];

lazy_static! {
    static ref AUDIO_QUALITY: Regex = Regex::new(r"^\d{1,4}[kK]?$").unwrap();
    static ref LANGUAGE_CODE: Regex = Regex::new(r"^(all|[A-Za-z]{2,3}(-[A-Za-z0-9]+)*)$").unwrap();
}

/// Target codec for audio extraction
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
    Opus,
}

impl AudioFormat {
    /// File extension (and yt-dlp codec name)
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
        }
    }

    /// Bitrate used for quick audio downloads
    pub fn default_quality(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "320",
            AudioFormat::M4a | AudioFormat::Opus => "192",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Per-download options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadOptions {
    pub embed_thumbnail: bool,
    pub embed_metadata: bool,
    pub embed_chapters: bool,
    /// Container for merged video+audio output
    pub merge_output_format: Option<String>,
    pub extract_audio: bool,
    pub audio_format: AudioFormat,
    /// Bitrate such as "192" or "192k"
    pub audio_quality: String,
    pub download_subtitles: bool,
    pub subtitle_languages: Vec<String>,
    pub subtitle_format: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            embed_thumbnail: false,
            embed_metadata: false,
            embed_chapters: false,
            merge_output_format: None,
            extract_audio: false,
            audio_format: AudioFormat::Mp3,
            audio_quality: "192".to_string(),
            download_subtitles: false,
            subtitle_languages: vec!["en".to_string()],
            subtitle_format: "srt".to_string(),
        }
    }
}

impl DownloadOptions {
    /// Options seeded from the persisted settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            embed_thumbnail: settings.embed_thumbnail,
            embed_metadata: settings.embed_metadata,
            embed_chapters: settings.embed_chapters,
            audio_quality: settings.audio_bitrate.clone(),
            download_subtitles: settings.download_subtitles,
            subtitle_languages: settings.subtitle_languages.clone(),
            subtitle_format: settings.subtitle_format.clone(),
            ..Default::default()
        }
    }

    /// Merge separate streams into `container`
    pub fn merged_into(mut self, container: impl Into<String>) -> Self {
        self.merge_output_format = Some(container.into());
        self
    }

    /// Extract audio only, at the format's default bitrate
    pub fn audio_only(mut self, format: AudioFormat) -> Self {
        self.extract_audio = true;
        self.audio_format = format;
        self.audio_quality = format.default_quality().to_string();
        self
    }

    /// Check every field, returning a user-facing message on the first problem
    pub fn validate(&self) -> Result<(), ConversoError> {
        if let Some(container) = &self.merge_output_format {
            if !MERGE_CONTAINERS.contains(&container.as_str()) {
                return Err(ConversoError::InvalidInput(format!(
                    "Unsupported output container '{}' (expected one of {})",
                    container,
                    MERGE_CONTAINERS.join(", ")
                )));
            }
        }

        if self.extract_audio && !AUDIO_QUALITY.is_match(&self.audio_quality) {
            return Err(ConversoError::InvalidInput(format!(
                "Invalid audio quality '{}'",
                self.audio_quality
            )));
        }

        if self.download_subtitles {
            if self.subtitle_languages.is_empty() {
                return Err(ConversoError::InvalidInput(
                    "At least one subtitle language is required".to_string(),
                ));
            }
            if let Some(bad) = self
                .subtitle_languages
                .iter()
                .find(|lang| !LANGUAGE_CODE.is_match(lang))
            {
                return Err(ConversoError::InvalidInput(format!(
                    "Invalid subtitle language '{}'",
                    bad
                )));
            }
            if !SUBTITLE_FORMATS.contains(&self.subtitle_format.as_str()) {
                return Err(ConversoError::InvalidInput(format!(
                    "Unsupported subtitle format '{}'",
                    self.subtitle_format
                )));
            }
        }

        Ok(())
    }

    /// Extension of the final file, when post-processing decides it
    pub fn output_extension(&self) -> Option<&str> {
        if self.extract_audio {
            Some(self.audio_format.extension())
        } else {
            self.merge_output_format.as_deref()
        }
    }
}
