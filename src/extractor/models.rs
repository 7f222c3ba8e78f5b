//! Data structures for video information

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Video metadata as reported by yt-dlp.
///
/// Full lookups and flat search/playlist entries share this shape; every
/// field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawVideoInfo {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub view_count: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub like_count: Option<u64>,
    pub upload_date: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub formats: Vec<Format>,
    pub subtitles: HashMap<String, serde_json::Value>,
    pub automatic_captions: HashMap<String, serde_json::Value>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub playlist_count: Option<u64>,
    pub entries: Vec<RawVideoInfo>,
}

/// Thumbnail candidate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub width: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
}

impl Thumbnail {
    /// Pixel area, with missing dimensions counted as zero
    pub fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Video format information (one encoding offered by the source)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Format {
    pub format_id: String,
    pub ext: String,
    pub url: String,
    pub resolution: Option<String>,
    pub format_note: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub width: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub tbr: Option<f64>, // Total bitrate
    pub vbr: Option<f64>, // Video bitrate
    pub abr: Option<f64>, // Audio bitrate
    pub asr: Option<f64>, // Audio sample rate
    #[serde(deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub filesize_approx: Option<u64>,
}

fn codec_present(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

impl Format {
    pub fn has_video(&self) -> bool {
        codec_present(&self.vcodec)
    }

    pub fn has_audio(&self) -> bool {
        codec_present(&self.acodec)
    }

    /// Declared size, falling back to yt-dlp's estimate
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize
            .filter(|s| *s > 0)
            .or(self.filesize_approx.filter(|s| *s > 0))
    }

    /// Total bitrate, falling back to the video bitrate
    pub fn video_bitrate(&self) -> f64 {
        nonzero(self.tbr).or(nonzero(self.vbr)).unwrap_or(0.0)
    }

    /// Audio bitrate, falling back to the total bitrate
    pub fn audio_bitrate(&self) -> f64 {
        nonzero(self.abr).or(nonzero(self.tbr)).unwrap_or(0.0)
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| {
        n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}
