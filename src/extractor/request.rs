//! Request and event types exchanged with a media fetcher

use serde::{Deserialize, Serialize};

/// Everything the external tool needs to fetch and post-process one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Format selector, possibly a `video+audio` merge pair
    pub format: String,
    /// Output path template, e.g. `/downloads/%(title)s.%(ext)s`
    pub output_template: String,
    /// Container used when streams are merged
    pub merge_output_format: Option<String>,
    /// Extra ffmpeg arguments applied by the tool's post-processors
    pub ffmpeg_args: Vec<String>,
    /// Post-processing steps, applied in order
    pub postprocessors: Vec<PostProcessor>,
    pub subtitles: Option<SubtitleRequest>,
    pub transfer: TransferSettings,
}

impl FetchRequest {
    /// Whether the format selector merges separate streams
    pub fn is_merge(&self) -> bool {
        self.format.contains('+')
    }
}

/// Post-processing step applied after the raw fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostProcessor {
    ExtractAudio { codec: String, quality: String },
    EmbedThumbnail,
    EmbedMetadata,
    EmbedChapters,
}

/// Subtitle fetch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleRequest {
    pub languages: Vec<String>,
    pub format: String,
}

/// Network behaviour handed through to the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    pub retries: u32,
    pub socket_timeout_secs: u64,
    pub rate_limit: Option<String>,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            retries: 3,
            socket_timeout_secs: 30,
            rate_limit: None,
        }
    }
}

/// Status event reported by the tool while fetching
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Downloading {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
        speed: Option<f64>,
        eta: Option<u64>,
    },
    Finished {
        filename: String,
    },
}

/// Result of a completed fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub title: String,
    /// File name the tool prepared from the output template, before any
    /// post-processor changed the extension
    pub filename: String,
}
