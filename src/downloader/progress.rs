//! Progress snapshots derived from fetcher events

use crate::extractor::request::FetchEvent;
use serde::Serialize;
use std::time::Duration;

/// Coarse progress snapshot handed to the caller's progress callback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadProgress {
    pub status: DownloadStatus,
    pub downloaded_bytes: u64,
    /// Exact size when known, otherwise the tool's estimate (0 if neither)
    pub total_bytes: u64,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
    pub filename: Option<String>,
}

impl DownloadProgress {
    /// Build a snapshot from one fetcher event
    pub fn from_event(event: &FetchEvent) -> Self {
        match event {
            FetchEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed,
                eta,
            } => Self {
                status: DownloadStatus::Downloading,
                downloaded_bytes: *downloaded_bytes,
                total_bytes: total_bytes.or(*total_bytes_estimate).unwrap_or(0),
                speed: speed.unwrap_or(0.0),
                eta: eta.map(Duration::from_secs),
                filename: None,
            },
            FetchEvent::Finished { filename } => Self {
                status: DownloadStatus::Finished,
                downloaded_bytes: 0,
                total_bytes: 0,
                speed: 0.0,
                eta: Some(Duration::from_secs(0)),
                filename: Some(filename.clone()),
            },
        }
    }

    /// Progress percentage (0.0 to 100.0); a finished transfer is always 100
    pub fn percent(&self) -> f64 {
        match self.status {
            DownloadStatus::Finished => 100.0,
            DownloadStatus::Downloading => {
                self.downloaded_bytes as f64 / self.total_bytes.max(1) as f64 * 100.0
            }
        }
    }
}

/// Download status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Finished,
}
