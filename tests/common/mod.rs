//! Scripted `MediaFetcher` shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use converso::extractor::{
    FetchEvent, FetchOutcome, FetchRequest, Format, MediaFetcher, ProgressHook, RawVideoInfo,
};
use converso::utils::ConversoError;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeFetcher {
    /// Metadata keyed by URL; unknown URLs fail
    pub videos: HashMap<String, RawVideoInfo>,
    pub search_results: Vec<RawVideoInfo>,
    pub search_fails: bool,
    pub playlist: Option<RawVideoInfo>,
    /// Events replayed through the progress hook during `download`
    pub events: Vec<FetchEvent>,
    /// `None` makes every download fail
    pub outcome: Option<FetchOutcome>,
    /// Every call, e.g. "search:cats" or "extract_info:<url>"
    pub calls: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<FetchRequest>>,
}

impl FakeFetcher {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn extract_info(&self, url: &str) -> Result<RawVideoInfo> {
        self.record(format!("extract_info:{}", url));
        self.videos
            .get(url)
            .cloned()
            .ok_or_else(|| ConversoError::NotFound(url.to_string()).into())
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawVideoInfo>> {
        self.record(format!("search:{}", query));
        if self.search_fails {
            return Err(ConversoError::Transport("connection reset".to_string()).into());
        }
        Ok(self.search_results.iter().take(max_results).cloned().collect())
    }

    async fn extract_playlist(&self, url: &str) -> Result<RawVideoInfo> {
        self.record(format!("extract_playlist:{}", url));
        self.playlist
            .clone()
            .ok_or_else(|| ConversoError::NotFound(url.to_string()).into())
    }

    async fn download(
        &self,
        request: &FetchRequest,
        hook: &mut ProgressHook<'_>,
    ) -> Result<FetchOutcome> {
        self.record(format!("download:{}", request.url));
        self.requests.lock().unwrap().push(request.clone());

        for event in &self.events {
            hook(event.clone())?;
        }

        self.outcome
            .clone()
            .ok_or_else(|| ConversoError::DownloadFailed("ERROR: unable to download".to_string()).into())
    }
}

pub fn video_format(id: &str, height: u32, tbr: f64) -> Format {
    Format {
        format_id: id.to_string(),
        ext: "mp4".to_string(),
        vcodec: Some("avc1.640028".to_string()),
        acodec: Some("none".to_string()),
        height: Some(height),
        fps: Some(30.0),
        tbr: Some(tbr),
        ..Default::default()
    }
}

pub fn audio_format(id: &str, abr: f64) -> Format {
    Format {
        format_id: id.to_string(),
        ext: "m4a".to_string(),
        vcodec: Some("none".to_string()),
        acodec: Some("mp4a.40.2".to_string()),
        abr: Some(abr),
        ..Default::default()
    }
}

pub fn sample_video(id: &str) -> RawVideoInfo {
    RawVideoInfo {
        id: id.to_string(),
        title: Some(format!("Video {}", id)),
        uploader: Some("Uploader".to_string()),
        duration: Some(212.0),
        view_count: Some(1_000),
        upload_date: Some("20240115".to_string()),
        webpage_url: Some(format!("https://www.youtube.com/watch?v={}", id)),
        formats: vec![
            video_format("137", 1080, 4000.0),
            video_format("136", 720, 2500.0),
            video_format("135", 480, 1200.0),
            video_format("134", 360, 600.0),
            audio_format("140", 129.0),
        ],
        ..Default::default()
    }
}

pub fn search_entry(id: &str, title: &str) -> RawVideoInfo {
    RawVideoInfo {
        id: id.to_string(),
        title: Some(title.to_string()),
        ..Default::default()
    }
}
