//! Video metadata lookup
//!
//! Wraps the fetcher's metadata-only mode and turns the raw record into the
//! display-ready `VideoDetails` the rest of the application works with.

use crate::extractor::cache::MetadataCache;
use crate::extractor::models::{Format, RawVideoInfo, Thumbnail};
use crate::extractor::traits::MediaFetcher;
use crate::utils::display::{format_duration, format_size, format_upload_date};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Processed video information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration: Option<f64>,
    pub duration_formatted: String,
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub upload_date: String,
    pub description: String,
    pub thumbnail: String,
    pub formats: Vec<Format>,
    pub subtitle_languages: Vec<String>,
    pub automatic_caption_languages: Vec<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Highest vertical resolution across all formats, e.g. "1080p"
    pub resolution: String,
    /// Largest declared format size. A rough proxy, not a true total.
    pub estimated_size: String,
    pub webpage_url: String,
}

impl VideoDetails {
    /// Build details from a raw record; `url` is used when the record has no page URL
    pub fn from_raw(info: RawVideoInfo, url: &str) -> Self {
        let mut subtitle_languages: Vec<String> = info.subtitles.keys().cloned().collect();
        subtitle_languages.sort();
        let mut automatic_caption_languages: Vec<String> =
            info.automatic_captions.keys().cloned().collect();
        automatic_caption_languages.sort();

        let duration = info.duration.filter(|d| *d > 0.0);

        Self {
            title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            uploader: info.uploader.unwrap_or_else(|| "Unknown".to_string()),
            duration,
            duration_formatted: format_duration(duration.unwrap_or(0.0)),
            view_count: info.view_count.unwrap_or(0),
            like_count: info.like_count,
            upload_date: format_upload_date(info.upload_date.as_deref()),
            description: info.description.unwrap_or_default(),
            thumbnail: best_thumbnail(&info.thumbnails),
            resolution: max_resolution(&info.formats),
            estimated_size: estimate_total_size(&info.formats),
            subtitle_languages,
            automatic_caption_languages,
            categories: info.categories,
            tags: info.tags,
            webpage_url: info.webpage_url.unwrap_or_else(|| url.to_string()),
            formats: info.formats,
            id: info.id,
        }
    }
}

/// Select the highest quality thumbnail (largest area, first wins on ties)
pub fn best_thumbnail(thumbnails: &[Thumbnail]) -> String {
    let mut best: Option<&Thumbnail> = None;
    for thumb in thumbnails {
        if thumb.url.as_deref().map_or(true, str::is_empty) {
            continue;
        }
        if best.map_or(true, |b| thumb.area() > b.area()) {
            best = Some(thumb);
        }
    }
    best.and_then(|t| t.url.clone()).unwrap_or_default()
}

/// Maximum available vertical resolution as "<height>p", or "Unknown"
pub fn max_resolution(formats: &[Format]) -> String {
    match formats.iter().filter_map(|f| f.height).max() {
        Some(height) if height > 0 => format!("{}p", height),
        _ => "Unknown".to_string(),
    }
}

/// Largest declared size among all formats, formatted for display
pub fn estimate_total_size(formats: &[Format]) -> String {
    let max_size = formats
        .iter()
        .filter_map(Format::effective_size)
        .max()
        .unwrap_or(0);
    format_size(i64::try_from(max_size).unwrap_or(i64::MAX))
}

/// Metadata extractor with a bounded per-process cache
pub struct MetadataExtractor {
    fetcher: Arc<dyn MediaFetcher>,
    cache: Mutex<MetadataCache<VideoDetails>>,
}

impl MetadataExtractor {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self::with_cache(fetcher, MetadataCache::default())
    }

    pub fn with_cache(fetcher: Arc<dyn MediaFetcher>, cache: MetadataCache<VideoDetails>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(cache),
        }
    }

    /// Extract video details, or `None` when the fetcher has nothing for `url`.
    ///
    /// With `use_cache` false the cache is not consulted but still refreshed.
    pub async fn extract_info(&self, url: &str, use_cache: bool) -> Option<Arc<VideoDetails>> {
        if use_cache {
            if let Some(hit) = self.cache.lock().await.get(url) {
                debug!("Metadata cache hit for {}", url);
                return Some(hit);
            }
        }

        let raw = match self.fetcher.extract_info(url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Error extracting info for {}: {:#}", url, e);
                return None;
            }
        };

        let details = VideoDetails::from_raw(raw, url);
        Some(self.cache.lock().await.insert(url, details))
    }

    /// Drop every cached entry
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}
