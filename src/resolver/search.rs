//! Search resolution through the fetcher's search mode

use crate::extractor::models::RawVideoInfo;
use crate::extractor::traits::MediaFetcher;
use crate::resolver::classifier::{canonical_watch_url, classify, ClassifiedInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RESULTS: usize = 10;
const SUGGESTION_COUNT: usize = 5;

/// How a search result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    DirectUrl,
    VideoId,
    SearchResult,
}

/// A candidate video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration: Option<f64>,
    pub uploader: String,
    pub view_count: u64,
    pub thumbnail: String,
    pub kind: ResultKind,
}

impl SearchResult {
    fn direct(url: String, id: String, kind: ResultKind) -> Self {
        Self {
            id,
            title: String::new(),
            url,
            duration: None,
            uploader: String::new(),
            view_count: 0,
            thumbnail: String::new(),
            kind,
        }
    }

    /// Build a result from a flat search entry
    pub fn from_entry(entry: RawVideoInfo) -> Self {
        let thumbnail = entry_thumbnail(&entry);
        let url = entry
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| canonical_watch_url(&entry.id));

        Self {
            title: entry.title.unwrap_or_else(|| "Unknown Title".to_string()),
            url,
            duration: entry.duration,
            uploader: entry.uploader.unwrap_or_else(|| "Unknown".to_string()),
            view_count: entry.view_count.unwrap_or(0),
            thumbnail,
            kind: ResultKind::SearchResult,
            id: entry.id,
        }
    }
}

/// Thumbnail fallback: explicit field, then the last listed thumbnail, then
/// the provider's default image for the id
fn entry_thumbnail(entry: &RawVideoInfo) -> String {
    if let Some(thumb) = entry.thumbnail.as_deref().filter(|t| !t.is_empty()) {
        return thumb.to_string();
    }
    if let Some(thumb) = entry
        .thumbnails
        .last()
        .and_then(|t| t.url.as_deref())
        .filter(|u| !u.is_empty())
    {
        return thumb.to_string();
    }
    if !entry.id.is_empty() {
        return format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", entry.id);
    }
    String::new()
}

/// Turns search phrases into candidate videos
#[derive(Clone)]
pub struct SearchResolver {
    fetcher: Arc<dyn MediaFetcher>,
}

impl SearchResolver {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { fetcher }
    }

    /// Search for videos, keeping the provider's ranking.
    ///
    /// URLs and bare identifiers short-circuit to a single result. Fetcher
    /// errors yield an empty list.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if query.starts_with("http://") || query.starts_with("https://") {
            return vec![SearchResult::direct(
                query.to_string(),
                String::new(),
                ResultKind::DirectUrl,
            )];
        }

        if let ClassifiedInput::VideoId { id, url } = classify(query) {
            return vec![SearchResult::direct(url, id, ResultKind::VideoId)];
        }

        debug!("Searching for: {} (count: {})", query, max_results);
        match self.fetcher.search(query, max_results).await {
            Ok(entries) => entries
                .into_iter()
                .take(max_results)
                .map(SearchResult::from_entry)
                .collect(),
            Err(e) => {
                warn!("Search error for '{}': {:#}", query, e);
                Vec::new()
            }
        }
    }

    /// Titles of the top results, for autocompletion
    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        self.search(query, SUGGESTION_COUNT)
            .await
            .into_iter()
            .map(|r| r.title)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Resolve input to a single video URL: links and ids directly, phrases
    /// through the first search hit
    pub async fn quick_lookup(&self, input: &str) -> Option<String> {
        match classify(input) {
            ClassifiedInput::DirectUrl { url } | ClassifiedInput::VideoId { url, .. } => Some(url),
            ClassifiedInput::SearchQuery { query } => self
                .search(&query, 1)
                .await
                .into_iter()
                .next()
                .map(|r| r.url),
            ClassifiedInput::InvalidUrl { .. } | ClassifiedInput::Empty => None,
        }
    }
}
