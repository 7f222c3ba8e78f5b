//! Playlist expansion

use crate::extractor::traits::MediaFetcher;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Summary of a playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub title: String,
    pub uploader: String,
    pub video_count: usize,
    pub description: String,
}

/// List every video URL in a playlist.
///
/// Entries without a URL fall back to a watch URL built from their id.
/// Failures are logged and yield an empty listing.
pub async fn extract_playlist_urls(
    fetcher: &dyn MediaFetcher,
    playlist_url: &str,
) -> (Vec<String>, Option<PlaylistInfo>) {
    let info = match fetcher.extract_playlist(playlist_url).await {
        Ok(info) => info,
        Err(e) => {
            warn!("Error extracting playlist {}: {:#}", playlist_url, e);
            return (Vec::new(), None);
        }
    };

    let urls: Vec<String> = info
        .entries
        .iter()
        .filter_map(|entry| {
            let non_empty = |u: &Option<String>| u.clone().filter(|u| !u.is_empty());
            non_empty(&entry.url)
                .or_else(|| non_empty(&entry.webpage_url))
                .or_else(|| {
                    (!entry.id.is_empty())
                        .then(|| format!("https://youtube.com/watch?v={}", entry.id))
                })
        })
        .collect();

    let summary = PlaylistInfo {
        title: info.title.unwrap_or_else(|| "Unknown Playlist".to_string()),
        uploader: info.uploader.unwrap_or_else(|| "Unknown".to_string()),
        video_count: urls.len(),
        description: info.description.unwrap_or_default(),
    };

    (urls, Some(summary))
}
