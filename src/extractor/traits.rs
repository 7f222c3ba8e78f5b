use crate::extractor::models::RawVideoInfo;
use crate::extractor::request::{FetchEvent, FetchOutcome, FetchRequest};
use crate::utils::error::ConversoError;
use anyhow::Result;
use async_trait::async_trait;

/// Callback invoked for every status event during a fetch.
///
/// Returning an error aborts the fetch; the fetcher must stop the transfer
/// and return that error.
pub type ProgressHook<'a> = dyn FnMut(FetchEvent) -> Result<(), ConversoError> + Send + 'a;

/// Capability interface over the external extraction/download tool
///
/// This trait isolates the application from the specific tool (a yt-dlp
/// subprocess in production, scripted fakes in tests).
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Returns a unique identifier for this fetcher (e.g., "ytdlp")
    fn id(&self) -> &'static str;

    /// Extracts video metadata without fetching media
    async fn extract_info(&self, url: &str) -> Result<RawVideoInfo>;

    /// Runs a provider search, returning flat entries in provider order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawVideoInfo>>;

    /// Lists a playlist as flat entries (`entries` holds the videos)
    async fn extract_playlist(&self, url: &str) -> Result<RawVideoInfo>;

    /// Fetches and post-processes media, reporting progress through `hook`
    async fn download(
        &self,
        request: &FetchRequest,
        hook: &mut ProgressHook<'_>,
    ) -> Result<FetchOutcome>;
}
