//! Application facade
//!
//! `Converso` wires the resolver, metadata extractor and download
//! orchestrator around one shared `MediaFetcher` and exposes the user-level
//! flows: look something up, then download it as video, audio or a specific
//! format.

use crate::downloader::{
    AudioFormat, CancelHandle, DownloadOptions, DownloadOrchestrator, DownloadOutcome,
    DownloadProgress,
};
use crate::extractor::{extract_playlist_urls, MediaFetcher, MetadataExtractor, PlaylistInfo, VideoDetails};
use crate::formats::{best_format_id, QualityTier};
use crate::resolver::{classify, validate_input, ClassifiedInput, SearchResolver, SearchResult, DEFAULT_MAX_RESULTS};
use crate::utils::config::Settings;
use crate::utils::error::ConversoError;
use std::sync::Arc;
use tracing::info;

/// Result of resolving one piece of user input
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Empty,
    /// Input was rejected; carries the user-facing message
    Invalid(String),
    Video(Arc<VideoDetails>),
    NotFound,
    /// A search phrase produced these candidates, in provider order
    Candidates(Vec<SearchResult>),
}

pub struct Converso {
    fetcher: Arc<dyn MediaFetcher>,
    settings: Settings,
    resolver: SearchResolver,
    extractor: MetadataExtractor,
    orchestrator: DownloadOrchestrator,
}

impl Converso {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, settings: Settings) -> Self {
        Self {
            resolver: SearchResolver::new(fetcher.clone()),
            extractor: MetadataExtractor::new(fetcher.clone()),
            orchestrator: DownloadOrchestrator::from_settings(fetcher.clone(), &settings),
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.orchestrator.cancel_handle()
    }

    /// Resolve input to a video or a list of candidates. URLs and bare
    /// identifiers go straight to metadata extraction without searching.
    pub async fn lookup(&self, input: &str) -> LookupOutcome {
        match classify(input) {
            ClassifiedInput::Empty => LookupOutcome::Empty,
            ClassifiedInput::InvalidUrl { .. } => LookupOutcome::Invalid(rejection_message(input)),
            ClassifiedInput::DirectUrl { url } | ClassifiedInput::VideoId { url, .. } => {
                match self.extractor.extract_info(&url, true).await {
                    Some(details) => LookupOutcome::Video(details),
                    None => LookupOutcome::NotFound,
                }
            }
            ClassifiedInput::SearchQuery { query } => {
                let results = self.resolver.search(&query, DEFAULT_MAX_RESULTS).await;
                if results.is_empty() {
                    LookupOutcome::NotFound
                } else {
                    LookupOutcome::Candidates(results)
                }
            }
        }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        self.resolver.search(query, max_results).await
    }

    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        self.resolver.suggestions(query).await
    }

    pub async fn video_details(&self, url: &str, use_cache: bool) -> Option<Arc<VideoDetails>> {
        self.extractor.extract_info(url, use_cache).await
    }

    pub async fn playlist(&self, url: &str) -> (Vec<String>, Option<PlaylistInfo>) {
        extract_playlist_urls(self.fetcher.as_ref(), url).await
    }

    /// Container for merged video downloads, from the `output_format` setting
    fn merge_container(&self) -> String {
        let preferred = self.settings.output_format.trim();
        if preferred.is_empty() {
            "mp4".to_string()
        } else {
            preferred.to_string()
        }
    }

    /// Download the tier's video stream merged with the best audio
    pub async fn download_video<F>(
        &self,
        details: &VideoDetails,
        quality: QualityTier,
        on_progress: F,
    ) -> DownloadOutcome
    where
        F: FnMut(&DownloadProgress) + Send,
    {
        let Some(format_id) = best_format_id(&details.formats, quality) else {
            return DownloadOutcome::Failed {
                error: "No suitable format found".to_string(),
            };
        };

        info!("Downloading {} at {} quality ({})", details.title, quality, format_id);
        let options = DownloadOptions::from_settings(&self.settings).merged_into(self.merge_container());
        self.orchestrator
            .download(
                &details.webpage_url,
                &format!("{}+bestaudio", format_id),
                &options,
                on_progress,
            )
            .await
    }

    /// Download the best audio stream and convert it to `format`
    pub async fn download_audio<F>(
        &self,
        details: &VideoDetails,
        format: AudioFormat,
        on_progress: F,
    ) -> DownloadOutcome
    where
        F: FnMut(&DownloadProgress) + Send,
    {
        let options = DownloadOptions::default().audio_only(format);
        self.orchestrator
            .download(&details.webpage_url, "bestaudio", &options, on_progress)
            .await
    }

    /// Download one specific format, optionally merged with the best audio
    pub async fn download_format<F>(
        &self,
        details: &VideoDetails,
        format_id: &str,
        merge_audio: bool,
        on_progress: F,
    ) -> DownloadOutcome
    where
        F: FnMut(&DownloadProgress) + Send,
    {
        let mut options = DownloadOptions::from_settings(&self.settings);
        let selector = if merge_audio {
            options = options.merged_into(self.merge_container());
            format!("{}+bestaudio", format_id)
        } else {
            format_id.to_string()
        };

        self.orchestrator
            .download(&details.webpage_url, &selector, &options, on_progress)
            .await
    }

    /// Download each URL in turn at `quality`. One outcome per URL, in order.
    pub async fn download_batch<F>(
        &self,
        urls: &[String],
        quality: QualityTier,
        mut on_progress: F,
    ) -> Vec<(String, DownloadOutcome)>
    where
        F: FnMut(&str, &DownloadProgress) + Send,
    {
        let mut outcomes = Vec::with_capacity(urls.len());

        for raw in urls {
            let outcome = if self.orchestrator.is_cancelled() {
                DownloadOutcome::Failed {
                    error: ConversoError::Cancelled.to_string(),
                }
            } else {
                match classify(raw).resolved_url() {
                    None => DownloadOutcome::Failed {
                        error: rejection_message(raw),
                    },
                    Some(url) => match self.extractor.extract_info(url, true).await {
                        None => DownloadOutcome::Failed {
                            error: ConversoError::NotFound(url.to_string()).to_string(),
                        },
                        Some(details) => {
                            self.download_video(&details, quality, |p| on_progress(raw.as_str(), p))
                                .await
                        }
                    },
                }
            };
            outcomes.push((raw.clone(), outcome));
        }

        outcomes
    }
}

/// User-facing reason an input cannot be downloaded directly
fn rejection_message(input: &str) -> String {
    match validate_input(input) {
        Err(e) => e.to_string(),
        Ok(()) => format!("Not a video URL: {}", input.trim()),
    }
}
