//! Interactive session state
//!
//! Each user action produces a new `Session` snapshot. Snapshots are never
//! mutated after construction, so a view rendered from one snapshot cannot
//! observe a half-applied action.

use crate::downloader::DownloadOutcome;
use crate::extractor::VideoDetails;
use crate::formats::QualityTier;
use crate::resolver::{classify, ClassifiedInput, SearchResult};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub input: String,
    pub classification: Option<ClassifiedInput>,
    pub search_results: Vec<SearchResult>,
    /// URL of the video the user settled on
    pub selected_url: Option<String>,
    pub video: Option<Arc<VideoDetails>>,
    pub quality: QualityTier,
    /// Search results are hidden once a video has been picked
    pub hide_search: bool,
    pub message: Option<String>,
}

/// User or system action that moves the session forward
#[derive(Debug, Clone)]
pub enum SessionAction {
    InputChanged(String),
    SearchCompleted(Vec<SearchResult>),
    /// Index into the current search results
    ResultSelected(usize),
    DetailsLoaded(Arc<VideoDetails>),
    QualityChanged(QualityTier),
    DownloadFinished(DownloadOutcome),
    Cleared,
}

impl Session {
    pub fn new(quality: QualityTier) -> Self {
        Self {
            quality,
            ..Default::default()
        }
    }

    /// Snapshot after `action`; `self` is left untouched
    pub fn apply(&self, action: SessionAction) -> Session {
        match action {
            SessionAction::InputChanged(input) => {
                if input == self.input {
                    return self.clone();
                }
                let classification = classify(&input);
                let selected_url = classification.resolved_url().map(str::to_string);
                Session {
                    hide_search: selected_url.is_some(),
                    selected_url,
                    classification: Some(classification),
                    input,
                    quality: self.quality,
                    ..Default::default()
                }
            }
            SessionAction::SearchCompleted(results) => Session {
                search_results: results,
                hide_search: false,
                ..self.clone()
            },
            SessionAction::ResultSelected(index) => match self.search_results.get(index) {
                Some(result) => Session {
                    input: result.url.clone(),
                    selected_url: Some(result.url.clone()),
                    hide_search: true,
                    video: None,
                    message: None,
                    ..self.clone()
                },
                None => self.clone(),
            },
            SessionAction::DetailsLoaded(details) => Session {
                video: Some(details),
                message: None,
                ..self.clone()
            },
            SessionAction::QualityChanged(quality) => Session {
                quality,
                ..self.clone()
            },
            SessionAction::DownloadFinished(outcome) => {
                let message = match outcome {
                    DownloadOutcome::Completed { title, .. } => format!("✅ Downloaded: {}", title),
                    DownloadOutcome::Failed { error } => format!("❌ {}", error),
                };
                Session {
                    message: Some(message),
                    ..self.clone()
                }
            }
            SessionAction::Cleared => Session::new(self.quality),
        }
    }

    /// Whether the search result list should be shown
    pub fn shows_search(&self) -> bool {
        !self.hide_search && !self.search_results.is_empty()
    }
}
