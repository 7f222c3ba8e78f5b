//! Converso library

pub mod app;
pub mod downloader;
pub mod extractor;
pub mod formats;
pub mod resolver;
pub mod session;
pub mod update;
pub mod utils;
pub mod version;

// Re-export main types for easier use
pub use app::{Converso, LookupOutcome};
pub use downloader::{AudioFormat, DownloadOptions, DownloadOrchestrator, DownloadOutcome, DownloadProgress, DownloadStatus};
pub use extractor::{Format, MediaFetcher, RawVideoInfo, VideoDetails, YtDlpFetcher};
pub use formats::QualityTier;
pub use resolver::{ClassifiedInput, SearchResult};
pub use session::{Session, SessionAction};
pub use update::{UpdateChecker, UpdateStatus};
pub use utils::{ConversoError, Settings, SettingsStore};
