//! Download orchestration module

pub mod options;
pub mod orchestrator;
pub mod progress;

pub use options::{AudioFormat, DownloadOptions};
pub use orchestrator::{CancelHandle, DownloadOrchestrator, DownloadOutcome};
pub use progress::{DownloadProgress, DownloadStatus};
