//! Error handling for Converso

use thiserror::Error;

/// Main error type for Converso
#[derive(Debug, Error)]
pub enum ConversoError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("No data found for: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Download cancelled by user")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ConversoError {
    /// Whether the error is an expected, user-facing outcome rather than a fault
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ConversoError::InvalidInput(_) | ConversoError::NotFound(_) | ConversoError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_is_plain() {
        let err = ConversoError::InvalidInput("Only YouTube URLs are supported".into());
        assert_eq!(err.to_string(), "Only YouTube URLs are supported");
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_download_failure_is_not_user_facing() {
        let err = ConversoError::DownloadFailed("disk full".into());
        assert_eq!(err.to_string(), "Download failed: disk full");
        assert!(!err.is_user_facing());
    }
}
