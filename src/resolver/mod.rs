//! Input classification and search resolution

pub mod classifier;
pub mod search;

pub use classifier::{
    canonical_watch_url, classify, classify_with, extract_video_id, is_channel_url,
    is_playlist_url, validate_input, ClassifiedInput, IdCharset,
};
pub use search::{ResultKind, SearchResolver, SearchResult, DEFAULT_MAX_RESULTS};
