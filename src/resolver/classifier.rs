//! Classification of free-form user input
//!
//! Everything here is a pure string transform: no network or disk access.

use crate::utils::error::ConversoError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Hosts whose URLs are accepted as direct links
pub const ALLOWED_HOSTS: [&str; 5] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
const VIDEO_ID_LEN: usize = 11;

lazy_static! {
    static ref VIDEO_ID_PATTERNS: [Regex; 3] = [
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11}).*").unwrap(),
        Regex::new(r"(?:embed/)([0-9A-Za-z_-]{11})").unwrap(),
        Regex::new(r"(?:watch\?v=)([0-9A-Za-z_-]{11})").unwrap(),
    ];
}

/// What a piece of user input turned out to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifiedInput {
    DirectUrl { url: String },
    VideoId { id: String, url: String },
    SearchQuery { query: String },
    InvalidUrl { url: String },
    Empty,
}

impl ClassifiedInput {
    /// URL to fetch directly, if the input names a video without searching
    pub fn resolved_url(&self) -> Option<&str> {
        match self {
            ClassifiedInput::DirectUrl { url } | ClassifiedInput::VideoId { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Character rule for bare video identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdCharset {
    /// Alphanumeric only
    Strict,
    /// Alphanumeric plus `-` and `_`, as real identifiers use
    Loose,
}

impl IdCharset {
    fn allows(&self, c: char) -> bool {
        match self {
            IdCharset::Strict => c.is_ascii_alphanumeric(),
            IdCharset::Loose => c.is_ascii_alphanumeric() || c == '-' || c == '_',
        }
    }
}

/// Canonical watch URL for a video identifier
pub fn canonical_watch_url(id: &str) -> String {
    format!("{}{}", WATCH_URL_PREFIX, id)
}

fn has_url_scheme(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Whether `url` parses and its host is on the allow-list
pub fn is_allowed_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|host| ALLOWED_HOSTS.contains(&host.as_str()))
}

/// Whether `input` looks like a bare video identifier
pub fn is_video_id(input: &str, charset: IdCharset) -> bool {
    input.chars().count() == VIDEO_ID_LEN && input.chars().all(|c| charset.allows(c))
}

/// Classify input using the identifier rule of the lookup path
pub fn classify(input: &str) -> ClassifiedInput {
    classify_with(input, IdCharset::Loose)
}

/// Classify trimmed input into exactly one category.
///
/// An 11-character phrase made of identifier characters is taken as an
/// identifier even if the user meant it as a search.
pub fn classify_with(input: &str, charset: IdCharset) -> ClassifiedInput {
    let input = input.trim();

    if has_url_scheme(input) {
        return if is_allowed_url(input) {
            ClassifiedInput::DirectUrl {
                url: input.to_string(),
            }
        } else {
            ClassifiedInput::InvalidUrl {
                url: input.to_string(),
            }
        };
    }

    if is_video_id(input, charset) {
        return ClassifiedInput::VideoId {
            id: input.to_string(),
            url: canonical_watch_url(input),
        };
    }

    if input.is_empty() {
        return ClassifiedInput::Empty;
    }

    ClassifiedInput::SearchQuery {
        query: input.to_string(),
    }
}

/// Validate input before a lookup, with a user-facing message on rejection
pub fn validate_input(input: &str) -> Result<(), ConversoError> {
    match classify(input) {
        ClassifiedInput::Empty => Err(ConversoError::InvalidInput(
            "Input cannot be empty".to_string(),
        )),
        ClassifiedInput::InvalidUrl { .. } => Err(ConversoError::InvalidInput(
            "Only YouTube URLs are supported".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Extract the 11-character video identifier from a URL
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_playlist_url(url: &str) -> bool {
    let url = url.to_lowercase();
    ["playlist", "list=", "/sets/", "/album/"]
        .iter()
        .any(|marker| url.contains(marker))
}

pub fn is_channel_url(url: &str) -> bool {
    let url = url.to_lowercase();
    ["/channel/", "/user/", "/c/", "/@"]
        .iter()
        .any(|marker| url.contains(marker))
}
