//! Quality-tier format selection

use crate::extractor::models::Format;
use crate::formats::classifier::{categorize, sorted_by_quality, MediaKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse quality preference
///
/// Tiers are positions in whatever the source exposes, not fixed
/// resolutions: `high` is a quarter of the way down the ranked list,
/// `medium` half way, `low` three quarters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    Best,
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn all() -> [QualityTier; 4] {
        [
            QualityTier::Best,
            QualityTier::High,
            QualityTier::Medium,
            QualityTier::Low,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Best => "best",
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }

    /// Index into a ranked list of `len` formats, clamped to the last entry
    pub fn index_for(&self, len: usize) -> usize {
        let last = len.saturating_sub(1);
        let index = match self {
            QualityTier::Best => 0,
            QualityTier::High => len / 4,
            QualityTier::Medium => len / 2,
            QualityTier::Low => 3 * len / 4,
        };
        index.min(last)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(QualityTier::Best),
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            other => Err(format!("unknown quality tier '{}'", other)),
        }
    }
}

/// Pick a format id for a quality tier.
///
/// Ranks video-only formats (falling back to progressive ones when the
/// source offers no separate video streams). Returns `None` when neither
/// exists.
pub fn best_format_id(formats: &[Format], quality: QualityTier) -> Option<String> {
    let categorized = categorize(formats);

    let mut ranked = sorted_by_quality(&categorized.video_only, MediaKind::Video);
    if ranked.is_empty() {
        ranked = sorted_by_quality(&categorized.progressive, MediaKind::Video);
    }
    if ranked.is_empty() {
        return None;
    }

    let index = quality.index_for(ranked.len());
    Some(ranked.swap_remove(index).format_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, height: u32) -> Format {
        Format {
            format_id: id.to_string(),
            vcodec: Some("vp9".to_string()),
            acodec: Some("none".to_string()),
            height: Some(height),
            ..Default::default()
        }
    }

    fn progressive(id: &str, height: u32) -> Format {
        Format {
            acodec: Some("mp4a".to_string()),
            ..video(id, height)
        }
    }

    #[test]
    fn test_tier_indices() {
        assert_eq!(QualityTier::Best.index_for(8), 0);
        assert_eq!(QualityTier::High.index_for(8), 2);
        assert_eq!(QualityTier::Medium.index_for(8), 4);
        assert_eq!(QualityTier::Low.index_for(8), 6);
        assert_eq!(QualityTier::Low.index_for(1), 0);
        assert_eq!(QualityTier::Medium.index_for(0), 0);
    }

    #[test]
    fn test_best_format_id_by_tier() {
        let formats = vec![
            video("144", 144),
            video("1080", 1080),
            video("480", 480),
            video("720", 720),
            progressive("18", 360),
        ];
        assert_eq!(best_format_id(&formats, QualityTier::Best).as_deref(), Some("1080"));
        assert_eq!(best_format_id(&formats, QualityTier::High).as_deref(), Some("720"));
        assert_eq!(best_format_id(&formats, QualityTier::Medium).as_deref(), Some("480"));
        assert_eq!(best_format_id(&formats, QualityTier::Low).as_deref(), Some("144"));
    }

    #[test]
    fn test_falls_back_to_progressive() {
        let formats = vec![progressive("18", 360), progressive("22", 720)];
        assert_eq!(best_format_id(&formats, QualityTier::Best).as_deref(), Some("22"));
    }

    #[test]
    fn test_none_without_video() {
        let audio = Format {
            format_id: "140".into(),
            acodec: Some("mp4a".into()),
            abr: Some(128.0),
            ..Default::default()
        };
        assert_eq!(best_format_id(&[], QualityTier::Best), None);
        assert_eq!(best_format_id(&[audio], QualityTier::Best), None);
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("HIGH".parse::<QualityTier>(), Ok(QualityTier::High));
        assert!("ultra".parse::<QualityTier>().is_err());
        assert_eq!(QualityTier::Medium.to_string(), "medium");
    }
}
