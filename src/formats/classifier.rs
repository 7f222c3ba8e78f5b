//! Format categorization and quality ranking

use crate::extractor::models::Format;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Formats partitioned by the media they carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedFormats {
    /// Video and audio in one stream, playable without merging
    pub progressive: Vec<Format>,
    pub video_only: Vec<Format>,
    pub audio_only: Vec<Format>,
}

impl CategorizedFormats {
    /// Sort every bucket best-first
    pub fn ranked(mut self) -> Self {
        sort_by_quality(&mut self.progressive, MediaKind::Video);
        sort_by_quality(&mut self.video_only, MediaKind::Video);
        sort_by_quality(&mut self.audio_only, MediaKind::Audio);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.progressive.is_empty() && self.video_only.is_empty() && self.audio_only.is_empty()
    }
}

/// Which ranking keys apply to a list of formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Partition formats by codec presence.
///
/// Formats without either codec (storyboards and the like) are dropped.
pub fn categorize(formats: &[Format]) -> CategorizedFormats {
    let mut categorized = CategorizedFormats::default();

    for format in formats {
        match (format.has_video(), format.has_audio()) {
            (true, true) => categorized.progressive.push(format.clone()),
            (true, false) => categorized.video_only.push(format.clone()),
            (false, true) => categorized.audio_only.push(format.clone()),
            (false, false) => {}
        }
    }

    categorized
}

fn compare_keys(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn sort_keys(format: &Format, kind: MediaKind) -> [f64; 3] {
    match kind {
        MediaKind::Video => [
            f64::from(format.height.unwrap_or(0)),
            format.fps.unwrap_or(0.0),
            format.video_bitrate(),
        ],
        MediaKind::Audio => [format.audio_bitrate(), format.asr.unwrap_or(0.0), 0.0],
    }
}

/// Stable descending sort.
///
/// Video: (height, fps, total-or-video bitrate). Audio: (audio-or-total
/// bitrate, sample rate). Equal keys keep their original order.
pub fn sort_by_quality(formats: &mut [Format], kind: MediaKind) {
    formats.sort_by(|a, b| compare_keys(&sort_keys(b, kind), &sort_keys(a, kind)));
}

/// Owned variant of [`sort_by_quality`]
pub fn sorted_by_quality(formats: &[Format], kind: MediaKind) -> Vec<Format> {
    let mut sorted = formats.to_vec();
    sort_by_quality(&mut sorted, kind);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(id: &str, vcodec: &str, acodec: &str, height: Option<u32>) -> Format {
        Format {
            format_id: id.to_string(),
            vcodec: Some(vcodec.to_string()),
            acodec: Some(acodec.to_string()),
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_categorize_partitions_by_codec() {
        let formats = vec![
            fmt("18", "avc1", "mp4a", Some(360)),
            fmt("137", "avc1", "none", Some(1080)),
            fmt("140", "none", "mp4a", None),
            fmt("sb0", "none", "none", None),
        ];
        let categorized = categorize(&formats);

        assert_eq!(categorized.progressive[0].format_id, "18");
        assert_eq!(categorized.video_only[0].format_id, "137");
        assert_eq!(categorized.audio_only[0].format_id, "140");
        let total = categorized.progressive.len()
            + categorized.video_only.len()
            + categorized.audio_only.len();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_video_sort_by_height_fps_bitrate() {
        let mut formats = vec![
            Format {
                format_id: "720p30".into(),
                height: Some(720),
                fps: Some(30.0),
                ..Default::default()
            },
            Format {
                format_id: "1080p30-low".into(),
                height: Some(1080),
                fps: Some(30.0),
                tbr: Some(2000.0),
                ..Default::default()
            },
            Format {
                format_id: "1080p60".into(),
                height: Some(1080),
                fps: Some(60.0),
                ..Default::default()
            },
            Format {
                format_id: "1080p30-high".into(),
                height: Some(1080),
                fps: Some(30.0),
                vbr: Some(4000.0),
                ..Default::default()
            },
        ];
        sort_by_quality(&mut formats, MediaKind::Video);
        let ids: Vec<&str> = formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, ["1080p60", "1080p30-high", "1080p30-low", "720p30"]);
    }

    #[test]
    fn test_audio_sort_by_bitrate_then_sample_rate() {
        let mut formats = vec![
            Format {
                format_id: "a".into(),
                abr: Some(128.0),
                asr: Some(44100.0),
                ..Default::default()
            },
            Format {
                format_id: "b".into(),
                abr: Some(160.0),
                ..Default::default()
            },
            Format {
                format_id: "c".into(),
                tbr: Some(128.0),
                asr: Some(48000.0),
                ..Default::default()
            },
        ];
        sort_by_quality(&mut formats, MediaKind::Audio);
        let ids: Vec<&str> = formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let formats: Vec<Format> = ["x", "y", "z"]
            .iter()
            .map(|id| Format {
                format_id: id.to_string(),
                height: Some(480),
                ..Default::default()
            })
            .collect();
        let sorted = sorted_by_quality(&formats, MediaKind::Video);
        assert_eq!(sorted, formats);
        assert_eq!(sorted_by_quality(&sorted, MediaKind::Video), sorted);
    }
}
