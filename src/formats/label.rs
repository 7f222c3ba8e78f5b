//! Display labels and criteria filtering for formats

use crate::extractor::models::Format;

/// Compact size used inside labels, e.g. "850MB"
fn compact_size(bytes: u64) -> String {
    if bytes == 0 {
        return "?".to_string();
    }
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.0}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.0}TB", size)
}

fn codec_name(codec: &str) -> String {
    codec
        .split('.')
        .next()
        .unwrap_or(codec)
        .to_uppercase()
        .chars()
        .take(10)
        .collect()
}

/// Human-readable label, e.g. "1080p60 • VP9 • 850MB"
pub fn format_label(format: &Format) -> String {
    let mut parts = Vec::new();

    if let Some(height) = format.height {
        let fps = format.fps.unwrap_or(30.0);
        if fps > 30.0 {
            parts.push(format!("{}p{}", height, fps as u32));
        } else {
            parts.push(format!("{}p", height));
        }
    }

    if format.has_video() {
        if let Some(vcodec) = &format.vcodec {
            parts.push(codec_name(vcodec));
        }
    }

    // The audio codec is named only when the video codec is missing entirely;
    // an explicit "none" leaves the bitrate to identify the stream.
    let vcodec_missing = format.vcodec.as_deref().map_or(true, str::is_empty);
    if vcodec_missing && format.has_audio() {
        if let Some(acodec) = &format.acodec {
            parts.push(codec_name(acodec));
        }
    }

    if let Some(size) = format.effective_size() {
        parts.push(compact_size(size));
    }

    if let Some(abr) = format.abr.filter(|a| *a > 0.0) {
        parts.push(format!("{}kbps", abr as u32));
    }

    parts.join(" • ")
}

/// Criteria for narrowing a format list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatFilter {
    pub min_height: Option<u32>,
    pub max_height: Option<u32>,
    pub min_bitrate: Option<f64>,
    pub max_bitrate: Option<f64>,
    /// Codec substrings, matched case-insensitively against both codecs
    pub codecs: Vec<String>,
    pub extensions: Vec<String>,
}

impl FormatFilter {
    fn bitrate(format: &Format) -> f64 {
        [format.tbr, format.vbr, format.abr]
            .into_iter()
            .flatten()
            .find(|b| *b != 0.0)
            .unwrap_or(0.0)
    }

    pub fn matches(&self, format: &Format) -> bool {
        if let Some(min) = self.min_height {
            if format.height.unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(max) = self.max_height {
            if format.height.unwrap_or(u32::MAX) > max {
                return false;
            }
        }

        let bitrate = Self::bitrate(format);
        if self.min_bitrate.is_some_and(|min| bitrate < min) {
            return false;
        }
        if self.max_bitrate.is_some_and(|max| bitrate > max) {
            return false;
        }

        if !self.codecs.is_empty() {
            let codecs = format!(
                "{}{}",
                format.vcodec.as_deref().unwrap_or(""),
                format.acodec.as_deref().unwrap_or("")
            )
            .to_lowercase();
            if !self.codecs.iter().any(|c| codecs.contains(&c.to_lowercase())) {
                return false;
            }
        }

        if !self.extensions.is_empty() && !self.extensions.iter().any(|e| *e == format.ext) {
            return false;
        }

        true
    }

    /// Keep the formats that satisfy every criterion, preserving order
    pub fn apply(&self, formats: &[Format]) -> Vec<Format> {
        formats.iter().filter(|f| self.matches(f)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_label() {
        let format = Format {
            height: Some(1080),
            fps: Some(60.0),
            vcodec: Some("vp9.0".into()),
            acodec: Some("none".into()),
            filesize: Some(850 * 1024 * 1024),
            ..Default::default()
        };
        assert_eq!(format_label(&format), "1080p60 • VP9 • 850MB");
    }

    #[test]
    fn test_audio_label() {
        let format = Format {
            vcodec: Some("none".into()),
            acodec: Some("opus".into()),
            abr: Some(129.4),
            filesize_approx: Some(3 * 1024 * 1024),
            ..Default::default()
        };
        assert_eq!(format_label(&format), "3MB • 129kbps");
    }

    #[test]
    fn test_audio_codec_shown_without_video_codec() {
        let format = Format {
            vcodec: None,
            acodec: Some("mp4a.40.2".into()),
            abr: Some(128.0),
            ..Default::default()
        };
        assert_eq!(format_label(&format), "MP4A • 128kbps");
    }

    #[test]
    fn test_filter_by_height_codec_and_extension() {
        let formats = vec![
            Format {
                format_id: "a".into(),
                ext: "mp4".into(),
                height: Some(1080),
                vcodec: Some("avc1.640028".into()),
                ..Default::default()
            },
            Format {
                format_id: "b".into(),
                ext: "webm".into(),
                height: Some(720),
                vcodec: Some("vp9".into()),
                ..Default::default()
            },
            Format {
                format_id: "c".into(),
                ext: "mp4".into(),
                height: Some(360),
                vcodec: Some("avc1.4d401e".into()),
                ..Default::default()
            },
        ];

        let filter = FormatFilter {
            min_height: Some(480),
            codecs: vec!["AVC1".into()],
            ..Default::default()
        };
        let ids: Vec<String> = filter.apply(&formats).into_iter().map(|f| f.format_id).collect();
        assert_eq!(ids, ["a"]);

        let filter = FormatFilter {
            extensions: vec!["webm".into()],
            max_height: Some(720),
            ..Default::default()
        };
        assert_eq!(filter.apply(&formats).len(), 1);
    }

    #[test]
    fn test_filter_by_bitrate() {
        let formats = vec![
            Format {
                tbr: Some(0.0),
                vbr: Some(500.0),
                ..Default::default()
            },
            Format {
                abr: Some(64.0),
                ..Default::default()
            },
        ];
        let filter = FormatFilter {
            min_bitrate: Some(100.0),
            ..Default::default()
        };
        assert_eq!(filter.apply(&formats).len(), 1);
    }
}
