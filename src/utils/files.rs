//! Filesystem helpers used around downloads

use std::path::Path;

/// Replace the extension of a file path string
pub fn with_extension(filepath: &str, ext: &str) -> String {
    Path::new(filepath)
        .with_extension(ext)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("/tmp/song.webm", "mp3"), "/tmp/song.mp3");
        assert_eq!(with_extension("/tmp/clip.f137.mp4", "mkv"), "/tmp/clip.f137.mkv");
        assert_eq!(with_extension("clip", "mp4"), "clip.mp4");
    }
}
