//! Download orchestration over a `MediaFetcher`

use crate::downloader::options::DownloadOptions;
use crate::downloader::progress::DownloadProgress;
use crate::extractor::request::{
    FetchEvent, FetchRequest, PostProcessor, SubtitleRequest, TransferSettings,
};
use crate::extractor::traits::MediaFetcher;
use crate::utils::config::Settings;
use crate::utils::error::ConversoError;
use crate::utils::files::with_extension;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Container used when separate streams are merged and none was requested
pub const DEFAULT_MERGE_CONTAINER: &str = "mp4";

/// Transcoding arguments applied to merged mp4/mov output for broad player support
const COMPAT_FFMPEG_ARGS: &[&str] = &[
    "-c:v",
    "libx264",
    "-c:a",
    "aac",
    "-preset",
    "fast",
    "-movflags",
    "+faststart",
];

/// WebM only carries VP8/VP9/AV1 video with Vorbis/Opus audio
const WEBM_FFMPEG_ARGS: &[&str] = &["-c:v", "libvpx-vp9", "-c:a", "libopus"];

const FLV_FFMPEG_ARGS: &[&str] = &["-c:v", "libx264", "-c:a", "aac"];

const AVI_FFMPEG_ARGS: &[&str] = &["-c:v", "libx264", "-c:a", "libmp3lame"];

/// ffmpeg arguments for merging separate streams into `container`.
/// Matroska holds any codec pair, so streams are copied as-is.
pub fn merge_ffmpeg_args(container: &str) -> &'static [&'static str] {
    match container {
        "mp4" | "mov" => COMPAT_FFMPEG_ARGS,
        "webm" => WEBM_FFMPEG_ARGS,
        "flv" => FLV_FFMPEG_ARGS,
        "avi" => AVI_FFMPEG_ARGS,
        _ => &[],
    }
}

/// Final result of one download
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Completed {
        filepath: String,
        title: String,
        filesize: u64,
    },
    Failed {
        error: String,
    },
}

impl DownloadOutcome {
    fn failed(error: impl Into<String>) -> Self {
        DownloadOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DownloadOutcome::Failed { error } => Some(error),
            DownloadOutcome::Completed { .. } => None,
        }
    }
}

/// Shared cancellation flag. Setting it aborts the in-flight download at its
/// next progress event.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Turns a URL, a format selection and options into a delegated fetch
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn MediaFetcher>,
    output_dir: PathBuf,
    /// yt-dlp output template without directory or extension
    output_template: String,
    transfer: TransferSettings,
    cancel: CancelHandle,
}

impl DownloadOrchestrator {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
            output_template: "%(title)s".to_string(),
            transfer: TransferSettings::default(),
            cancel: CancelHandle::default(),
        }
    }

    /// Orchestrator configured from persisted settings
    pub fn from_settings(fetcher: Arc<dyn MediaFetcher>, settings: &Settings) -> Self {
        Self::new(fetcher, settings.download_location.clone())
            .with_output_template(settings.output_template())
            .with_transfer(TransferSettings {
                retries: settings.retry_attempts,
                socket_timeout_secs: settings.timeout,
                rate_limit: settings.rate_limit().map(str::to_string),
            })
    }

    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = template.into();
        self
    }

    pub fn with_transfer(mut self, transfer: TransferSettings) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Handle that can cancel downloads from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Build the request handed to the fetcher. Pure: no I/O.
    pub fn build_request(
        &self,
        url: &str,
        format_id: &str,
        options: &DownloadOptions,
    ) -> FetchRequest {
        let output_template = self
            .output_dir
            .join(format!("{}.%(ext)s", self.output_template))
            .to_string_lossy()
            .into_owned();

        let mut request = FetchRequest {
            url: url.to_string(),
            format: format_id.to_string(),
            output_template,
            merge_output_format: Some(
                options
                    .merge_output_format
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MERGE_CONTAINER.to_string()),
            ),
            transfer: self.transfer.clone(),
            ..Default::default()
        };

        if request.is_merge() {
            let container = request
                .merge_output_format
                .as_deref()
                .unwrap_or(DEFAULT_MERGE_CONTAINER);
            request.ffmpeg_args = merge_ffmpeg_args(container)
                .iter()
                .map(|a| a.to_string())
                .collect();
        }

        if options.extract_audio {
            request.postprocessors.push(PostProcessor::ExtractAudio {
                codec: options.audio_format.extension().to_string(),
                quality: options.audio_quality.clone(),
            });
        }
        if options.embed_thumbnail {
            request.postprocessors.push(PostProcessor::EmbedThumbnail);
        }
        if options.embed_metadata {
            request.postprocessors.push(PostProcessor::EmbedMetadata);
        }
        if options.embed_chapters {
            request.postprocessors.push(PostProcessor::EmbedChapters);
        }

        if options.download_subtitles {
            request.subtitles = Some(SubtitleRequest {
                languages: options.subtitle_languages.clone(),
                format: options.subtitle_format.clone(),
            });
        }

        request
    }

    /// Download `url` in format `format_id`, reporting progress to `on_progress`.
    ///
    /// Never returns an error: every failure, cancellation included, becomes
    /// `DownloadOutcome::Failed`.
    pub async fn download<F>(
        &self,
        url: &str,
        format_id: &str,
        options: &DownloadOptions,
        mut on_progress: F,
    ) -> DownloadOutcome
    where
        F: FnMut(&DownloadProgress) + Send,
    {
        if let Err(e) = options.validate() {
            return DownloadOutcome::failed(e.to_string());
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            warn!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            );
            return DownloadOutcome::failed(ConversoError::IoError(e).to_string());
        }

        let request = self.build_request(url, format_id, options);
        debug!("Fetch request: {:?}", request);

        let cancel = self.cancel.clone();
        let mut hook = move |event: FetchEvent| -> Result<(), ConversoError> {
            if cancel.is_cancelled() {
                return Err(ConversoError::Cancelled);
            }
            on_progress(&DownloadProgress::from_event(&event));
            Ok(())
        };

        let fetched = match self.fetcher.download(&request, &mut hook).await {
            Ok(fetched) => fetched,
            Err(e) => {
                match e.downcast_ref::<ConversoError>() {
                    Some(err) if err.is_user_facing() => info!("Download of {} stopped: {}", url, err),
                    _ => warn!("Download of {} failed: {:#}", url, e),
                }
                return DownloadOutcome::failed(format!("{:#}", e));
            }
        };

        let filepath = final_path(&fetched.filename, options);
        let filesize = tokio::fs::metadata(&filepath)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);

        info!("Downloaded {} to {}", url, filepath);
        DownloadOutcome::Completed {
            filepath,
            title: fetched.title,
            filesize,
        }
    }
}

/// Path of the file after post-processing changed its extension
pub fn final_path(prepared: &str, options: &DownloadOptions) -> String {
    match options.output_extension() {
        Some(ext) if !prepared.is_empty() => with_extension(prepared, ext),
        _ => prepared.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::options::AudioFormat;
    use crate::extractor::models::RawVideoInfo;
    use crate::extractor::request::FetchOutcome;
    use crate::extractor::traits::ProgressHook;
    use anyhow::Result;
    use async_trait::async_trait;

    struct UnusedFetcher;

    #[async_trait]
    impl MediaFetcher for UnusedFetcher {
        fn id(&self) -> &'static str {
            "unused"
        }

        async fn extract_info(&self, _url: &str) -> Result<RawVideoInfo> {
            unreachable!()
        }

        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<RawVideoInfo>> {
            unreachable!()
        }

        async fn extract_playlist(&self, _url: &str) -> Result<RawVideoInfo> {
            unreachable!()
        }

        async fn download(
            &self,
            _request: &FetchRequest,
            _hook: &mut ProgressHook<'_>,
        ) -> Result<FetchOutcome> {
            unreachable!()
        }
    }

    fn orchestrator() -> DownloadOrchestrator {
        DownloadOrchestrator::new(Arc::new(UnusedFetcher), "/downloads")
            .with_output_template("%(title)s_%(resolution)s")
    }

    #[test]
    fn test_merge_request() {
        let options = DownloadOptions {
            embed_thumbnail: true,
            embed_metadata: true,
            ..Default::default()
        };
        let request = orchestrator().build_request("https://youtu.be/x", "137+bestaudio", &options);

        assert_eq!(
            request.output_template,
            "/downloads/%(title)s_%(resolution)s.%(ext)s"
        );
        assert_eq!(request.merge_output_format.as_deref(), Some("mp4"));
        assert_eq!(request.ffmpeg_args[1], "libx264");
        assert_eq!(
            request.postprocessors,
            vec![PostProcessor::EmbedThumbnail, PostProcessor::EmbedMetadata]
        );
        assert!(request.subtitles.is_none());
    }

    #[test]
    fn test_webm_merge_keeps_webm_codecs() {
        let options = DownloadOptions::default().merged_into("webm");
        assert!(options.validate().is_ok());
        let request = orchestrator().build_request("u", "248+bestaudio", &options);

        assert_eq!(request.merge_output_format.as_deref(), Some("webm"));
        assert_eq!(
            request.ffmpeg_args,
            vec!["-c:v", "libvpx-vp9", "-c:a", "libopus"]
        );
        assert!(!request.ffmpeg_args.iter().any(|a| a == "libx264" || a == "aac"));
    }

    #[test]
    fn test_merge_args_per_container() {
        assert!(merge_ffmpeg_args("mov").contains(&"+faststart"));
        assert!(merge_ffmpeg_args("mkv").is_empty());
        assert!(merge_ffmpeg_args("avi").contains(&"libmp3lame"));

        let options = DownloadOptions::default().merged_into("mkv");
        let request = orchestrator().build_request("u", "248+bestaudio", &options);
        assert!(request.ffmpeg_args.is_empty());
    }

    #[test]
    fn test_single_stream_has_no_transcode() {
        let request = orchestrator().build_request("u", "22", &DownloadOptions::default());
        assert!(request.ffmpeg_args.is_empty());
        assert!(request.postprocessors.is_empty());
    }

    #[test]
    fn test_audio_extraction_comes_first() {
        let options = DownloadOptions {
            embed_thumbnail: true,
            ..Default::default()
        }
        .audio_only(AudioFormat::Mp3);
        let request = orchestrator().build_request("u", "bestaudio", &options);

        assert_eq!(
            request.postprocessors[0],
            PostProcessor::ExtractAudio {
                codec: "mp3".to_string(),
                quality: "320".to_string()
            }
        );
        assert_eq!(request.postprocessors[1], PostProcessor::EmbedThumbnail);
    }

    #[test]
    fn test_subtitles_and_transfer_settings() {
        let mut settings = Settings::default();
        settings.download_location = PathBuf::from("/media");
        settings.speed_limit = "1M".to_string();
        settings.retry_attempts = 5;
        let orchestrator = DownloadOrchestrator::from_settings(Arc::new(UnusedFetcher), &settings);

        let options = DownloadOptions {
            download_subtitles: true,
            subtitle_languages: vec!["en".into(), "de".into()],
            ..Default::default()
        };
        let request = orchestrator.build_request("u", "18", &options);

        assert_eq!(request.transfer.retries, 5);
        assert_eq!(request.transfer.rate_limit.as_deref(), Some("1M"));
        assert_eq!(request.subtitles.unwrap().languages, vec!["en", "de"]);
        assert!(request.output_template.starts_with("/media"));
    }

    #[test]
    fn test_final_path_rewrites() {
        let audio = DownloadOptions::default().audio_only(AudioFormat::Opus);
        assert_eq!(final_path("/d/song.webm", &audio), "/d/song.opus");

        let merged = DownloadOptions::default().merged_into("mkv");
        assert_eq!(final_path("/d/clip.f137.mp4", &merged), "/d/clip.f137.mkv");

        assert_eq!(final_path("/d/clip.webm", &DownloadOptions::default()), "/d/clip.webm");
        assert_eq!(final_path("", &audio), "");
    }

    #[test]
    fn test_cancel_handle_is_shared() {
        let orchestrator = orchestrator();
        let handle = orchestrator.cancel_handle();
        assert!(!orchestrator.is_cancelled());
        handle.cancel();
        assert!(orchestrator.is_cancelled());
    }
}
