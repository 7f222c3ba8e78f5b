//! `YtDlpFetcher` driven against scripted stand-ins for the yt-dlp binary.
#![cfg(unix)]

use converso::extractor::{FetchEvent, FetchRequest, MediaFetcher, YtDlpFetcher};
use converso::ConversoError;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts events logged at ERROR level
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Write an executable shell script and return its path
fn fake_ytdlp(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path
}

fn request() -> FetchRequest {
    FetchRequest {
        url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        format: "18".to_string(),
        output_template: "/tmp/out/%(title)s.%(ext)s".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_download_reports_progress_and_final_file() {
    let dir = TempDir::new().expect("temp dir");
    let script = fake_ytdlp(
        &dir,
        r#"echo '[converso-title] Never Gonna Give You Up'
echo '[converso] downloading|512|1024|NA|256.0|2|/tmp/out/song.mp4'
echo '[converso] finished|1024|1024|NA|NA|NA|/tmp/out/song.mp4'
echo '[converso-file] /tmp/out/song.mp4'"#,
    );
    let fetcher = YtDlpFetcher::with_path(script);

    let mut events = Vec::new();
    let mut hook = |event: FetchEvent| -> Result<(), ConversoError> {
        events.push(event);
        Ok(())
    };
    let outcome = fetcher.download(&request(), &mut hook).await.expect("download");

    assert_eq!(outcome.title, "Never Gonna Give You Up");
    assert_eq!(outcome.filename, "/tmp/out/song.mp4");
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        FetchEvent::Downloading {
            downloaded_bytes: 512,
            total_bytes: Some(1024),
            ..
        }
    ));
}

#[tokio::test]
async fn test_download_survives_non_utf8_output() {
    let dir = TempDir::new().expect("temp dir");
    // A mangled line followed by enough output to fill the pipe several times
    let script = fake_ytdlp(
        &dir,
        r#"printf '\377\376 bad\n'
yes 'chatter from yt-dlp' | head -n 20000
echo '[converso-file] /tmp/x.mp4'"#,
    );
    let fetcher = YtDlpFetcher::with_path(script);

    let mut hook = |_: FetchEvent| -> Result<(), ConversoError> { Ok(()) };
    let outcome = fetcher.download(&request(), &mut hook).await.expect("download");
    assert_eq!(outcome.filename, "/tmp/x.mp4");
}

#[tokio::test]
async fn test_failed_exit_carries_last_error_line() {
    let dir = TempDir::new().expect("temp dir");
    let script = fake_ytdlp(
        &dir,
        r#"echo 'WARNING: falling back' >&2
echo 'ERROR: [youtube] x: Video unavailable' >&2
exit 1"#,
    );
    let fetcher = YtDlpFetcher::with_path(script);

    let mut hook = |_: FetchEvent| -> Result<(), ConversoError> { Ok(()) };
    let err = fetcher
        .download(&request(), &mut hook)
        .await
        .expect_err("non-zero exit must fail");

    assert_eq!(err.to_string(), "Download failed: [youtube] x: Video unavailable");
    assert!(matches!(
        err.downcast_ref::<ConversoError>(),
        Some(ConversoError::DownloadFailed(_))
    ));
}

#[tokio::test]
async fn test_hook_error_stops_the_process() {
    let dir = TempDir::new().expect("temp dir");
    let script = fake_ytdlp(
        &dir,
        r#"echo '[converso] downloading|1|100|NA|NA|NA|/tmp/out/slow.mp4'
sleep 30
echo '[converso-file] /tmp/out/slow.mp4'"#,
    );
    let fetcher = YtDlpFetcher::with_path(script);

    let mut hook = |_: FetchEvent| -> Result<(), ConversoError> { Err(ConversoError::Cancelled) };
    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        fetcher.download(&request(), &mut hook),
    )
    .await
    .expect("cancelled download must not wait for yt-dlp");

    let err = result.expect_err("hook error must abort");
    assert!(matches!(
        err.downcast_ref::<ConversoError>(),
        Some(ConversoError::Cancelled)
    ));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_metadata_url_follows_option_terminator() {
    let dir = TempDir::new().expect("temp dir");
    // Refuse to answer unless the URL comes right after `--`
    let script = fake_ytdlp(
        &dir,
        r#"prev=''
before=''
for arg in "$@"; do before="$prev"; prev="$arg"; done
[ "$before" = "--" ] || { echo "ERROR: url not terminated" >&2; exit 2; }
echo '{"id": "dQw4w9WgXcQ", "title": "Never Gonna Give You Up", "entries": []}'"#,
    );
    let fetcher = YtDlpFetcher::with_path(script);

    let info = fetcher
        .extract_info("-dQw4w9WgXcQ")
        .await
        .expect("metadata");
    assert_eq!(info.id, "dQw4w9WgXcQ");

    let playlist = fetcher
        .extract_playlist("https://www.youtube.com/playlist?list=PL1")
        .await
        .expect("playlist");
    assert_eq!(playlist.title.as_deref(), Some("Never Gonna Give You Up"));
}

#[tokio::test]
async fn test_unavailable_video_is_not_logged_as_error() {
    let dir = TempDir::new().expect("temp dir");
    let script = fake_ytdlp(&dir, "echo 'ERROR: [youtube] x: Private video' >&2\nexit 1");
    let fetcher = YtDlpFetcher::with_path(script);

    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let err = fetcher
        .extract_info("https://www.youtube.com/watch?v=xxxxxxxxxxx")
        .await
        .expect_err("non-zero exit must fail");
    assert!(err.to_string().contains("Private video"));
    // An unavailable video is an expected outcome, not an error-level event
    assert_eq!(errors.load(Ordering::SeqCst), 0);
}
