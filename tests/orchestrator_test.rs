//! Download orchestration against a scripted fetcher, without touching the network.

mod common;

use common::FakeFetcher;
use converso::downloader::{
    AudioFormat, DownloadOptions, DownloadOrchestrator, DownloadOutcome, DownloadStatus,
};
use converso::extractor::{FetchEvent, FetchOutcome, PostProcessor};
use std::sync::Arc;
use tempfile::TempDir;

fn progress_events() -> Vec<FetchEvent> {
    vec![
        FetchEvent::Downloading {
            downloaded_bytes: 50,
            total_bytes: None,
            total_bytes_estimate: Some(100),
            speed: Some(10.0),
            eta: Some(5),
        },
        FetchEvent::Finished {
            filename: "ignored".to_string(),
        },
    ]
}

#[tokio::test]
async fn completed_download_reports_final_path_and_size() {
    let temp = TempDir::new().expect("temp dir");
    let prepared = temp.path().join("Clip.webm");
    let final_file = temp.path().join("Clip.mkv");
    std::fs::write(&final_file, vec![0u8; 42]).expect("write file");

    let fetcher = Arc::new(FakeFetcher {
        events: progress_events(),
        outcome: Some(FetchOutcome {
            title: "Clip".to_string(),
            filename: prepared.to_string_lossy().into_owned(),
        }),
        ..Default::default()
    });
    let orchestrator = DownloadOrchestrator::new(fetcher.clone(), temp.path());

    let mut seen = Vec::new();
    let outcome = orchestrator
        .download(
            "https://youtu.be/dQw4w9WgXcQ",
            "137+bestaudio",
            &DownloadOptions::default().merged_into("mkv"),
            |p| seen.push((p.status, p.percent())),
        )
        .await;

    assert_eq!(
        outcome,
        DownloadOutcome::Completed {
            filepath: final_file.to_string_lossy().into_owned(),
            title: "Clip".to_string(),
            filesize: 42,
        }
    );
    assert_eq!(
        seen,
        vec![
            (DownloadStatus::Downloading, 50.0),
            (DownloadStatus::Finished, 100.0)
        ]
    );

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].merge_output_format.as_deref(), Some("mkv"));
    // Matroska takes the streams as they are
    assert!(requests[0].ffmpeg_args.is_empty());
}

#[tokio::test]
async fn audio_extraction_rewrites_extension() {
    let temp = TempDir::new().expect("temp dir");
    let fetcher = Arc::new(FakeFetcher {
        outcome: Some(FetchOutcome {
            title: "Song".to_string(),
            filename: temp.path().join("Song.webm").to_string_lossy().into_owned(),
        }),
        ..Default::default()
    });
    let orchestrator = DownloadOrchestrator::new(fetcher.clone(), temp.path());

    let outcome = orchestrator
        .download(
            "https://youtu.be/dQw4w9WgXcQ",
            "bestaudio",
            &DownloadOptions::default().audio_only(AudioFormat::Mp3),
            |_| {},
        )
        .await;

    match outcome {
        DownloadOutcome::Completed {
            filepath, filesize, ..
        } => {
            assert!(filepath.ends_with("Song.mp3"));
            // Nothing was written, so the size is unknown
            assert_eq!(filesize, 0);
        }
        other => panic!("expected completion, got {:?}", other),
    }

    let request = &fetcher.requests()[0];
    assert_eq!(
        request.postprocessors,
        vec![PostProcessor::ExtractAudio {
            codec: "mp3".to_string(),
            quality: "320".to_string()
        }]
    );
}

#[tokio::test]
async fn cancellation_fails_at_next_progress_event() {
    let temp = TempDir::new().expect("temp dir");
    let fetcher = Arc::new(FakeFetcher {
        events: progress_events(),
        outcome: Some(FetchOutcome {
            title: "Clip".to_string(),
            filename: temp.path().join("Clip.mp4").to_string_lossy().into_owned(),
        }),
        ..Default::default()
    });
    let orchestrator = DownloadOrchestrator::new(fetcher, temp.path());
    orchestrator.cancel_handle().cancel();

    let mut callbacks = 0;
    let outcome = orchestrator
        .download("https://youtu.be/dQw4w9WgXcQ", "22", &DownloadOptions::default(), |_| {
            callbacks += 1
        })
        .await;

    assert_eq!(outcome.error(), Some("Download cancelled by user"));
    assert_eq!(callbacks, 0);
}

#[tokio::test]
async fn fetcher_failure_becomes_failed_outcome() {
    let temp = TempDir::new().expect("temp dir");
    let fetcher = Arc::new(FakeFetcher::default());
    let orchestrator = DownloadOrchestrator::new(fetcher, temp.path().join("nested/out"));

    let outcome = orchestrator
        .download("https://youtu.be/dQw4w9WgXcQ", "22", &DownloadOptions::default(), |_| {})
        .await;

    assert!(!outcome.is_success());
    assert!(outcome.error().unwrap().contains("unable to download"));
    // The output directory is created before the fetch starts
    assert!(temp.path().join("nested/out").is_dir());
}

#[tokio::test]
async fn invalid_options_never_reach_the_fetcher() {
    let temp = TempDir::new().expect("temp dir");
    let fetcher = Arc::new(FakeFetcher::default());
    let orchestrator = DownloadOrchestrator::new(fetcher.clone(), temp.path());

    let outcome = orchestrator
        .download(
            "https://youtu.be/dQw4w9WgXcQ",
            "22",
            &DownloadOptions::default().merged_into("exe"),
            |_| {},
        )
        .await;

    assert!(outcome.error().unwrap().contains("Unsupported output container"));
    assert!(fetcher.calls().is_empty());
}
