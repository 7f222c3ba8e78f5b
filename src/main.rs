//! Converso - search, inspect and download YouTube videos
//!
//! Command-line front end over the `converso` library. yt-dlp does the
//! extraction and fetching; this binary resolves input, picks formats and
//! reports progress.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use converso::app::{Converso, LookupOutcome};
use converso::downloader::{AudioFormat, DownloadOutcome, DownloadProgress, DownloadStatus};
use converso::extractor::{MediaFetcher, VideoDetails, YtDlpFetcher};
use converso::formats::{categorize, format_label, FormatFilter, QualityTier};
use converso::update::{Platform, UpdateChecker, UpdateStatus, DEFAULT_TIMEOUT};
use converso::utils::{format_size, SettingsStore};
use converso::version::{self, APP_NAME, REPO_URL};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "converso", version, about = "Search, inspect and download YouTube videos")]
struct Cli {
    /// Settings file (default: ~/.converso/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for videos
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = converso::resolver::DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },
    /// Show details for a URL, video id or search phrase
    Info { input: String },
    /// List available formats, best first
    Formats {
        input: String,
        #[arg(long)]
        min_height: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        /// Codec substring, e.g. vp9 or avc1 (repeatable)
        #[arg(long = "codec")]
        codecs: Vec<String>,
        /// Container extension, e.g. mp4 (repeatable)
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },
    /// Download one or more videos
    Download {
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Quality tier (default: the quality_preference setting)
        #[arg(short, long, value_enum)]
        quality: Option<QualityTier>,
        /// Extract audio in this format instead of downloading video
        #[arg(short, long, value_enum, conflicts_with = "format")]
        audio: Option<AudioFormat>,
        /// Download this exact format id
        #[arg(short, long)]
        format: Option<String>,
        /// Merge the chosen format with the best audio stream
        #[arg(long, requires = "format")]
        merge_audio: bool,
    },
    /// List (and optionally download) a playlist
    Playlist {
        url: String,
        #[arg(long)]
        download: bool,
        #[arg(short, long, value_enum)]
        quality: Option<QualityTier>,
    },
    /// Inspect or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Check GitHub for a newer release
    CheckUpdate {
        #[arg(long, value_enum)]
        platform: Option<Platform>,
    },
    /// Print version information
    Version,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Get { key: String },
    /// Set a key; the value is parsed as JSON, falling back to a plain string
    Set { key: String, value: String },
    Reset,
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut store = match &cli.settings {
        Some(path) => SettingsStore::open(path),
        None => SettingsStore::open_default(),
    };

    match cli.command {
        Command::Settings { action } => settings_command(&mut store, action),
        Command::CheckUpdate { platform } => check_update(platform).await,
        Command::Version => {
            println!("{} {}", APP_NAME, version::version_string());
            println!("{}", version::DESCRIPTION);
            println!("{}", REPO_URL);
            Ok(())
        }
        command => {
            let fetcher: Arc<dyn MediaFetcher> = Arc::new(YtDlpFetcher::new()?);
            let app = Converso::new(fetcher, store.settings().clone());

            let cancel = app.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nCancelling...");
                    cancel.cancel();
                }
            });

            media_command(&app, command).await
        }
    }
}

async fn media_command(app: &Converso, command: Command) -> Result<()> {
    match command {
        Command::Search { query, max_results } => {
            let results = app.search(&query.join(" "), max_results).await;
            if results.is_empty() {
                println!("No results found");
            }
            for (i, result) in results.iter().enumerate() {
                print_result(i, result);
            }
            Ok(())
        }
        Command::Info { input } => {
            if let Some(details) = resolve(app, &input).await {
                print_details(&details);
            }
            Ok(())
        }
        Command::Formats {
            input,
            min_height,
            max_height,
            codecs,
            extensions,
        } => {
            let Some(details) = resolve(app, &input).await else {
                return Ok(());
            };
            let filter = FormatFilter {
                min_height,
                max_height,
                codecs,
                extensions,
                ..Default::default()
            };
            let categorized = categorize(&filter.apply(&details.formats)).ranked();
            if categorized.is_empty() {
                println!("No formats match");
            }
            for (heading, formats) in [
                ("Video + audio", &categorized.progressive),
                ("Video only", &categorized.video_only),
                ("Audio only", &categorized.audio_only),
            ] {
                if formats.is_empty() {
                    continue;
                }
                println!("{}:", heading);
                for format in formats {
                    println!("  {:>8}  {:<5} {}", format.format_id, format.ext, format_label(format));
                }
            }
            Ok(())
        }
        Command::Download {
            inputs,
            quality,
            audio,
            format,
            merge_audio,
        } => {
            let quality = quality.unwrap_or(app.settings().quality_preference);

            if inputs.len() > 1 && audio.is_none() && format.is_none() {
                let outcomes = app
                    .download_batch(&inputs, quality, |_, progress| print_progress(progress))
                    .await;
                return report_all(outcomes.iter().map(|(_, outcome)| outcome));
            }

            let mut outcomes = Vec::new();
            for input in &inputs {
                let Some(details) = resolve(app, input).await else {
                    outcomes.push(DownloadOutcome::Failed {
                        error: format!("Nothing to download for '{}'", input),
                    });
                    continue;
                };
                println!("⬇️  {}", details.title);
                let outcome = match (&format, audio) {
                    (Some(format_id), _) => {
                        app.download_format(&details, format_id, merge_audio, print_progress)
                            .await
                    }
                    (None, Some(audio_format)) => {
                        app.download_audio(&details, audio_format, print_progress).await
                    }
                    (None, None) => app.download_video(&details, quality, print_progress).await,
                };
                report(&outcome);
                outcomes.push(outcome);
            }
            fail_on_errors(&outcomes)
        }
        Command::Playlist {
            url,
            download,
            quality,
        } => {
            let (urls, info) = app.playlist(&url).await;
            let Some(info) = info else {
                bail!("Could not read playlist {}", url);
            };
            println!("📃 {} by {} ({} videos)", info.title, info.uploader, info.video_count);
            for (i, video_url) in urls.iter().enumerate() {
                println!("{:>3}. {}", i + 1, video_url);
            }

            if download {
                let quality = quality.unwrap_or(app.settings().quality_preference);
                let outcomes = app
                    .download_batch(&urls, quality, |_, progress| print_progress(progress))
                    .await;
                return report_all(outcomes.iter().map(|(_, outcome)| outcome));
            }
            Ok(())
        }
        Command::Settings { .. } | Command::CheckUpdate { .. } | Command::Version => Ok(()),
    }
}

/// Resolve input to one video, taking the top search hit for phrases
async fn resolve(app: &Converso, input: &str) -> Option<Arc<VideoDetails>> {
    match app.lookup(input).await {
        LookupOutcome::Video(details) => Some(details),
        LookupOutcome::Candidates(results) => {
            let top = results.first()?;
            println!("🔎 Using top result: {}", top.title);
            let details = app.video_details(&top.url, true).await;
            if details.is_none() {
                println!("❌ Could not load {}", top.url);
            }
            details
        }
        LookupOutcome::Empty => {
            println!("Please enter a URL, video id or search phrase");
            None
        }
        LookupOutcome::Invalid(message) => {
            println!("❌ {}", message);
            None
        }
        LookupOutcome::NotFound => {
            println!("❌ Nothing found for '{}'", input.trim());
            None
        }
    }
}

fn print_result(index: usize, result: &converso::resolver::SearchResult) {
    let duration = result
        .duration
        .map(converso::utils::format_duration)
        .unwrap_or_else(|| "Unknown".to_string());
    println!("{:>2}. {}", index + 1, result.title);
    println!(
        "    {} • {} • {} views",
        result.uploader, duration, result.view_count
    );
    println!("    {}", result.url);
}

fn print_details(details: &VideoDetails) {
    println!("🎬 {}", details.title);
    println!("   Uploader:   {}", details.uploader);
    println!("   Duration:   {}", details.duration_formatted);
    println!("   Views:      {}", details.view_count);
    println!("   Uploaded:   {}", details.upload_date);
    println!("   Resolution: {}", details.resolution);
    println!("   Size:       {}", details.estimated_size);
    println!("   Formats:    {}", details.formats.len());
    if !details.subtitle_languages.is_empty() {
        println!("   Subtitles:  {}", details.subtitle_languages.join(", "));
    }
    println!("   URL:        {}", details.webpage_url);
}

fn print_progress(progress: &DownloadProgress) {
    match progress.status {
        DownloadStatus::Downloading => {
            eprint!(
                "\rDownloading: {:5.1}% • Speed: {}/s    ",
                progress.percent().min(100.0),
                format_size(progress.speed as i64)
            );
            let _ = std::io::stderr().flush();
        }
        DownloadStatus::Finished => eprintln!("\rProcessing...                              "),
    }
}

fn report(outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Completed {
            filepath,
            title,
            filesize,
        } => {
            println!("✅ Downloaded: {}", title);
            println!("📁 Saved to: {} ({})", filepath, format_size(*filesize as i64));
        }
        DownloadOutcome::Failed { error } => println!("❌ {}", error),
    }
}

fn report_all<'a>(outcomes: impl Iterator<Item = &'a DownloadOutcome>) -> Result<()> {
    let outcomes: Vec<DownloadOutcome> = outcomes.cloned().collect();
    for outcome in &outcomes {
        report(outcome);
    }
    fail_on_errors(&outcomes)
}

fn fail_on_errors(outcomes: &[DownloadOutcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        bail!("{} of {} downloads failed", failed, outcomes.len());
    }
    Ok(())
}

fn settings_command(store: &mut SettingsStore, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(store.settings())?);
        }
        SettingsAction::Get { key } => match store.get(&key) {
            Some(value) => println!("{}", value),
            None => bail!("Unknown setting '{}'", key),
        },
        SettingsAction::Set { key, value } => {
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            store.set(&key, value)?;
            store.save()?;
            println!("✅ {} updated", key);
        }
        SettingsAction::Reset => {
            store.reset_to_defaults()?;
            println!("✅ Settings reset!");
        }
        SettingsAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}

async fn check_update(platform: Option<Platform>) -> Result<()> {
    let checker = UpdateChecker::new(version::VERSION, REPO_URL)?;
    match checker.check_for_updates(DEFAULT_TIMEOUT).await {
        UpdateStatus::NoUpdate => println!("✅ {} is up to date", version::version_string()),
        UpdateStatus::Available(release) => {
            println!("{}", checker.format_update_message(&release));
            let platform = platform.unwrap_or_else(Platform::current);
            println!("\nDownload: {}", checker.download_url(&release, platform));
        }
    }
    Ok(())
}
