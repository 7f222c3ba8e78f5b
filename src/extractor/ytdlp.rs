//! yt-dlp subprocess fetcher
//!
//! Metadata, search and playlist listings come from yt-dlp's JSON dumps.
//! Downloads run yt-dlp with a machine-readable progress template so status
//! events can be parsed line by line from its output.

use crate::extractor::models::RawVideoInfo;
use crate::extractor::request::{FetchEvent, FetchOutcome, FetchRequest, PostProcessor};
use crate::extractor::traits::{MediaFetcher, ProgressHook};
use crate::utils::error::ConversoError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const PROGRESS_PREFIX: &str = "[converso]";
const TITLE_PREFIX: &str = "[converso-title]";
const FILE_PREFIX: &str = "[converso-file]";

/// Fields are `|`-separated; the file name goes last since it may contain anything
const PROGRESS_TEMPLATE: &str = "download:[converso] %(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s|%(progress.filename)s";

/// Media fetcher backed by the yt-dlp binary
pub struct YtDlpFetcher {
    ytdlp_path: PathBuf,
}

impl YtDlpFetcher {
    /// Locate yt-dlp and build a fetcher around it
    ///
    /// Search order:
    /// 1. Next to the running executable
    /// 2. System PATH
    /// 3. Common installation paths (Homebrew, pip --user, etc.)
    pub fn new() -> Result<Self> {
        match find_ytdlp() {
            Some(path) => {
                info!("Found yt-dlp at: {}", path.display());
                Ok(Self { ytdlp_path: path })
            }
            None => {
                error!("yt-dlp not found anywhere!");
                Err(ConversoError::YtDlpNotFound.into())
            }
        }
    }

    /// Use a specific yt-dlp binary
    pub fn with_path(ytdlp_path: impl Into<PathBuf>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Run yt-dlp to completion and return its stdout
    async fn run_capture(&self, args: &[String]) -> Result<String> {
        debug!("Running yt-dlp {:?}", args);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .args(args)
            .output()
            .await
            .context("Failed to launch yt-dlp")?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            // Callers decide how loud an unavailable video or failed search is
            debug!("yt-dlp failed: {}", error_msg.trim());
            return Err(ConversoError::Transport(last_error_line(&error_msg)).into());
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    /// Uses: yt-dlp --dump-json --no-download
    async fn extract_info(&self, url: &str) -> Result<RawVideoInfo> {
        let args = strings(&["--dump-json", "--no-download", "--no-playlist", "--no-warnings", "--", url]);
        let json_str = self.run_capture(&args).await?;
        let info: RawVideoInfo =
            serde_json::from_str(json_str.trim()).context("Failed to parse yt-dlp metadata")?;
        Ok(info)
    }

    /// Uses: yt-dlp --flat-playlist --dump-json "ytsearch{count}:{query}"
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawVideoInfo>> {
        let search_query = format!("ytsearch{}:{}", max_results, query);
        let args = strings(&["--flat-playlist", "--dump-json", "--no-warnings", &search_query]);
        let json_str = self.run_capture(&args).await?;
        Ok(parse_json_lines(&json_str))
    }

    /// Uses: yt-dlp --flat-playlist --dump-single-json
    async fn extract_playlist(&self, url: &str) -> Result<RawVideoInfo> {
        let args = strings(&["--flat-playlist", "--dump-single-json", "--no-warnings", "--", url]);
        let json_str = self.run_capture(&args).await?;
        let info: RawVideoInfo =
            serde_json::from_str(json_str.trim()).context("Failed to parse yt-dlp playlist")?;
        Ok(info)
    }

    async fn download(
        &self,
        request: &FetchRequest,
        hook: &mut ProgressHook<'_>,
    ) -> Result<FetchOutcome> {
        let args = download_args(request);
        debug!("Running yt-dlp {:?}", args);

        let mut child = AsyncCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to launch yt-dlp")?;

        // yt-dlp splits its chatter between stdout and stderr depending on
        // quiet mode, so both streams are funnelled into one line channel.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<(bool, String)>();
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, false, line_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, true, line_tx.clone());
        }
        drop(line_tx);

        let mut title = String::new();
        let mut filename = String::new();
        let mut last_error = String::new();

        while let Some((is_stderr, line)) = line_rx.recv().await {
            match parse_output_line(&line) {
                Some(OutputLine::Event(event)) => {
                    if let FetchEvent::Finished { filename: name } = &event {
                        if filename.is_empty() {
                            filename = name.clone();
                        }
                    }
                    if let Err(e) = hook(event) {
                        warn!("Stopping yt-dlp: {}", e);
                        if let Err(kill_err) = child.kill().await {
                            warn!("Failed to stop yt-dlp: {}", kill_err);
                        }
                        return Err(e.into());
                    }
                }
                Some(OutputLine::Title(t)) => title = t,
                Some(OutputLine::FilePath(path)) => filename = path,
                Some(OutputLine::Destination(path)) => {
                    if filename.is_empty() {
                        filename = path;
                    }
                }
                None => {
                    if is_stderr && line.contains("ERROR") {
                        last_error = line;
                    }
                }
            }
        }

        let status = child.wait().await.context("Failed to wait for yt-dlp")?;
        if !status.success() {
            let message = if last_error.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                last_error_line(&last_error)
            };
            return Err(ConversoError::DownloadFailed(message).into());
        }

        info!("yt-dlp finished: {}", filename);
        Ok(FetchOutcome { title, filename })
    }
}

fn spawn_line_reader<R>(reader: R, is_stderr: bool, tx: mpsc::UnboundedSender<(bool, String)>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        // Bytes, not `lines()`: a stray non-UTF-8 line must not stop the pipe
        // from being drained or yt-dlp dies on its next write.
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send((is_stderr, line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read yt-dlp output: {}", e);
                    break;
                }
            }
        }
    });
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Parse newline-delimited JSON entries, skipping lines that do not parse
fn parse_json_lines(output: &str) -> Vec<RawVideoInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<RawVideoInfo>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to parse yt-dlp entry: {}", e);
                None
            }
        })
        .collect()
}

fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "yt-dlp reported an unknown error".to_string())
}

/// Translate a fetch request into yt-dlp command-line arguments
pub fn download_args(request: &FetchRequest) -> Vec<String> {
    let mut args = strings(&[
        "-f",
        &request.format,
        "-o",
        &request.output_template,
        "--newline",
        "--progress",
        "--no-simulate",
        "--progress-template",
        PROGRESS_TEMPLATE,
        "--print",
        "before_dl:[converso-title] %(title)s",
        "--print",
        "after_move:[converso-file] %(filepath)s",
    ]);

    if let Some(container) = &request.merge_output_format {
        args.push("--merge-output-format".into());
        args.push(container.clone());
    }

    if !request.ffmpeg_args.is_empty() {
        args.push("--postprocessor-args".into());
        args.push(format!("ffmpeg:{}", request.ffmpeg_args.join(" ")));
    }

    for step in &request.postprocessors {
        match step {
            PostProcessor::ExtractAudio { codec, quality } => {
                args.push("--extract-audio".into());
                args.push("--audio-format".into());
                args.push(codec.clone());
                args.push("--audio-quality".into());
                args.push(quality.clone());
            }
            PostProcessor::EmbedThumbnail => args.push("--embed-thumbnail".into()),
            PostProcessor::EmbedMetadata => args.push("--embed-metadata".into()),
            PostProcessor::EmbedChapters => args.push("--embed-chapters".into()),
        }
    }

    if let Some(subs) = &request.subtitles {
        args.push("--write-subs".into());
        args.push("--sub-langs".into());
        args.push(subs.languages.join(","));
        args.push("--sub-format".into());
        args.push(subs.format.clone());
        if matches!(subs.format.as_str(), "srt" | "vtt" | "ass" | "lrc") {
            args.push("--convert-subs".into());
            args.push(subs.format.clone());
        }
    }

    args.push("--retries".into());
    args.push(request.transfer.retries.to_string());
    args.push("--socket-timeout".into());
    args.push(request.transfer.socket_timeout_secs.to_string());
    if let Some(limit) = &request.transfer.rate_limit {
        args.push("--limit-rate".into());
        args.push(limit.clone());
    }

    args.push("--".into());
    args.push(request.url.clone());
    args
}

/// A line of yt-dlp output that carries information
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Event(FetchEvent),
    Title(String),
    FilePath(String),
    Destination(String),
}

fn parse_number<T: std::str::FromStr>(field: &str) -> Option<T> {
    let field = field.trim();
    if field.is_empty() || field == "NA" || field == "None" {
        return None;
    }
    field.parse::<T>().ok()
}

/// yt-dlp prints byte counts as floats when they are estimates
fn parse_bytes(field: &str) -> Option<u64> {
    parse_number::<f64>(field)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

/// Parse one line of yt-dlp output
pub fn parse_output_line(line: &str) -> Option<OutputLine> {
    let line = line.trim_end();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        let fields: Vec<&str> = rest.trim_start().splitn(7, '|').collect();
        if fields.len() < 6 {
            return None;
        }
        let filename = fields.get(6).map(|s| s.to_string()).unwrap_or_default();
        return match fields[0] {
            "downloading" => Some(OutputLine::Event(FetchEvent::Downloading {
                downloaded_bytes: parse_bytes(fields[1]).unwrap_or(0),
                total_bytes: parse_bytes(fields[2]),
                total_bytes_estimate: parse_bytes(fields[3]),
                speed: parse_number::<f64>(fields[4]),
                eta: parse_bytes(fields[5]),
            })),
            "finished" => Some(OutputLine::Event(FetchEvent::Finished { filename })),
            _ => None,
        };
    }

    if let Some(title) = line.strip_prefix(TITLE_PREFIX) {
        return Some(OutputLine::Title(title.trim().to_string()));
    }

    if let Some(path) = line.strip_prefix(FILE_PREFIX) {
        return Some(OutputLine::FilePath(path.trim().to_string()));
    }

    line.strip_prefix("[download] Destination:")
        .map(|path| OutputLine::Destination(path.trim().to_string()))
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Bundled next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(bundled) = find_bundled_ytdlp() {
        info!("Using bundled yt-dlp: {:?}", bundled);
        return Some(bundled);
    }

    if let Ok(system) = which::which("yt-dlp") {
        info!("Using system yt-dlp: {:?}", system);
        return Some(system);
    }

    if let Some(common) = find_in_common_paths() {
        info!("Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("yt-dlp not found anywhere!");
    None
}

fn find_bundled_ytdlp() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    let name = if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" };
    let candidate = exe_dir.join(name);
    if candidate.is_file() && is_executable(&candidate) {
        return Some(candidate);
    }
    None
}

fn find_in_common_paths() -> Option<PathBuf> {
    let mut candidates = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
        // macOS Homebrew (Intel)
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
    ];
    if let Some(home) = dirs::home_dir() {
        // pip --user
        candidates.push(home.join(".local").join("bin").join("yt-dlp"));
    }

    candidates
        .into_iter()
        .find(|path| path.is_file() && is_executable(path))
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================
