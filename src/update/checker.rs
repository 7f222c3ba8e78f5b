//! Release check against the GitHub releases API

use crate::utils::error::ConversoError;
use crate::version::{APP_NAME, VERSION};
use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const NOTES_PREVIEW_CHARS: usize = 500;

/// Latest release as returned by the API (only the fields we read)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GithubRelease {
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub html_url: String,
    pub published_at: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// A release newer than the running build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseInfo {
    /// Version with any leading `v` removed
    pub version: String,
    pub tag_name: String,
    pub release_name: String,
    pub release_notes: String,
    /// Release page
    pub download_url: String,
    pub published_at: String,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UpdateStatus {
    NoUpdate,
    Available(ReleaseInfo),
}

/// Target platform for asset selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    Windows,
    Linux,
    Macos,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else {
            Platform::Linux
        }
    }

    fn asset_markers(&self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &["windows", "win", ".exe", ".zip"],
            Platform::Linux => &["linux", "ubuntu"],
            Platform::Macos => &["macos", "mac", "darwin"],
        }
    }
}

/// Parse a version leniently: leading `v` stripped, missing minor/patch
/// components padded with zero
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches(['v', 'V']);
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    let (core, suffix) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&format!("{}{}", parts.join("."), suffix)).ok()
}

/// Compare a fetched release against the running version
pub fn evaluate_release(current_version: &str, release: GithubRelease) -> UpdateStatus {
    let latest = release.tag_name.trim().trim_start_matches(['v', 'V']).to_string();
    if latest.is_empty() {
        warn!("Could not determine latest version from GitHub");
        return UpdateStatus::NoUpdate;
    }

    let (Some(latest_version), Some(running)) = (parse_version(&latest), parse_version(current_version))
    else {
        warn!(
            "Unparsable version (latest '{}', current '{}')",
            latest, current_version
        );
        return UpdateStatus::NoUpdate;
    };

    if latest_version <= running {
        debug!("Up to date: {} >= {}", running, latest_version);
        return UpdateStatus::NoUpdate;
    }

    UpdateStatus::Available(ReleaseInfo {
        version: latest,
        tag_name: release.tag_name,
        release_name: release.name.unwrap_or_default(),
        release_notes: release.body.unwrap_or_default(),
        download_url: release.html_url,
        published_at: release.published_at.unwrap_or_default(),
        assets: release.assets,
    })
}

/// Checks a GitHub repository for newer releases
#[derive(Debug, Clone)]
pub struct UpdateChecker {
    current_version: String,
    owner: String,
    repo: String,
    api_url: String,
}

impl UpdateChecker {
    /// `repo_url` is the repository page, e.g. `https://github.com/owner/repo`
    pub fn new(current_version: &str, repo_url: &str) -> Result<Self, ConversoError> {
        let mut segments = repo_url.trim_end_matches('/').rsplit('/');
        let repo = segments.next().unwrap_or_default().to_string();
        let owner = segments.next().unwrap_or_default().to_string();
        if owner.is_empty() || repo.is_empty() || owner.contains(':') {
            return Err(ConversoError::Configuration(format!(
                "Invalid repository URL: {}",
                repo_url
            )));
        }

        let api_url = format!(
            "https://api.github.com/repos/{}/{}/releases/latest",
            owner, repo
        );
        Ok(Self {
            current_version: current_version.to_string(),
            owner,
            repo,
            api_url,
        })
    }

    /// Query a different releases endpoint, e.g. a GitHub Enterprise host
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Check for a newer release. Any failure is logged and reported as
    /// `NoUpdate`.
    pub async fn check_for_updates(&self, timeout: Duration) -> UpdateStatus {
        match self.fetch_latest(timeout).await {
            Ok(release) => evaluate_release(&self.current_version, release),
            Err(e) => {
                warn!("Failed to check for updates: {:#}", e);
                UpdateStatus::NoUpdate
            }
        }
    }

    async fn fetch_latest(&self, timeout: Duration) -> Result<GithubRelease> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", APP_NAME.replace(' ', "-"), VERSION))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        debug!("Fetching {}", self.api_url);
        let release = client
            .get(&self.api_url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(ConversoError::from)?
            .error_for_status()
            .map_err(ConversoError::from)?
            .json::<GithubRelease>()
            .await
            .context("Invalid release response")?;
        Ok(release)
    }

    /// First asset whose name matches the platform, else the release page
    pub fn download_url(&self, release: &ReleaseInfo, platform: Platform) -> String {
        release
            .assets
            .iter()
            .find(|asset| {
                let name = asset.name.to_lowercase();
                platform.asset_markers().iter().any(|m| name.contains(m))
            })
            .map(|asset| asset.browser_download_url.clone())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| release.download_url.clone())
    }

    /// Markdown notification text for a new release
    pub fn format_update_message(&self, release: &ReleaseInfo) -> String {
        let mut message = format!("🎉 **New Version Available: v{}**\n\n", release.version);

        if !release.release_name.is_empty() {
            message.push_str(&format!("**{}**\n\n", release.release_name));
        }

        message.push_str(&format!("Current version: v{}\n", self.current_version));
        message.push_str(&format!("Latest version: v{}\n\n", release.version));

        if !release.release_notes.is_empty() {
            let mut notes: String = release
                .release_notes
                .chars()
                .take(NOTES_PREVIEW_CHARS)
                .collect();
            if release.release_notes.chars().count() > NOTES_PREVIEW_CHARS {
                notes.push_str("...");
            }
            message.push_str(&format!("**What's New:**\n{}\n\n", notes));
        }

        if !release.download_url.is_empty() {
            message.push_str(&format!(
                "[Download Latest Version]({})",
                release.download_url
            ));
        }

        message
    }
}
