//! Update checks

pub mod checker;

pub use checker::{
    evaluate_release, parse_version, GithubRelease, Platform, ReleaseAsset, ReleaseInfo,
    UpdateChecker, UpdateStatus, DEFAULT_TIMEOUT,
};
