//! Format classification, ranking and selection

pub mod classifier;
pub mod label;
pub mod selector;

pub use classifier::{categorize, sort_by_quality, sorted_by_quality, CategorizedFormats, MediaKind};
pub use label::{format_label, FormatFilter};
pub use selector::{best_format_id, QualityTier};
