pub mod cache;
pub mod info;
pub mod models;
pub mod playlist;
pub mod request;
pub mod traits;
pub mod ytdlp;

pub use info::{MetadataExtractor, VideoDetails};
pub use models::{Format, RawVideoInfo, Thumbnail};
pub use playlist::{extract_playlist_urls, PlaylistInfo};
pub use request::{FetchEvent, FetchOutcome, FetchRequest, PostProcessor, SubtitleRequest, TransferSettings};
pub use traits::{MediaFetcher, ProgressHook};
pub use ytdlp::YtDlpFetcher;
