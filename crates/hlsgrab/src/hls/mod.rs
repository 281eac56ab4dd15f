// HLS VOD pipeline: playlist resolution, segment scheduling and reassembly

pub mod assembler;
pub mod config;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod hls_downloader;
pub mod playlist;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for easier access
pub use assembler::{AssembledStream, MediaType, StreamAssembler};
pub use config::{
    HlsConfig, HlsFetcherConfig, HlsPlaylistConfig, HlsSchedulerConfig, HlsVariantSelectionPolicy,
};
pub use error::HlsDownloaderError;
pub use events::{OnSegmentProgress, OnSeriesProgress, SegmentProgress, SeriesProgress};
pub use fetcher::{SegmentDownloader, SegmentFetcher, SegmentTask};
pub use hls_downloader::{HlsDownloader, SeriesItem, series_item_name};
pub use playlist::{HttpPlaylistLoader, PlaylistLoader, PlaylistResolver};
pub use scheduler::SegmentScheduler;
