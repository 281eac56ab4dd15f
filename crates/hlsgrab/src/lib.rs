//! # hlsgrab
//!
//! A library for downloading complete HLS (VOD) playlists into a single
//! ordered media stream.
//!
//! ## Features
//!
//! - Master playlist resolution with bandwidth-based rendition selection
//! - Bounded-concurrency segment downloads with retry and exponential backoff
//! - Index-ordered reassembly independent of completion order
//! - Cooperative cancellation through a shared token
//! - Sequential "series" downloads of several playlists

pub mod builder;
pub mod config;
pub mod downloader;
pub mod error;
pub mod hls;
pub mod outcome;
pub mod output;
pub mod proxy;

pub use builder::{DownloaderConfigBuilder, HlsConfigBuilder};
pub use config::DownloaderConfig;
pub use error::DownloadError;
pub use outcome::Outcome;

// Re-export downloader utilities
pub use downloader::create_client;

// Re-export the pipeline entry points
pub use hls::{
    AssembledStream, HlsConfig, HlsDownloader, MediaType, OnSegmentProgress, OnSeriesProgress,
    SegmentProgress, SeriesItem, SeriesProgress,
};

// Re-export sinks
pub use output::{FileSink, OutputSink};

// Re-export proxy utilities
pub use proxy::{ProxyAuth, ProxyConfig, ProxyType, RelaySetting, UrlRewrite};

// The cancellation primitive observed by every component
pub use tokio_util::sync::CancellationToken;
