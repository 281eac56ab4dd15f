// HLS Segment Fetcher: Downloads the raw bytes of individual media segments.

use crate::hls::HlsDownloaderError;
use crate::hls::config::HlsConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

/// A unit of work for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTask {
    /// Position in the playlist. This is the only ordering key for reassembly.
    pub index: usize,
    pub uri: Url,
}

impl SegmentTask {
    pub fn new(index: usize, uri: Url) -> Self {
        Self { index, uri }
    }
}

/// Fetches one segment.
///
/// Implementations do not retry and do not decide whether a failure is
/// fatal: every failure is reported and the scheduler requeues the task.
/// An already cancelled token must fail without touching the network.
#[async_trait]
pub trait SegmentDownloader: Send + Sync {
    async fn fetch_segment(
        &self,
        task: &SegmentTask,
        cancel: &CancellationToken,
    ) -> Result<Bytes, HlsDownloaderError>;
}

pub struct SegmentFetcher {
    http_client: Client,
    config: Arc<HlsConfig>,
}

impl SegmentFetcher {
    pub fn new(http_client: Client, config: Arc<HlsConfig>) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn fetch_once(&self, segment_url: &Url) -> Result<Bytes, HlsDownloaderError> {
        let mut request_builder = self
            .http_client
            .get(self.config.request_url(segment_url.as_str()));
        if let Some(timeout) = self.config.fetcher_config.segment_download_timeout {
            request_builder = request_builder.timeout(timeout);
        }

        let response = request_builder.send().await?;
        if !response.status().is_success() {
            return Err(HlsDownloaderError::SegmentFetchError(format!(
                "HTTP {} for segment {segment_url}",
                response.status()
            )));
        }

        let downloaded_bytes = response.bytes().await?;
        debug!(
            "Downloaded {} bytes from segment URL: {}",
            downloaded_bytes.len(),
            segment_url
        );
        Ok(downloaded_bytes)
    }
}

#[async_trait]
impl SegmentDownloader for SegmentFetcher {
    async fn fetch_segment(
        &self,
        task: &SegmentTask,
        cancel: &CancellationToken,
    ) -> Result<Bytes, HlsDownloaderError> {
        if cancel.is_cancelled() {
            return Err(HlsDownloaderError::Cancelled);
        }
        trace!(index = task.index, uri = %task.uri, "Fetching segment");

        // Dropping the request future aborts the underlying connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HlsDownloaderError::Cancelled),
            result = self.fetch_once(&task.uri) => result,
        }
    }
}
