use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::hls::assembler::StreamAssembler;
use crate::hls::events::{OnSegmentProgress, OnSeriesProgress, SeriesProgress};
use crate::hls::fetcher::{SegmentDownloader, SegmentFetcher, SegmentTask};
use crate::hls::playlist::{HttpPlaylistLoader, PlaylistLoader, PlaylistResolver};
use crate::hls::scheduler::SegmentScheduler;
use crate::{DownloadError, Outcome, OutputSink, create_client, hls::HlsDownloaderError};

use super::HlsConfig;

/// One entry of a series download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesItem {
    pub locator: String,
    pub title: Option<String>,
}

impl SeriesItem {
    pub fn new(locator: impl Into<String>, title: Option<String>) -> Self {
        Self {
            locator: locator.into(),
            title,
        }
    }
}

/// Output name for the `position`-th (1-based) item of a series.
pub fn series_item_name(base_name: &str, title: Option<&str>, position: usize) -> String {
    match title.map(str::trim).filter(|title| !title.is_empty()) {
        Some(title) => format!("{base_name} - {title}"),
        None => format!("{base_name} - Episode {position}"),
    }
}

/// Drives the whole pipeline: resolve, download, assemble, write.
pub struct HlsDownloader {
    resolver: PlaylistResolver,
    scheduler: SegmentScheduler,
    assembler: StreamAssembler,
    sink: Arc<dyn OutputSink>,
    default_concurrency: usize,
}

impl HlsDownloader {
    /// Creates a downloader that talks HTTP using `config.base`.
    pub fn new(config: HlsConfig, sink: Arc<dyn OutputSink>) -> Result<Self, DownloadError> {
        let client = create_client(&config.base)?;
        let config = Arc::new(config);
        let loader: Arc<dyn PlaylistLoader> =
            Arc::new(HttpPlaylistLoader::new(client.clone(), Arc::clone(&config)));
        let fetcher: Arc<dyn SegmentDownloader> =
            Arc::new(SegmentFetcher::new(client, Arc::clone(&config)));
        Ok(Self::with_components(config, loader, fetcher, sink))
    }

    /// Creates a downloader from explicit collaborators.
    pub fn with_components(
        config: Arc<HlsConfig>,
        loader: Arc<dyn PlaylistLoader>,
        fetcher: Arc<dyn SegmentDownloader>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            default_concurrency: config.scheduler_config.download_concurrency.max(1),
            resolver: PlaylistResolver::new(loader, Arc::clone(&config)),
            scheduler: SegmentScheduler::new(config, fetcher),
            assembler: StreamAssembler::default(),
            sink,
        }
    }

    /// Downloads one playlist and writes it to the sink as `output_name`.
    ///
    /// `concurrency` overrides the configured
    /// [`download_concurrency`](crate::hls::HlsSchedulerConfig::download_concurrency).
    ///
    /// Cancellation at any point returns [`Outcome::Aborted`]; nothing is
    /// written in that case.
    pub async fn download_one(
        &self,
        locator: &str,
        output_name: &str,
        concurrency: Option<usize>,
        cancel: &CancellationToken,
        on_progress: Option<OnSegmentProgress>,
    ) -> Result<Outcome<()>, DownloadError> {
        if cancel.is_cancelled() {
            return Ok(Outcome::Aborted);
        }
        let start_time = Instant::now();

        let segments = match self.resolver.resolve(locator, cancel).await {
            Ok(segments) => segments,
            Err(HlsDownloaderError::Cancelled) => return Ok(Outcome::Aborted),
            Err(e) => return Err(e.into()),
        };
        if segments.is_empty() {
            return Err(DownloadError::EmptyPlaylist(locator.to_string()));
        }

        let tasks = segments
            .into_iter()
            .enumerate()
            .map(|(index, uri)| SegmentTask::new(index, uri))
            .collect::<Vec<_>>();
        let segment_count = tasks.len();
        let concurrency = concurrency.unwrap_or(self.default_concurrency);

        let buffers = match self
            .scheduler
            .run(tasks, concurrency, cancel, on_progress)
            .await?
        {
            Outcome::Completed(buffers) => buffers,
            Outcome::Aborted => {
                info!(url = %locator, "Download cancelled");
                return Ok(Outcome::Aborted);
            }
        };

        let stream = self.assembler.assemble(buffers);
        if cancel.is_cancelled() {
            return Ok(Outcome::Aborted);
        }
        let size = stream.len();
        self.sink.write(stream, output_name).await?;

        info!(
            url = %locator,
            segments = segment_count,
            bytes = size,
            duration = ?start_time.elapsed(),
            "HLS download complete"
        );
        Ok(Outcome::Completed(()))
    }

    /// Downloads `items` one after another.
    ///
    /// Each item is written as `"{base_name} - {title}"`, or
    /// `"{base_name} - Episode {n}"` when it has no title. The first failing
    /// item stops the series with [`DownloadError::DownloadFailed`]; items
    /// written before it are kept.
    pub async fn download_series(
        &self,
        items: &[SeriesItem],
        base_name: &str,
        concurrency: Option<usize>,
        cancel: &CancellationToken,
        on_progress: Option<OnSeriesProgress>,
    ) -> Result<Outcome<()>, DownloadError> {
        let total_items = items.len();
        info!(items = total_items, base_name, "Starting series download");

        for (position, item) in (1..).zip(items) {
            if cancel.is_cancelled() {
                info!(completed_items = position - 1, total_items, "Series download cancelled");
                return Ok(Outcome::Aborted);
            }

            let output_name = series_item_name(base_name, item.title.as_deref(), position);
            let item_progress = on_progress.clone().map(|on_progress| {
                on_progress(SeriesProgress {
                    item_index: position,
                    total_items,
                    item_percentage: 0,
                });
                Arc::new(move |progress: crate::SegmentProgress| {
                    on_progress(SeriesProgress {
                        item_index: position,
                        total_items,
                        item_percentage: progress.percentage,
                    })
                }) as OnSegmentProgress
            });

            match self
                .download_one(&item.locator, &output_name, concurrency, cancel, item_progress)
                .await
            {
                Ok(Outcome::Completed(())) => {}
                Ok(Outcome::Aborted) => return Ok(Outcome::Aborted),
                Err(e) => {
                    warn!(item = position, total_items, name = %output_name, error = %e, "Series item failed");
                    return Err(DownloadError::DownloadFailed(format!(
                        "item {position}/{total_items} ({output_name}): {e}"
                    )));
                }
            }
        }

        Ok(Outcome::Completed(()))
    }
}
