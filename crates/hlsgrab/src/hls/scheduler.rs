// HLS Segment Scheduler: Downloads every segment of a playlist under a concurrency cap.

use crate::Outcome;
use crate::hls::HlsDownloaderError;
use crate::hls::config::HlsConfig;
use crate::hls::events::{OnSegmentProgress, SegmentProgress};
use crate::hls::fetcher::{SegmentDownloader, SegmentTask};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct PendingSegment {
    task: SegmentTask,
    failures: u32,
}

/// Bounded-concurrency segment downloader.
///
/// The work queue is owned by the dispatch loop in [`SegmentScheduler::run`]:
/// claiming a task and requeueing a failed one are plain queue operations, so
/// a task can never be in flight twice. Results land in a slot table keyed by
/// the task index, which restores playlist order no matter which fetch
/// finishes first.
pub struct SegmentScheduler {
    config: Arc<HlsConfig>,
    segment_fetcher: Arc<dyn SegmentDownloader>,
}

impl SegmentScheduler {
    pub fn new(config: Arc<HlsConfig>, segment_fetcher: Arc<dyn SegmentDownloader>) -> Self {
        Self {
            config,
            segment_fetcher,
        }
    }

    async fn perform_fetch(
        segment_fetcher: Arc<dyn SegmentDownloader>,
        pending: PendingSegment,
        backoff: Duration,
        cancel: CancellationToken,
    ) -> (PendingSegment, Result<Bytes, HlsDownloaderError>) {
        if !backoff.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return (pending, Err(HlsDownloaderError::Cancelled)),
                _ = tokio::time::sleep(backoff) => {}
            }
        }
        if cancel.is_cancelled() {
            return (pending, Err(HlsDownloaderError::Cancelled));
        }

        let result = segment_fetcher.fetch_segment(&pending.task, &cancel).await;
        (pending, result)
    }

    /// Downloads every task and returns the buffers ordered by task index.
    ///
    /// Tasks must be indexed `0..tasks.len()`. At most
    /// `min(concurrency, tasks.len())` fetches run at once. A failed task goes
    /// back to the front of the queue after an exponential backoff, until the
    /// configured retry budget is spent ([`HlsDownloaderError::RetriesExhausted`]).
    /// `on_progress` is invoked once per completed segment.
    ///
    /// Once `cancel` is set no new fetch starts, unfinished fetches are
    /// dropped and the run returns [`Outcome::Aborted`].
    pub async fn run(
        &self,
        tasks: Vec<SegmentTask>,
        concurrency: usize,
        cancel: &CancellationToken,
        on_progress: Option<OnSegmentProgress>,
    ) -> Result<Outcome<Vec<Bytes>>, HlsDownloaderError> {
        if cancel.is_cancelled() {
            return Ok(Outcome::Aborted);
        }
        let total = tasks.len();
        if total == 0 {
            return Ok(Outcome::Completed(Vec::new()));
        }

        let workers = concurrency.clamp(1, total);
        let fetcher_config = &self.config.fetcher_config;
        let mut queue: VecDeque<PendingSegment> = tasks
            .into_iter()
            .map(|task| PendingSegment { task, failures: 0 })
            .collect();
        let mut slots: Vec<Option<Bytes>> = vec![None; total];
        let mut completed = 0usize;
        let mut in_flight = FuturesUnordered::new();

        info!(segments = total, workers, "SegmentScheduler started.");

        loop {
            while in_flight.len() < workers && !cancel.is_cancelled() {
                let Some(pending) = queue.pop_front() else {
                    break;
                };
                let backoff = fetcher_config.retry_delay(pending.failures);
                in_flight.push(Self::perform_fetch(
                    Arc::clone(&self.segment_fetcher),
                    pending,
                    backoff,
                    cancel.clone(),
                ));
            }

            // Queue drained and nothing in flight
            if in_flight.is_empty() {
                break;
            }

            let (mut pending, result) = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(finished) = in_flight.next() => finished,
            };

            match result {
                Ok(data) => {
                    let index = pending.task.index;
                    match slots.get_mut(index) {
                        Some(slot) if slot.is_none() => {
                            *slot = Some(data);
                            completed += 1;
                            debug!(index, completed, total, "Segment downloaded");
                            if let Some(on_progress) = &on_progress {
                                on_progress(SegmentProgress::new(completed, total));
                            }
                        }
                        _ => warn!(
                            index,
                            total,
                            "Discarding segment with out-of-range or duplicate index"
                        ),
                    }
                }
                Err(e) if cancel.is_cancelled() => {
                    debug!(
                        index = pending.task.index,
                        error = %e,
                        "Segment fetch interrupted by cancellation"
                    );
                }
                Err(e) => {
                    pending.failures += 1;
                    if fetcher_config.retries_exhausted(pending.failures) {
                        warn!(
                            index = pending.task.index,
                            uri = %pending.task.uri,
                            attempts = pending.failures,
                            error = %e,
                            "Segment retries exhausted"
                        );
                        return Err(HlsDownloaderError::RetriesExhausted {
                            index: pending.task.index,
                            uri: pending.task.uri.to_string(),
                            attempts: pending.failures,
                        });
                    }
                    warn!(
                        index = pending.task.index,
                        uri = %pending.task.uri,
                        failures = pending.failures,
                        error = %e,
                        "Segment fetch failed, requeueing"
                    );
                    queue.push_front(pending);
                }
            }
        }

        // Dropping the remaining futures abandons their requests.
        drop(in_flight);

        if cancel.is_cancelled() {
            info!(completed, total, "SegmentScheduler cancelled.");
            return Ok(Outcome::Aborted);
        }

        let missing = slots.iter().filter(|slot| slot.is_none()).count();
        if missing > 0 {
            return Err(HlsDownloaderError::PartialDownload { missing, total });
        }

        info!(total, "SegmentScheduler finished.");
        Ok(Outcome::Completed(slots.into_iter().flatten().collect()))
    }
}
