use hlsgrab_engine::{CancellationToken, HlsDownloader, Outcome, SeriesItem};
use std::time::Instant;
use tracing::info;

use crate::error::AppError;
use crate::utils::progress::ProgressManager;

/// Download one playlist into `output_name`.
pub async fn process_playlist(
    downloader: &HlsDownloader,
    url_str: &str,
    output_name: &str,
    progress_manager: &ProgressManager,
    cancel: &CancellationToken,
) -> Result<Outcome<()>, AppError> {
    let start_time = Instant::now();
    info!(url = %url_str, name = %output_name, "Downloading playlist");

    let outcome = downloader
        .download_one(
            url_str,
            output_name,
            None,
            cancel,
            progress_manager.segment_callback(output_name),
        )
        .await?;

    if outcome.is_completed() {
        info!(
            url = %url_str,
            name = %output_name,
            duration = ?start_time.elapsed(),
            "Playlist saved"
        );
    }
    Ok(outcome)
}

/// Download `items` as one series named after `base_name`.
pub async fn process_series(
    downloader: &HlsDownloader,
    items: &[SeriesItem],
    base_name: &str,
    progress_manager: &ProgressManager,
    cancel: &CancellationToken,
) -> Result<Outcome<()>, AppError> {
    let start_time = Instant::now();

    let outcome = downloader
        .download_series(
            items,
            base_name,
            None,
            cancel,
            progress_manager.series_callback(base_name),
        )
        .await?;

    if outcome.is_completed() {
        info!(
            series = %base_name,
            items = items.len(),
            duration = ?start_time.elapsed(),
            "Series saved"
        );
    }
    Ok(outcome)
}
