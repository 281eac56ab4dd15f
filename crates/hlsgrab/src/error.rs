use crate::hls::HlsDownloaderError;

/// Caller-facing error taxonomy.
///
/// Failures are reported at playlist or download granularity; individual
/// segment errors are retried internally and never surface on their own.
/// Cancellation is not represented here, see [`crate::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid proxy configuration: {0}")]
    ProxyError(String),

    #[error("Playlist parse failed: {0}")]
    PlaylistFormat(String),

    #[error("Empty playlist: no segments found in {0}")]
    EmptyPlaylist(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Segment {index} ({uri}) still failing after {attempts} attempts")]
    SegmentRetriesExhausted {
        index: usize,
        uri: String,
        attempts: u32,
    },

    #[error("Playlist nesting exceeds the limit of {0} levels")]
    TooManyRedirections(usize),

    #[error("Output sink error: {0}")]
    SinkError(String),
}

impl From<HlsDownloaderError> for DownloadError {
    fn from(err: HlsDownloaderError) -> Self {
        match err {
            HlsDownloaderError::PlaylistError(msg) => DownloadError::PlaylistFormat(msg),
            HlsDownloaderError::RetriesExhausted {
                index,
                uri,
                attempts,
            } => DownloadError::SegmentRetriesExhausted {
                index,
                uri,
                attempts,
            },
            HlsDownloaderError::TooManyRedirections { max_depth } => {
                DownloadError::TooManyRedirections(max_depth)
            }
            HlsDownloaderError::IoError { source } => {
                DownloadError::IoError(std::io::Error::new(source.kind(), source.to_string()))
            }
            err @ (HlsDownloaderError::PartialDownload { .. }
            | HlsDownloaderError::SegmentFetchError(_)
            | HlsDownloaderError::NetworkError { .. }
            | HlsDownloaderError::Cancelled) => DownloadError::DownloadFailed(err.to_string()),
        }
    }
}
