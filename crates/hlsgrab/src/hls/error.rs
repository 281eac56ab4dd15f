use std::sync::Arc;

#[derive(Debug, thiserror::Error, Clone)]
pub enum HlsDownloaderError {
    /// Malformed playlist, or one that could not be loaded. Never retried.
    #[error("Playlist error: {0}")]
    PlaylistError(String),
    /// A single segment request failed. Retried by the scheduler.
    #[error("Segment fetch error: {0}")]
    SegmentFetchError(String),
    #[error("Network error: {source}")]
    NetworkError {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("Segment {index} ({uri}) failed {attempts} times")]
    RetriesExhausted {
        index: usize,
        uri: String,
        attempts: u32,
    },
    #[error("{missing} of {total} segments were not downloaded")]
    PartialDownload { missing: usize, total: usize },
    #[error("Master playlists nested deeper than {max_depth} levels")]
    TooManyRedirections { max_depth: usize },
    #[error("Operation cancelled")]
    Cancelled,
}

// Manual implementation of From<reqwest::Error> for HlsDownloaderError
// because of the Arc wrapping.
impl From<reqwest::Error> for HlsDownloaderError {
    fn from(err: reqwest::Error) -> Self {
        HlsDownloaderError::NetworkError {
            source: Arc::new(err),
        }
    }
}

impl From<std::io::Error> for HlsDownloaderError {
    fn from(err: std::io::Error) -> Self {
        HlsDownloaderError::IoError {
            source: Arc::new(err),
        }
    }
}
