use std::time::Duration;

use crate::DownloaderConfig;
use crate::proxy::UrlRewrite;

// --- Top-Level Configuration ---
#[derive(Debug, Clone, Default)]
pub struct HlsConfig {
    /// Base downloader configuration
    pub base: DownloaderConfig,
    pub playlist_config: HlsPlaylistConfig,
    pub scheduler_config: HlsSchedulerConfig,
    pub fetcher_config: HlsFetcherConfig,
    /// Relay proxy applied to every playlist and segment request
    pub relay: Option<UrlRewrite>,
}

impl HlsConfig {
    pub fn builder() -> crate::builder::HlsConfigBuilder {
        crate::builder::HlsConfigBuilder::new()
    }

    /// The URL actually requested on the wire for `url`.
    pub(crate) fn request_url(&self, url: &str) -> String {
        match &self.relay {
            Some(rewrite) => rewrite.apply(url),
            None => url.to_owned(),
        }
    }
}

// --- Playlist Configuration ---
#[derive(Debug, Clone)]
pub struct HlsPlaylistConfig {
    pub playlist_fetch_timeout: Duration,
    /// Maximum number of master playlists followed before giving up
    pub max_nesting_depth: usize,
    pub variant_selection_policy: HlsVariantSelectionPolicy,
}

impl Default for HlsPlaylistConfig {
    fn default() -> Self {
        Self {
            playlist_fetch_timeout: Duration::from_secs(15),
            max_nesting_depth: 10,
            variant_selection_policy: Default::default(),
        }
    }
}

/// Rendition selection for master playlists.
///
/// Only the advertised `BANDWIDTH` is considered. When several renditions
/// are equally good the first one listed wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HlsVariantSelectionPolicy {
    #[default]
    HighestBitrate,
    LowestBitrate,
    ClosestToBitrate(u64),
}

// --- Scheduler Configuration ---
#[derive(Debug, Clone)]
pub struct HlsSchedulerConfig {
    pub download_concurrency: usize, // Max concurrent segment downloads
}

impl Default for HlsSchedulerConfig {
    fn default() -> Self {
        Self {
            download_concurrency: 3,
        }
    }
}

// --- Fetcher Configuration ---
#[derive(Debug, Clone)]
pub struct HlsFetcherConfig {
    /// Per-request timeout for segments. `None` leaves only the client-wide timeouts.
    pub segment_download_timeout: Option<Duration>,
    /// Retries allowed per segment after its first failure. `None` retries forever.
    pub max_segment_retries: Option<u32>,
    pub segment_retry_delay_base: Duration, // Base for exponential backoff
    pub segment_retry_delay_max: Duration,
}

impl Default for HlsFetcherConfig {
    fn default() -> Self {
        Self {
            segment_download_timeout: None,
            max_segment_retries: Some(3),
            segment_retry_delay_base: Duration::from_millis(500),
            segment_retry_delay_max: Duration::from_secs(10),
        }
    }
}

impl HlsFetcherConfig {
    /// Delay before the next attempt of a segment that has failed `failures` times.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(failures - 1);
        self.segment_retry_delay_base
            .saturating_mul(factor)
            .min(self.segment_retry_delay_max)
    }

    pub fn retries_exhausted(&self, failures: u32) -> bool {
        self.max_segment_retries
            .is_some_and(|max_retries| failures > max_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_is_exponential_and_capped() {
        let config = HlsFetcherConfig {
            segment_retry_delay_base: Duration::from_millis(100),
            segment_retry_delay_max: Duration::from_millis(500),
            ..Default::default()
        };
        assert_eq!(config.retry_delay(0), Duration::ZERO);
        assert_eq!(config.retry_delay(1), Duration::from_millis(100));
        assert_eq!(config.retry_delay(2), Duration::from_millis(200));
        assert_eq!(config.retry_delay(3), Duration::from_millis(400));
        assert_eq!(config.retry_delay(4), Duration::from_millis(500));
        assert_eq!(config.retry_delay(64), Duration::from_millis(500));
    }

    #[test]
    fn test_retries_exhausted() {
        let bounded = HlsFetcherConfig {
            max_segment_retries: Some(2),
            ..Default::default()
        };
        assert!(!bounded.retries_exhausted(2));
        assert!(bounded.retries_exhausted(3));

        let unlimited = HlsFetcherConfig {
            max_segment_retries: None,
            ..Default::default()
        };
        assert!(!unlimited.retries_exhausted(u32::MAX));
    }

    #[test]
    fn test_request_url_uses_relay() {
        let mut config = HlsConfig::default();
        assert_eq!(config.request_url("http://h/a.ts"), "http://h/a.ts");

        config.relay = Some(UrlRewrite::new("https://relay/?u="));
        assert_eq!(
            config.request_url("http://h/a.ts"),
            "https://relay/?u=http%3A%2F%2Fh%2Fa.ts"
        );
    }
}
