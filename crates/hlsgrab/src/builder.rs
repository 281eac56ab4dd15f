//! # Configuration builders
//!
//! Fluent builders for [`DownloaderConfig`] and [`HlsConfig`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use hlsgrab_engine::{DownloaderConfig, HlsConfig, UrlRewrite};
//!
//! let base = DownloaderConfig::builder()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("MyApp/1.0")
//!     .with_header("Referer", "https://example.com/")
//!     .build();
//!
//! let config = HlsConfig::builder()
//!     .with_base_config(base)
//!     .download_concurrency(8)
//!     .max_segment_retries(Some(5))
//!     .relay(Some(UrlRewrite::new("http://relay.local/fetch?url=")))
//!     .build();
//! assert_eq!(config.scheduler_config.download_concurrency, 8);
//! ```

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::DownloaderConfig;
use crate::hls::HlsConfig;
use crate::hls::config::HlsVariantSelectionPolicy;
use crate::proxy::{ProxyConfig, UrlRewrite};

/// Builder for creating DownloaderConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DownloaderConfig::default(),
        }
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the read timeout (maximum time between receiving data chunks)
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.headers = headers;
        self
    }

    /// Set the proxy configuration
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self.config.use_system_proxy = false; // Explicit proxy overrides system proxy
        self
    }

    /// Set whether to use system proxy settings if available
    pub fn with_system_proxy(mut self, use_system_proxy: bool) -> Self {
        // Only set system proxy if no explicit proxy is configured
        if self.config.proxy.is_none() {
            self.config.use_system_proxy = use_system_proxy;
        }
        self
    }

    /// Set whether to accept invalid certificates
    ///
    /// # Warning
    /// This is unsafe and should only be used for testing or in controlled environments.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.danger_accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> DownloaderConfig {
        self.config
    }
}

impl Default for DownloaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`HlsConfig`]
#[derive(Debug, Clone)]
pub struct HlsConfigBuilder {
    config: HlsConfig,
}

impl HlsConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HlsConfig::default(),
        }
    }

    pub fn with_base_config(mut self, base_config: DownloaderConfig) -> Self {
        self.config.base = base_config;
        self
    }

    // --- Base DownloaderConfig methods ---

    /// Set user agent for HTTP requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.base.user_agent = user_agent.into();
        self
    }

    /// Set overall HTTP timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.base.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.base.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.base.read_timeout = timeout;
        self
    }

    /// Set HTTP headers
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.config.base.headers = headers;
        self
    }

    /// Add a single HTTP header
    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            self.config.base.headers.insert(name, value);
        }
        self
    }

    /// Set proxy configuration
    pub fn proxy(mut self, proxy_config: ProxyConfig) -> Self {
        self.config.base.proxy = Some(proxy_config);
        self.config.base.use_system_proxy = false;
        self
    }

    pub fn use_system_proxy(mut self, use_system_proxy: bool) -> Self {
        self.config.base.use_system_proxy = use_system_proxy;
        self
    }

    // --- HLS PlaylistConfig methods ---

    pub fn playlist_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.playlist_config.playlist_fetch_timeout = timeout;
        self
    }

    /// Set how many master playlists may be followed before resolution fails.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.config.playlist_config.max_nesting_depth = depth;
        self
    }

    /// Set the variant selection policy.
    pub fn variant_selection_policy(mut self, policy: HlsVariantSelectionPolicy) -> Self {
        self.config.playlist_config.variant_selection_policy = policy;
        self
    }

    /// Select the variant with the highest bitrate.
    pub fn select_highest_bitrate_variant(self) -> Self {
        self.variant_selection_policy(HlsVariantSelectionPolicy::HighestBitrate)
    }

    /// Select the variant with the lowest bitrate.
    pub fn select_lowest_bitrate_variant(self) -> Self {
        self.variant_selection_policy(HlsVariantSelectionPolicy::LowestBitrate)
    }

    /// Select the variant closest to the specified bitrate.
    pub fn select_closest_to_bitrate_variant(self, bitrate: u64) -> Self {
        self.variant_selection_policy(HlsVariantSelectionPolicy::ClosestToBitrate(bitrate))
    }

    // --- HLS SchedulerConfig methods ---

    /// Set the maximum number of concurrent segment downloads.
    pub fn download_concurrency(mut self, concurrency: usize) -> Self {
        self.config.scheduler_config.download_concurrency = concurrency.max(1);
        self
    }

    // --- HLS FetcherConfig methods ---

    pub fn segment_download_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.fetcher_config.segment_download_timeout = timeout;
        self
    }

    /// Set the retry budget per segment. `None` retries until cancelled.
    pub fn max_segment_retries(mut self, retries: Option<u32>) -> Self {
        self.config.fetcher_config.max_segment_retries = retries;
        self
    }

    pub fn segment_retry_delay_base(mut self, delay: Duration) -> Self {
        self.config.fetcher_config.segment_retry_delay_base = delay;
        self
    }

    pub fn segment_retry_delay_max(mut self, delay: Duration) -> Self {
        self.config.fetcher_config.segment_retry_delay_max = delay;
        self
    }

    /// Route every request through a relay proxy.
    pub fn relay(mut self, relay: Option<UrlRewrite>) -> Self {
        self.config.relay = relay;
        self
    }

    pub fn get_config(&self) -> &HlsConfig {
        &self.config
    }

    pub fn build(self) -> HlsConfig {
        self.config
    }
}

impl Default for HlsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProxyAuth, ProxyType};

    #[test]
    fn test_builder_defaults() {
        let config = DownloaderConfigBuilder::new().build();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.follow_redirects);
        assert!(config.use_system_proxy);
        assert!(!config.danger_accept_invalid_certs);
    }

    #[test]
    fn test_builder_customization() {
        let config = DownloaderConfigBuilder::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(20))
            .with_follow_redirects(false)
            .with_user_agent("CustomUserAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .with_header("bad header", "ignored")
            .with_system_proxy(false)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert!(!config.follow_redirects);
        assert_eq!(config.user_agent, "CustomUserAgent/1.0");
        assert!(!config.use_system_proxy);

        let header_value = config.headers.get("X-Custom-Header").unwrap();
        assert_eq!(header_value.to_str().unwrap(), "CustomValue");
        assert!(config.headers.get("bad header").is_none());
    }

    #[test]
    fn test_explicit_proxy_disables_system_proxy() {
        let proxy_config = ProxyConfig {
            url: "http://proxy.example.com:8080".to_string(),
            proxy_type: ProxyType::Http,
            auth: Some(ProxyAuth {
                username: "user".to_string(),
                password: "pass".to_string(),
            }),
        };

        let config = DownloaderConfigBuilder::new()
            .with_proxy(proxy_config.clone())
            .with_system_proxy(true)
            .build();

        assert!(!config.use_system_proxy);
        let stored_proxy = config.proxy.unwrap();
        assert_eq!(stored_proxy.url, proxy_config.url);
        assert_eq!(stored_proxy.auth.as_ref().unwrap().username, "user");
        assert_eq!(stored_proxy.proxy_type, proxy_config.proxy_type);
    }

    #[test]
    fn test_hls_builder() {
        let config = HlsConfigBuilder::new()
            .user_agent("Agent/2.0")
            .add_header("Referer", "https://example.com/")
            .select_closest_to_bitrate_variant(1_500_000)
            .download_concurrency(0)
            .max_segment_retries(None)
            .segment_retry_delay_base(Duration::from_millis(50))
            .max_nesting_depth(4)
            .relay(Some(UrlRewrite::new("http://relay/?u=")))
            .build();

        assert_eq!(config.base.user_agent, "Agent/2.0");
        assert!(config.base.headers.contains_key("referer"));
        assert_eq!(
            config.playlist_config.variant_selection_policy,
            HlsVariantSelectionPolicy::ClosestToBitrate(1_500_000)
        );
        assert_eq!(config.scheduler_config.download_concurrency, 1);
        assert_eq!(config.fetcher_config.max_segment_retries, None);
        assert_eq!(
            config.fetcher_config.segment_retry_delay_base,
            Duration::from_millis(50)
        );
        assert_eq!(config.playlist_config.max_nesting_depth, 4);
        assert_eq!(
            config.request_url("http://cdn/a.ts"),
            "http://relay/?u=http%3A%2F%2Fcdn%2Fa.ts"
        );
    }

    #[test]
    fn test_hls_builder_defaults() {
        let builder = HlsConfigBuilder::default();
        let config = builder.get_config();
        assert_eq!(config.scheduler_config.download_concurrency, 3);
        assert_eq!(config.fetcher_config.max_segment_retries, Some(3));
        assert!(config.relay.is_none());
    }
}
