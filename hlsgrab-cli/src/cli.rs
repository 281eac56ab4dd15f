use clap::Parser;
use hlsgrab_engine::ProxyType;
use std::path::PathBuf;

/// Environment variable holding the system default relay proxy base URL.
pub const RELAY_PROXY_ENV: &str = "HLSGRAB_RELAY_PROXY";

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "HLS playlist downloader",
    long_about = "Downloads complete HLS (VOD) playlists into single media files.\n\
                  \n\
                  Master playlists are resolved to their highest bandwidth rendition\n\
                  (configurable), segments are fetched concurrently with retries and\n\
                  written in playlist order. Several URLs can be downloaded one after\n\
                  another, or as a named series with --series."
)]
pub struct CliArgs {
    /// Playlist URL(s) to download
    #[arg(required = true, help = "URL(s) of HLS playlists to download")]
    pub input: Vec<String>,

    /// Output directory
    #[arg(
        short,
        long,
        default_value = "./downloads",
        help = "Directory where downloaded files will be saved"
    )]
    pub output_dir: PathBuf,

    /// Output file name template
    #[arg(
        short = 'n',
        long = "name",
        default_value = "%u",
        help = "Output file name template. Supported placeholders: %u (file name taken from the URL), %i (1-based input index). In series mode this is the series name"
    )]
    pub name_template: String,

    /// Titles matched to the inputs by position
    #[arg(
        short = 't',
        long = "title",
        value_name = "TITLE",
        help = "Title for the input at the same position (can be used multiple times)"
    )]
    pub titles: Vec<String>,

    /// Treat all inputs as the items of one series
    #[arg(
        short = 's',
        long,
        help = "Download the inputs as one series, named \"<name> - <title>\" or \"<name> - Episode <n>\""
    )]
    pub series: bool,

    /// Number of concurrent segment downloads
    #[arg(
        short = 'c',
        long,
        default_value = "3",
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Maximum number of concurrent segment downloads"
    )]
    pub concurrency: u16,

    /// Retry attempts per segment
    #[arg(
        long,
        default_value = "3",
        help = "Number of retries for a failing segment before the download fails"
    )]
    pub retries: u32,

    /// Retry failing segments until cancelled
    #[arg(
        long,
        conflicts_with = "retries",
        help = "Retry failing segments forever (stop with Ctrl-C)"
    )]
    pub retry_forever: bool,

    /// Base delay between segment retries in milliseconds
    #[arg(
        long,
        default_value = "500",
        help = "Base delay in milliseconds for the exponential retry backoff"
    )]
    pub retry_delay: u64,

    /// Target bandwidth for rendition selection
    #[arg(
        long,
        value_name = "BPS",
        help = "Pick the rendition whose bandwidth is closest to this value instead of the highest"
    )]
    pub bandwidth: Option<u64>,

    /// Prefer the lowest bandwidth rendition
    #[arg(
        long,
        conflicts_with = "bandwidth",
        help = "Pick the lowest bandwidth rendition instead of the highest"
    )]
    pub lowest_quality: bool,

    /// Overall HTTP timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Overall timeout in seconds for HTTP requests (0 disables it)"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Read timeout in seconds
    #[arg(
        long,
        default_value = "30",
        help = "Read timeout in seconds (maximum time between receiving data chunks)"
    )]
    pub read_timeout: u64,

    /// Per-segment timeout in seconds
    #[arg(
        long,
        default_value = "0",
        help = "Timeout for individual segment downloads in seconds (0 disables it)"
    )]
    pub segment_timeout: u64,

    /// Custom HTTP headers for download requests
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Custom user agent
    #[arg(long, help = "User agent sent with every request")]
    pub user_agent: Option<String>,

    /// Proxy URL (e.g., "http://proxy.example.com:8080")
    #[arg(
        long,
        help = "Proxy server URL for downloads (e.g., \"http://proxy.example.com:8080\")"
    )]
    pub proxy: Option<String>,

    /// Proxy type
    #[arg(long, value_enum, default_value = "http", help = "Proxy type")]
    pub proxy_type: ProxyType,

    /// Proxy username
    #[arg(long, help = "Username for proxy authentication")]
    pub proxy_user: Option<String>,

    /// Proxy password
    #[arg(long, help = "Password for proxy authentication")]
    pub proxy_pass: Option<String>,

    /// Use system proxy settings for downloads
    #[arg(
        long,
        default_value = "true",
        action = clap::ArgAction::Set,
        help = "Use system proxy settings for downloads if no explicit proxy is configured"
    )]
    pub use_system_proxy: bool,

    /// Disable all proxy settings for downloads
    #[arg(
        long,
        help = "Disable all proxy settings (including system proxy) for downloads"
    )]
    pub no_proxy: bool,

    /// Relay proxy base URL
    #[arg(
        long,
        value_name = "BASE_URL",
        help = "Relay every request through BASE_URL followed by the percent-encoded original URL"
    )]
    pub relay_proxy: Option<String>,

    /// System default relay proxy
    #[arg(
        long,
        env = RELAY_PROXY_ENV,
        hide = true,
        value_name = "BASE_URL"
    )]
    pub default_relay_proxy: Option<String>,

    /// Disable the relay proxy
    #[arg(
        long,
        conflicts_with = "relay_proxy",
        help = "Do not use a relay proxy, even if one is configured in the environment"
    )]
    pub no_relay: bool,

    /// Show progress bars
    #[arg(
        short = 'P',
        long = "progress",
        help = "Show progress bars for downloads"
    )]
    pub show_progress: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
