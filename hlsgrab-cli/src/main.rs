use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use error::AppError;
use hlsgrab_engine::{
    CancellationToken, DownloaderConfig, FileSink, HlsConfig, HlsDownloader, ProxyAuth,
    ProxyConfig, RelaySetting,
};
use indicatif::MultiProgress;
use mimalloc::MiMalloc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod error;
mod processor;
mod utils;

use cli::CliArgs;
use processor::InputPlan;
use utils::progress::ProgressManager;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("hlsgrab.log")?;
    let (file_writer, _log_guard) = tracing_appender::non_blocking(log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(MakeWriterExt::and(std::io::stdout, file_writer))
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    info!("HLS Downloader v{}", env!("CARGO_PKG_VERSION"));
    info!("==================================================================");

    info!(
        "HTTP timeout configuration: overall={}s, connect={}s, read={}s, segment={}s",
        args.timeout, args.connect_timeout, args.read_timeout, args.segment_timeout
    );

    let download_config = build_download_config(&args);
    let hls_config = build_hls_config(&args, download_config);

    let sink = Arc::new(FileSink::new(args.output_dir.clone()));
    let downloader = HlsDownloader::new(hls_config, sink)?;

    let multi = MultiProgress::new();
    let progress_manager = if args.show_progress {
        ProgressManager::new(multi)
    } else {
        ProgressManager::new_disabled(multi)
    };

    // Ctrl-C cancels every in-flight download
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, stopping downloads...");
            signal_token.cancel();
        }
    });

    let plan = InputPlan {
        inputs: &args.input,
        titles: &args.titles,
        name_template: &args.name_template,
        series: args.series,
    };
    processor::process_inputs(&plan, &downloader, &progress_manager, &cancel).await
}

fn build_download_config(args: &CliArgs) -> DownloaderConfig {
    // User headers replace the defaults with the same name
    let mut headers = DownloaderConfig::get_default_headers();
    headers.extend(utils::parse_headers(&args.headers));

    let mut builder = DownloaderConfig::builder()
        .with_timeout(Duration::from_secs(args.timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_read_timeout(Duration::from_secs(args.read_timeout))
        .with_headers(headers);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.with_user_agent(user_agent);
    }

    // Handle proxy configuration
    if args.no_proxy {
        // No proxy flag overrides everything else
        info!("All proxy settings disabled (--no-proxy flag)");
        return builder.with_system_proxy(false).build();
    }

    if let Some(proxy_url) = &args.proxy {
        // Configure proxy authentication if both username and password are provided
        let auth = match (&args.proxy_user, &args.proxy_pass) {
            (Some(username), Some(password)) => Some(ProxyAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        info!(
            proxy_url = %proxy_url,
            proxy_type = ?args.proxy_type,
            has_auth = auth.is_some(),
            "Using explicit proxy configuration for downloads"
        );
        builder = builder.with_proxy(ProxyConfig {
            url: proxy_url.clone(),
            proxy_type: args.proxy_type,
            auth,
        });
    } else if args.use_system_proxy {
        info!("Using system proxy settings for downloads");
        builder = builder.with_system_proxy(true);
    } else {
        info!("No proxy settings configured for downloads");
        builder = builder.with_system_proxy(false);
    }

    builder.build()
}

fn build_hls_config(args: &CliArgs, download_config: DownloaderConfig) -> HlsConfig {
    let mut builder = HlsConfig::builder()
        .with_base_config(download_config)
        .download_concurrency(usize::from(args.concurrency))
        .max_segment_retries((!args.retry_forever).then_some(args.retries))
        .segment_retry_delay_base(Duration::from_millis(args.retry_delay))
        .segment_download_timeout(
            (args.segment_timeout > 0).then(|| Duration::from_secs(args.segment_timeout)),
        )
        .relay(relay_rewrite(args));

    builder = match (args.bandwidth, args.lowest_quality) {
        (Some(bandwidth), _) => builder.select_closest_to_bitrate_variant(bandwidth),
        (None, true) => builder.select_lowest_bitrate_variant(),
        (None, false) => builder.select_highest_bitrate_variant(),
    };

    builder.build()
}

/// The user's relay flags layered over the environment default.
fn relay_rewrite(args: &CliArgs) -> Option<hlsgrab_engine::UrlRewrite> {
    let user = if args.no_relay {
        RelaySetting::disabled()
    } else {
        RelaySetting {
            enabled: args.relay_proxy.as_ref().map(|_| true),
            base_url: args.relay_proxy.clone(),
        }
    };
    let system_default = args
        .default_relay_proxy
        .as_ref()
        .map(RelaySetting::enabled_with)
        .unwrap_or_default();

    let rewrite = RelaySetting::resolve(&user, &system_default);
    if let Some(rewrite) = &rewrite {
        info!(relay = %rewrite.base(), "Routing requests through relay proxy");
    }
    rewrite
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlsgrab_engine::ProxyType;
    use hlsgrab_engine::hls::HlsVariantSelectionPolicy;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["hlsgrab"];
        argv.extend_from_slice(extra);
        argv.push("http://cdn/p/index.m3u8");
        let mut args = CliArgs::try_parse_from(argv).unwrap();
        // keep tests independent of the caller's environment
        if !extra.contains(&"--default-relay-proxy") {
            args.default_relay_proxy = None;
        }
        args
    }

    #[test]
    fn test_relay_user_overrides_default() {
        let args = parse(&[
            "--relay-proxy",
            "http://mine/?u=",
            "--default-relay-proxy",
            "http://system/?u=",
        ]);
        assert_eq!(relay_rewrite(&args).unwrap().base(), "http://mine/?u=");
    }

    #[test]
    fn test_relay_falls_back_to_default() {
        let args = parse(&["--default-relay-proxy", "http://system/?u="]);
        assert_eq!(relay_rewrite(&args).unwrap().base(), "http://system/?u=");

        let args = parse(&["--no-relay", "--default-relay-proxy", "http://system/?u="]);
        assert!(relay_rewrite(&args).is_none());

        assert!(relay_rewrite(&parse(&[])).is_none());
    }

    #[test]
    fn test_hls_config_from_args() {
        let args = parse(&["-c", "6", "--retry-forever", "--bandwidth", "900000"]);
        let config = build_hls_config(&args, build_download_config(&args));
        assert_eq!(config.scheduler_config.download_concurrency, 6);
        assert_eq!(config.fetcher_config.max_segment_retries, None);
        assert_eq!(config.fetcher_config.segment_download_timeout, None);
        assert_eq!(
            config.playlist_config.variant_selection_policy,
            HlsVariantSelectionPolicy::ClosestToBitrate(900_000)
        );
    }

    #[test]
    fn test_download_config_proxy_handling() {
        let args = parse(&["--proxy", "socks5://127.0.0.1:1080", "--proxy-type", "socks5"]);
        let config = build_download_config(&args);
        assert!(!config.use_system_proxy);
        assert_eq!(config.proxy.unwrap().proxy_type, ProxyType::Socks5);

        let config = build_download_config(&parse(&["--no-proxy", "-H", "Referer: https://x/"]));
        assert!(config.proxy.is_none());
        assert!(!config.use_system_proxy);
        assert_eq!(config.headers["referer"], "https://x/");
    }
}
