// HLS Playlist Resolver: Loads playlists, follows master playlists and lists media segments.

use crate::hls::HlsDownloaderError;
use crate::hls::config::{HlsConfig, HlsVariantSelectionPolicy};
use async_trait::async_trait;
use m3u8_rs::{Playlist, parse_playlist_res};
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Source of playlist documents.
#[async_trait]
pub trait PlaylistLoader: Send + Sync {
    /// Returns the text of the playlist at `url`.
    async fn load(&self, url: &Url, cancel: &CancellationToken)
    -> Result<String, HlsDownloaderError>;
}

/// Loads playlists over HTTP.
///
/// Relative references are later resolved against the requested URL, not
/// the final URL after HTTP redirects.
pub struct HttpPlaylistLoader {
    http_client: Client,
    config: Arc<HlsConfig>,
}

impl HttpPlaylistLoader {
    pub fn new(http_client: Client, config: Arc<HlsConfig>) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn fetch_text(&self, url: &Url) -> Result<String, HlsDownloaderError> {
        let response = self
            .http_client
            .get(self.config.request_url(url.as_str()))
            .timeout(self.config.playlist_config.playlist_fetch_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HlsDownloaderError::PlaylistError(format!(
                "Failed to fetch playlist {url}: HTTP {}",
                response.status()
            )));
        }
        let playlist_bytes = response.bytes().await?;
        String::from_utf8(playlist_bytes.to_vec()).map_err(|e| {
            HlsDownloaderError::PlaylistError(format!("Playlist content is not valid UTF-8: {e}"))
        })
    }
}

#[async_trait]
impl PlaylistLoader for HttpPlaylistLoader {
    async fn load(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, HlsDownloaderError> {
        if cancel.is_cancelled() {
            return Err(HlsDownloaderError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HlsDownloaderError::Cancelled),
            text = self.fetch_text(url) => text,
        }
    }
}

/// One entry of a master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub bandwidth: u64,
    pub url: Url,
}

/// A parsed playlist document with every reference made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPlaylist {
    Master(Vec<Rendition>),
    Media(Vec<Url>),
}

/// Resolves `reference` against the playlist it appeared in.
///
/// Absolute URLs are kept, absolute paths are resolved against the scheme
/// and host of `base`, anything else against the directory of `base`.
pub fn resolve_locator(base: &Url, reference: &str) -> Result<Url, HlsDownloaderError> {
    base.join(reference.trim()).map_err(|e| {
        HlsDownloaderError::PlaylistError(format!(
            "Could not resolve {reference} against {base}: {e}"
        ))
    })
}

/// Parses a playlist document fetched from `base`.
///
/// A blank document is an empty media playlist. Documents without the
/// `#EXTM3U` header are read as plain locator lists.
pub fn parse_playlist(content: &str, base: &Url) -> Result<ParsedPlaylist, HlsDownloaderError> {
    if content.trim().is_empty() {
        return Ok(ParsedPlaylist::Media(Vec::new()));
    }

    let playlist = match parse_playlist_res(content.as_bytes()) {
        Ok(playlist) => playlist,
        Err(_) if !content.trim_start().starts_with("#EXTM3U") => {
            return parse_locator_list(content, base);
        }
        Err(e) => {
            return Err(HlsDownloaderError::PlaylistError(format!(
                "Failed to parse playlist {base}: {e}"
            )));
        }
    };

    match playlist {
        Playlist::MasterPlaylist(master) => {
            let renditions = master
                .variants
                .iter()
                // I-frame only streams are trick-play renditions, not playable media
                .filter(|variant| !variant.is_i_frame)
                .map(|variant| {
                    Ok(Rendition {
                        bandwidth: variant.bandwidth,
                        url: resolve_locator(base, &variant.uri)?,
                    })
                })
                .collect::<Result<Vec<_>, HlsDownloaderError>>()?;
            Ok(ParsedPlaylist::Master(renditions))
        }
        Playlist::MediaPlaylist(media) => {
            let segments = media
                .segments
                .iter()
                .map(|segment| resolve_locator(base, &segment.uri))
                .collect::<Result<Vec<_>, HlsDownloaderError>>()?;
            Ok(ParsedPlaylist::Media(segments))
        }
    }
}

/// Every non-blank line that is not a `#` comment is a segment locator.
fn parse_locator_list(content: &str, base: &Url) -> Result<ParsedPlaylist, HlsDownloaderError> {
    if content.contains("#EXT-X-STREAM-INF") {
        return Err(HlsDownloaderError::PlaylistError(format!(
            "Failed to parse playlist {base}: missing #EXTM3U header"
        )));
    }

    let segments = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            // whitespace and angle brackets never appear unescaped in a URI
            if line.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
                return Err(HlsDownloaderError::PlaylistError(format!(
                    "Failed to parse playlist {base}: not a locator: {line}"
                )));
            }
            resolve_locator(base, line)
        })
        .collect::<Result<Vec<_>, HlsDownloaderError>>()?;
    Ok(ParsedPlaylist::Media(segments))
}

/// Picks a rendition according to `policy`. Ties go to the first rendition listed.
pub fn select_rendition<'a>(
    renditions: &'a [Rendition],
    policy: &HlsVariantSelectionPolicy,
) -> Option<&'a Rendition> {
    // `Iterator::max_by_key` keeps the last maximum, so fold explicitly.
    let pick = |better: &dyn Fn(&Rendition, &Rendition) -> bool| {
        renditions.iter().fold(None::<&Rendition>, |best, candidate| match best {
            Some(current) if !better(candidate, current) => Some(current),
            _ => Some(candidate),
        })
    };

    match policy {
        HlsVariantSelectionPolicy::HighestBitrate => {
            pick(&|a: &Rendition, b: &Rendition| a.bandwidth > b.bandwidth)
        }
        HlsVariantSelectionPolicy::LowestBitrate => {
            pick(&|a: &Rendition, b: &Rendition| a.bandwidth < b.bandwidth)
        }
        HlsVariantSelectionPolicy::ClosestToBitrate(target) => {
            pick(&|a: &Rendition, b: &Rendition| {
                a.bandwidth.abs_diff(*target) < b.bandwidth.abs_diff(*target)
            })
        }
    }
}

/// Turns a playlist reference into the ordered list of its media segments.
pub struct PlaylistResolver {
    loader: Arc<dyn PlaylistLoader>,
    config: Arc<HlsConfig>,
}

impl PlaylistResolver {
    pub fn new(loader: Arc<dyn PlaylistLoader>, config: Arc<HlsConfig>) -> Self {
        Self { loader, config }
    }

    /// Resolves `locator` to its segment URLs in playback order.
    ///
    /// Master playlists are followed through the selected rendition until a
    /// media playlist is reached. A media playlist without segments yields an
    /// empty list; deciding whether that is an error is left to the caller.
    pub async fn resolve(
        &self,
        locator: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, HlsDownloaderError> {
        let mut playlist_url = Url::parse(locator).map_err(|e| {
            HlsDownloaderError::PlaylistError(format!("Invalid playlist URL {locator}: {e}"))
        })?;
        let max_depth = self.config.playlist_config.max_nesting_depth;
        let policy = &self.config.playlist_config.variant_selection_policy;

        for depth in 0..=max_depth {
            if cancel.is_cancelled() {
                return Err(HlsDownloaderError::Cancelled);
            }

            let content = self
                .loader
                .load(&playlist_url, cancel)
                .await
                .map_err(|e| match e {
                    HlsDownloaderError::Cancelled | HlsDownloaderError::PlaylistError(_) => e,
                    other => HlsDownloaderError::PlaylistError(format!(
                        "Failed to load playlist {playlist_url}: {other}"
                    )),
                })?;

            match parse_playlist(&content, &playlist_url)? {
                ParsedPlaylist::Master(renditions) => {
                    let selected = select_rendition(&renditions, policy).ok_or_else(|| {
                        HlsDownloaderError::PlaylistError(format!(
                            "no renditions in master playlist {playlist_url}"
                        ))
                    })?;
                    debug!(
                        depth,
                        bandwidth = selected.bandwidth,
                        url = %selected.url,
                        candidates = renditions.len(),
                        "Selected rendition"
                    );
                    playlist_url = selected.url.clone();
                }
                ParsedPlaylist::Media(segments) => {
                    info!(url = %playlist_url, segments = segments.len(), "Resolved media playlist");
                    return Ok(segments);
                }
            }
        }

        Err(HlsDownloaderError::TooManyRedirections { max_depth })
    }
}
