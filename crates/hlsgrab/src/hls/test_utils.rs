// Shared fakes for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::DownloadError;
use crate::hls::fetcher::{SegmentDownloader, SegmentTask};
use crate::hls::playlist::PlaylistLoader;
use crate::hls::{AssembledStream, HlsDownloaderError};
use crate::output::OutputSink;

/// Macro to initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
macro_rules! init_test_tracing {
    () => {
        init_test_tracing!(DEBUG);
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

pub(crate) use init_test_tracing;

/// A media playlist listing `uris` in order.
pub(crate) fn media_playlist(uris: &[&str]) -> String {
    let mut content =
        String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n");
    for uri in uris {
        content.push_str(&format!("#EXTINF:10.0,\n{uri}\n"));
    }
    content.push_str("#EXT-X-ENDLIST\n");
    content
}

/// Tasks `0..count` pointing at `http://cdn/p/{index}.ts`.
pub(crate) fn tasks_for(count: usize) -> Vec<SegmentTask> {
    (0..count)
        .map(|index| {
            let uri = Url::parse(&format!("http://cdn/p/{index}.ts")).unwrap();
            SegmentTask::new(index, uri)
        })
        .collect()
}

/// Serves playlists from memory and records every requested URL.
#[derive(Default)]
pub(crate) struct StaticLoader {
    playlists: HashMap<String, String>,
    pub(crate) requests: Mutex<Vec<String>>,
}

impl StaticLoader {
    pub(crate) fn with(mut self, url: &str, content: &str) -> Self {
        self.playlists.insert(url.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl PlaylistLoader for StaticLoader {
    async fn load(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String, HlsDownloaderError> {
        if cancel.is_cancelled() {
            return Err(HlsDownloaderError::Cancelled);
        }
        self.requests.lock().unwrap().push(url.to_string());
        self.playlists
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| HlsDownloaderError::SegmentFetchError(format!("HTTP 404 for {url}")))
    }
}

#[derive(Default)]
struct MockState {
    attempts: HashMap<usize, u32>,
    completion_order: Vec<usize>,
}

/// Scriptable segment downloader.
///
/// Segment payloads are derived from the URI, so the same fake can serve
/// several playlists.
#[derive(Default)]
pub(crate) struct MockDownloader {
    delays: HashMap<usize, Duration>,
    failures: HashMap<usize, u32>,
    cancel_after: Option<(usize, CancellationToken)>,
    total_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    state: Mutex<MockState>,
}

impl MockDownloader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// The first `count` attempts for `index` fail.
    pub(crate) fn with_failures(mut self, index: usize, count: u32) -> Self {
        self.failures.insert(index, count);
        self
    }

    /// Cancels `token` on the `calls`-th fetch, which then fails.
    pub(crate) fn cancel_after_calls(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub(crate) fn payload(uri: &Url) -> Bytes {
        Bytes::from(format!("<segment {uri}>"))
    }

    pub(crate) fn completion_order(&self) -> Vec<usize> {
        self.state.lock().unwrap().completion_order.clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_for(&self, index: usize) -> u32 {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(&index)
            .copied()
            .unwrap_or(0)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SegmentDownloader for MockDownloader {
    async fn fetch_segment(
        &self,
        task: &SegmentTask,
        cancel: &CancellationToken,
    ) -> Result<Bytes, HlsDownloaderError> {
        if cancel.is_cancelled() {
            return Err(HlsDownloaderError::Cancelled);
        }

        let call = self.total_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let attempt = {
            let mut state = self.state.lock().unwrap();
            let attempt = state.attempts.entry(task.index).or_insert(0);
            *attempt += 1;
            *attempt
        };
        if let Some((after, token)) = &self.cancel_after {
            if call >= *after {
                token.cancel();
                return Err(HlsDownloaderError::Cancelled);
            }
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&task.index) {
            tokio::time::sleep(*delay).await;
        }

        if attempt <= self.failures.get(&task.index).copied().unwrap_or(0) {
            return Err(HlsDownloaderError::SegmentFetchError(format!(
                "HTTP 503 for segment {}",
                task.uri
            )));
        }

        self.state
            .lock()
            .unwrap()
            .completion_order
            .push(task.index);
        Ok(Self::payload(&task.uri))
    }
}

type WriteHook = Box<dyn Fn() + Send + Sync>;

/// Keeps every written stream in memory.
#[derive(Default)]
pub(crate) struct RecordingSink {
    writes: Mutex<Vec<(String, AssembledStream)>>,
    on_write: Mutex<Option<WriteHook>>,
}

impl RecordingSink {
    pub(crate) fn writes(&self) -> Vec<(String, AssembledStream)> {
        self.writes.lock().unwrap().clone()
    }

    /// Runs `hook` after every successful write.
    pub(crate) fn on_write(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_write.lock().unwrap() = Some(Box::new(hook));
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn write(&self, stream: AssembledStream, name: &str) -> Result<(), DownloadError> {
        self.writes.lock().unwrap().push((name.to_string(), stream));
        if let Some(hook) = self.on_write.lock().unwrap().as_ref() {
            hook();
        }
        Ok(())
    }
}
