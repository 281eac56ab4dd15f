use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::DownloadError;
use crate::hls::AssembledStream;

/// Destination for finished downloads.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Persists `stream` under `name`. The sink chooses the extension from
    /// the stream's media type.
    async fn write(&self, stream: AssembledStream, name: &str) -> Result<(), DownloadError>;
}

/// Writes each stream to `{output_dir}/{name}.{extension}`.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{extension}", sanitize_filename(name)))
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn write(&self, stream: AssembledStream, name: &str) -> Result<(), DownloadError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self.path_for(name, stream.media_type().extension);
        let size = stream.len();
        tokio::fs::write(&path, stream.into_bytes())
            .await
            .map_err(|e| DownloadError::SinkError(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), bytes = size, "Wrote output file");
        Ok(())
    }
}

/// Replaces characters that are not allowed in file names on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().trim_end_matches('.').trim_end();
    if cleaned.is_empty() {
        "output".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::StreamAssembler;
    use bytes::Bytes;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Show - Episode 1"), "Show - Episode 1");
        assert_eq!(sanitize_filename("a/b\\c:d?"), "a_b_c_d_");
        assert_eq!(sanitize_filename("  name.. "), "name");
        assert_eq!(sanitize_filename("..."), "output");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[tokio::test]
    async fn test_file_sink_writes_stream() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("nested"));
        let stream = StreamAssembler::default().assemble(vec![
            Bytes::from_static(b"abc"),
            Bytes::from_static(b"def"),
        ]);

        sink.write(stream, "Show: Pilot").await.unwrap();

        let written = tokio::fs::read(dir.path().join("nested").join("Show_ Pilot.ts"))
            .await
            .unwrap();
        assert_eq!(written, b"abcdef");
    }
}
