use bytes::{Bytes, BytesMut};

/// Container format of an assembled stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType {
    pub mime: &'static str,
    pub extension: &'static str,
}

impl MediaType {
    pub const MPEG_TS: MediaType = MediaType {
        mime: "video/mp2t",
        extension: "ts",
    };
}

impl Default for MediaType {
    fn default() -> Self {
        Self::MPEG_TS
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime)
    }
}

/// A complete media stream in playback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledStream {
    bytes: Bytes,
    media_type: MediaType,
}

impl AssembledStream {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Concatenates ordered segment buffers into a single stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamAssembler {
    media_type: MediaType,
}

impl StreamAssembler {
    /// `buffers` must already be in index order.
    pub fn assemble(&self, buffers: Vec<Bytes>) -> AssembledStream {
        let bytes = match buffers.len() {
            0 => Bytes::new(),
            1 => buffers.into_iter().next().unwrap_or_default(),
            _ => {
                let total_len = buffers.iter().map(Bytes::len).sum();
                let mut joined = BytesMut::with_capacity(total_len);
                for buffer in &buffers {
                    joined.extend_from_slice(buffer);
                }
                joined.freeze()
            }
        };

        AssembledStream {
            bytes,
            media_type: self.media_type,
        }
    }
}
