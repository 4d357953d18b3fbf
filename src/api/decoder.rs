//! Transport-level content decoding (identity or gzip).
//!
//! One-shot responses are decoded in one go from the buffered body. Streaming
//! responses go through [`DecodedStream`], which inflates chunk by chunk so a
//! line can be produced before the rest of the body has arrived.

use crate::api::types::ByteStream;
use crate::error::{TweetlineError, TweetlineResult};
use bytes::Bytes;
use flate2::read::GzDecoder;
use futures::stream::StreamExt;
use std::io::{Read, Write};
use strum::{Display, EnumString};
use tracing::trace;

/// Declared `Content-Encoding` of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ContentEncoding {
    #[strum(to_string = "identity")]
    Identity,
    #[strum(to_string = "gzip", serialize = "x-gzip")]
    Gzip,
}

impl ContentEncoding {
    /// Absent or empty means identity; unknown codings are a decode error.
    pub fn from_header(value: Option<&str>) -> TweetlineResult<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(ContentEncoding::Identity),
            Some(v) => v.parse().map_err(|_| {
                TweetlineError::Decode(format!("Unsupported content-encoding: {}", v))
            }),
        }
    }
}

/// Decode a fully buffered body. Identity bodies are returned as-is.
pub fn decode_body(body: Bytes, encoding: ContentEncoding) -> TweetlineResult<Bytes> {
    match encoding {
        ContentEncoding::Identity => Ok(body),
        ContentEncoding::Gzip => {
            if body.is_empty() {
                return Ok(body);
            }
            let mut decoded = Vec::with_capacity(body.len() * 4);
            GzDecoder::new(body.as_ref())
                .read_to_end(&mut decoded)
                .map_err(|e| TweetlineError::Decode(format!("gzip: {}", e)))?;
            trace!(
                compressed = body.len(),
                decompressed = decoded.len(),
                "Decoded gzip body"
            );
            Ok(Bytes::from(decoded))
        }
    }
}

/// Push-style gzip inflater: compressed chunks in, whatever is decodable so far out.
pub struct GzipChunkDecoder {
    inner: flate2::write::GzDecoder<Vec<u8>>,
    consumed: usize,
}

impl GzipChunkDecoder {
    pub fn new() -> Self {
        Self {
            inner: flate2::write::GzDecoder::new(Vec::new()),
            consumed: 0,
        }
    }

    /// Feed one compressed chunk and take the bytes it produced (may be empty).
    pub fn feed(&mut self, chunk: &[u8]) -> TweetlineResult<Bytes> {
        self.inner
            .write_all(chunk)
            .and_then(|_| self.inner.flush())
            .map_err(|e| TweetlineError::Decode(format!("gzip: {}", e)))?;
        self.consumed += chunk.len();
        Ok(Bytes::from(std::mem::take(self.inner.get_mut())))
    }

    /// Finish the stream, verifying the gzip trailer. A body that never carried
    /// any bytes finishes empty, same as [`decode_body`].
    pub fn finish(mut self) -> TweetlineResult<Bytes> {
        if self.consumed == 0 {
            return Ok(Bytes::new());
        }
        self.inner
            .try_finish()
            .map_err(|e| TweetlineError::Decode(format!("gzip stream truncated: {}", e)))?;
        Ok(Bytes::from(std::mem::take(self.inner.get_mut())))
    }
}

impl Default for GzipChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Incrementally decoded response body.
pub struct DecodedStream {
    body: ByteStream,
    gzip: Option<GzipChunkDecoder>,
    finished: bool,
}

impl DecodedStream {
    pub fn new(body: ByteStream, encoding: ContentEncoding) -> Self {
        let gzip = match encoding {
            ContentEncoding::Identity => None,
            ContentEncoding::Gzip => Some(GzipChunkDecoder::new()),
        };
        Self {
            body,
            gzip,
            finished: false,
        }
    }

    /// Next decoded chunk, `Ok(None)` at end of body. After an error the stream
    /// reports end-of-body on every further call.
    pub async fn next_chunk(&mut self) -> TweetlineResult<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }

        let result = match self.body.next().await {
            Some(Ok(chunk)) => match self.gzip.as_mut() {
                None => Ok(Some(chunk)),
                Some(decoder) => decoder.feed(&chunk).map(Some),
            },
            Some(Err(e)) => Err(e),
            None => {
                self.finished = true;
                match self.gzip.take() {
                    None => Ok(None),
                    Some(decoder) => decoder
                        .finish()
                        .map(|tail| if tail.is_empty() { None } else { Some(tail) }),
                }
            }
        };

        if result.is_err() {
            self.finished = true;
        }
        result
    }
}
