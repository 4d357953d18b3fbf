use crate::error::{ErrorEntry, TweetlineResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// How much of the response the transport waits for before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Buffer the whole body (one-shot requests)
    FullBody,
    /// Return as soon as the headers arrive; the body is read incrementally
    HeadersOnly,
}

/// Body bytes as they arrive from the network, still content-encoded.
pub type ByteStream = Pin<Box<dyn futures::Stream<Item = TweetlineResult<Bytes>> + Send>>;

/// Upstream error envelope: `{"errors":[{"code":..,"message":..}, ...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ErrorEntry>,
}

/// Media upload response. Only the string id is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub media_id_string: Option<String>,
}
