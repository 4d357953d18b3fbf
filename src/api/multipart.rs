//! `multipart/form-data` encoding with a caller-chosen boundary.

use crate::error::{TweetlineError, TweetlineResult};
use bytes::{BufMut, Bytes, BytesMut};

/// Form field carrying the uploaded bytes.
pub const MEDIA_FIELD: &str = "media";

/// RFC 2046 limit on boundary length.
const MAX_BOUNDARY_LEN: usize = 70;

fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c)
}

/// A single-part multipart body.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
}

impl MultipartBody {
    pub fn new(boundary: &str) -> TweetlineResult<Self> {
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
            return Err(TweetlineError::InvalidArgument(format!(
                "Multipart boundary must be 1-{} characters, got {}",
                MAX_BOUNDARY_LEN,
                boundary.len()
            )));
        }
        if !boundary.chars().all(is_boundary_char) || boundary.ends_with(' ') {
            return Err(TweetlineError::InvalidArgument(format!(
                "Multipart boundary contains invalid characters: {:?}",
                boundary
            )));
        }
        Ok(Self {
            boundary: boundary.to_string(),
        })
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode `media` as the only part, named [`MEDIA_FIELD`].
    pub fn encode_media(&self, media: &[u8]) -> TweetlineResult<Bytes> {
        let delimiter = format!("--{}", self.boundary);
        if contains(media, delimiter.as_bytes()) {
            return Err(TweetlineError::InvalidArgument(
                "Multipart boundary occurs inside the media bytes".to_string(),
            ));
        }

        let mut buf = BytesMut::with_capacity(media.len() + 2 * delimiter.len() + 96);
        buf.put_slice(delimiter.as_bytes());
        buf.put_slice(b"\r\n");
        buf.put_slice(b"Content-Disposition: form-data; name=\"");
        buf.put_slice(MEDIA_FIELD.as_bytes());
        buf.put_slice(b"\"\r\n\r\n");
        buf.put_slice(media);
        buf.put_slice(b"\r\n");
        buf.put_slice(delimiter.as_bytes());
        buf.put_slice(b"--\r\n");
        Ok(buf.freeze())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
