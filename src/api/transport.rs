use crate::api::types::{ByteStream, CompletionMode};
use crate::config::{ApiConfig, HttpConfig};
use crate::error::{TweetlineError, TweetlineResult};
use bytes::Bytes;
use futures::stream::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Response body as handed back by the transport.
pub enum ResponseBody {
    /// Whole body, already read off the connection
    Full(Bytes),
    /// Live body; the connection stays checked out until this is dropped
    Streaming(ByteStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            ResponseBody::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Status, declared encoding, and the still-encoded body of one exchange.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_encoding: Option<String>,
    pub body: ResponseBody,
}

/// Owns the pooled HTTP client shared by every executor.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    accept_gzip: bool,
}

impl Transport {
    /// Build a transport with its own connection pool.
    ///
    /// No request or read timeout is configured: a stalled stream waits until
    /// the remote end closes or the caller gives up.
    pub fn new(api: &ApiConfig, http: &HttpConfig) -> TweetlineResult<Self> {
        let mut builder = Client::builder()
            .user_agent(api.user_agent.clone())
            .pool_max_idle_per_host(http.pool_max_idle_per_host);

        if http.pool_idle_timeout > 0 {
            builder = builder.pool_idle_timeout(Duration::from_secs(http.pool_idle_timeout));
        }
        if http.connect_timeout > 0 {
            builder = builder.connect_timeout(Duration::from_secs(http.connect_timeout));
        }

        let client = builder.build().map_err(|e| {
            TweetlineError::Transport(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self::with_client(client, api.accept_gzip))
    }

    /// Wrap an existing client, sharing its pool.
    pub fn with_client(client: Client, accept_gzip: bool) -> Self {
        Self {
            client,
            accept_gzip,
        }
    }

    /// Start a request carrying the transport-wide headers.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        if self.accept_gzip {
            request.header(ACCEPT_ENCODING, "gzip")
        } else {
            request
        }
    }

    /// Send a request. With [`CompletionMode::FullBody`] the body is read to the
    /// end and the connection returned to the pool before this returns.
    pub async fn send(
        &self,
        request: RequestBuilder,
        mode: CompletionMode,
    ) -> TweetlineResult<RawResponse> {
        let response = request.send().await?;

        let status = response.status();
        let content_encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        trace!(
            status = status.as_u16(),
            content_encoding = content_encoding.as_deref().unwrap_or("none"),
            mode = ?mode,
            "Response headers received"
        );

        let body = match mode {
            CompletionMode::FullBody => ResponseBody::Full(response.bytes().await?),
            CompletionMode::HeadersOnly => ResponseBody::Streaming(Box::pin(
                response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(TweetlineError::from)),
            )),
        };

        Ok(RawResponse {
            status,
            content_encoding,
            body,
        })
    }
}
