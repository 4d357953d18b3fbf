use crate::api::classify::classify;
use crate::api::decoder::{decode_body, ContentEncoding};
use crate::api::multipart::MultipartBody;
use crate::api::streaming::StreamExecutor;
use crate::api::transport::{RawResponse, ResponseBody, Transport};
use crate::api::types::{CompletionMode, UploadResponse};
use crate::auth::{Credentials, OAuth1Signer, Signer};
use crate::config::Config;
use crate::error::{TweetlineError, TweetlineResult};
use crate::metrics::Metrics;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Raw request body together with its content type.
struct RequestBody {
    content_type: String,
    bytes: Bytes,
}

/// Executes signed one-shot requests and hands out stream executors that
/// share the same connection pool.
pub struct ApiClient {
    transport: Transport,
    signer: Arc<dyn Signer>,
    metrics: Arc<Metrics>,
}

impl ApiClient {
    /// Create an ApiClient with its own transport and the OAuth 1.0a signer
    pub fn new(config: &Config) -> TweetlineResult<Self> {
        let transport = Transport::new(&config.api, &config.http)?;
        Ok(Self::with_parts(
            transport,
            Arc::new(OAuth1Signer::new()),
            Arc::new(Metrics::new()),
        ))
    }

    /// Assemble a client from an existing transport, signer and metrics
    pub fn with_parts(
        transport: Transport,
        signer: Arc<dyn Signer>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            transport,
            signer,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// New stream executor on this client's pool. Each executor runs at most
    /// one stream at a time.
    pub fn stream_executor(&self) -> StreamExecutor {
        StreamExecutor::new(
            self.transport.clone(),
            Arc::clone(&self.signer),
            Arc::clone(&self.metrics),
        )
    }

    // =========================================================================
    // One-shot requests
    // =========================================================================

    /// Signed GET; returns the decoded response text.
    #[instrument(skip(self, credentials), fields(api_op = "get"))]
    pub async fn execute_get(
        &self,
        uri: &str,
        credentials: &Credentials,
    ) -> TweetlineResult<String> {
        self.execute(Method::GET, uri, credentials, None).await
    }

    /// Signed POST without a body; parameters travel in the query string.
    #[instrument(skip(self, credentials), fields(api_op = "post"))]
    pub async fn execute_post(
        &self,
        uri: &str,
        credentials: &Credentials,
    ) -> TweetlineResult<String> {
        self.execute(Method::POST, uri, credentials, None).await
    }

    /// Upload `media` as the single `media` part of a multipart POST and return
    /// the `media_id_string` from the response.
    #[instrument(
        skip(self, credentials, media),
        fields(api_op = "post_multipart", media_len = media.len())
    )]
    pub async fn execute_post_multipart(
        &self,
        uri: &str,
        credentials: &Credentials,
        boundary: &str,
        media: &[u8],
    ) -> TweetlineResult<String> {
        let form = MultipartBody::new(boundary)?;
        let body = RequestBody {
            content_type: form.content_type(),
            bytes: form.encode_media(media)?,
        };

        // The exchange has released its response by the time the text is back,
        // so the id below is extracted from owned data only.
        let text = self.execute(Method::POST, uri, credentials, Some(body)).await?;
        let media_id = extract_media_id(&text)?;

        debug!(api_op = "post_multipart", media_id = %media_id, "Upload accepted");
        Ok(media_id)
    }

    async fn execute(
        &self,
        method: Method,
        uri: &str,
        credentials: &Credentials,
        body: Option<RequestBody>,
    ) -> TweetlineResult<String> {
        let url = parse_uri(uri)?;
        let guard = self.metrics.api.begin_exchange(url.path());

        match self.exchange(method, url, credentials, body).await {
            Ok(text) => {
                guard.succeed();
                Ok(text)
            }
            Err(e) => {
                guard.fail(&e.to_string());
                Err(e)
            }
        }
    }

    /// sign -> send -> decode -> classify
    async fn exchange(
        &self,
        method: Method,
        url: Url,
        credentials: &Credentials,
        body: Option<RequestBody>,
    ) -> TweetlineResult<String> {
        let auth_header = self
            .signer
            .authorization_header(&url, credentials, Some(method.clone()))?;

        let mut request = self
            .transport
            .request(method, url)
            .header(AUTHORIZATION, auth_header);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, body.content_type)
                .body(body.bytes);
        }

        let raw = self.transport.send(request, CompletionMode::FullBody).await?;
        let status = raw.status;
        let encoding = ContentEncoding::from_header(raw.content_encoding.as_deref())?;
        let decoded = decode_body(full_body(raw)?, encoding)?;

        trace!(
            status = status.as_u16(),
            encoding = %encoding,
            bytes = decoded.len(),
            "Response decoded"
        );
        if !status.is_success() {
            debug!(status = status.as_u16(), "Non-success status");
        }

        classify(String::from_utf8_lossy(&decoded).into_owned())
    }
}

fn parse_uri(uri: &str) -> TweetlineResult<Url> {
    Url::parse(uri)
        .map_err(|e| TweetlineError::InvalidArgument(format!("Invalid URI {}: {}", uri, e)))
}

fn full_body(raw: RawResponse) -> TweetlineResult<Bytes> {
    match raw.body {
        ResponseBody::Full(bytes) => Ok(bytes),
        ResponseBody::Streaming(_) => Err(TweetlineError::Transport(
            "Expected a buffered response body".to_string(),
        )),
    }
}

fn extract_media_id(text: &str) -> TweetlineResult<String> {
    let response: UploadResponse = serde_json::from_str(text).map_err(|e| {
        TweetlineError::Upload(format!("Upload response is not a JSON object: {}", e))
    })?;
    response
        .media_id_string
        .ok_or_else(|| TweetlineError::Upload("Upload response has no media_id_string".to_string()))
}
