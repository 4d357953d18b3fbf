use crate::api::decoder::{ContentEncoding, DecodedStream};
use crate::api::transport::{ResponseBody, Transport};
use crate::api::types::{ByteStream, CompletionMode};
use crate::auth::{Credentials, Signer};
use crate::error::{TweetlineError, TweetlineResult};
use crate::metrics::Metrics;
use bytes::BytesMut;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Url};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Reads newline-delimited text off a decoded body.
pub struct LineReader {
    stream: DecodedStream,
    buffer: BytesMut,
    /// Bytes of `buffer` already known not to contain a newline
    scanned: usize,
    eof: bool,
}

impl LineReader {
    pub fn new(stream: DecodedStream) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            scanned: 0,
            eof: false,
        }
    }

    /// Next line without its terminator (`\n` or `\r\n`), or `None` once the
    /// body is exhausted. An unterminated last line is still returned.
    pub async fn read_line(&mut self) -> TweetlineResult<Option<String>> {
        loop {
            if let Some(pos) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
                let mut line = self.buffer.split_to(self.scanned + pos + 1);
                self.scanned = 0;
                line.truncate(line.len() - 1);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            self.scanned = self.buffer.len();

            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest = self.buffer.split();
                self.scanned = 0;
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }

            match self.stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    trace!(bytes = chunk.len(), "Received stream chunk");
                    self.buffer.extend_from_slice(&chunk);
                }
                Ok(None) => self.eof = true,
                Err(e) => {
                    self.eof = true;
                    return Err(e);
                }
            }
        }
    }
}

/// Cloneable handle that cancels the running stream session.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Request cancellation. The read loop notices before its next line read,
    /// so at most one more line can still be delivered.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Marks the executor busy for the lifetime of one stream session. A pending
/// abort is consumed when the session ends, never when it starts.
struct ActiveSession<'a> {
    active: &'a AtomicBool,
    aborted: &'a AtomicBool,
}

impl<'a> ActiveSession<'a> {
    fn begin(active: &'a AtomicBool, aborted: &'a AtomicBool) -> TweetlineResult<Self> {
        if active.swap(true, Ordering::SeqCst) {
            return Err(TweetlineError::NotReady(
                "A stream is already running on this executor".to_string(),
            ));
        }
        Ok(Self { active, aborted })
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        self.aborted.store(false, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Runs a long-lived GET and feeds each non-empty line to a callback.
///
/// Not reentrant: one session at a time per executor. There is no timeout; a
/// quiet connection keeps the loop waiting until data arrives, the server
/// closes, or the caller drops the future.
pub struct StreamExecutor {
    transport: Transport,
    signer: Arc<dyn Signer>,
    metrics: Arc<Metrics>,
    aborted: Arc<AtomicBool>,
    active: AtomicBool,
}

impl StreamExecutor {
    pub fn new(transport: Transport, signer: Arc<dyn Signer>, metrics: Arc<Metrics>) -> Self {
        Self {
            transport,
            signer,
            metrics,
            aborted: Arc::new(AtomicBool::new(false)),
            active: AtomicBool::new(false),
        }
    }

    /// Cancel the running session; see [`AbortHandle::abort`].
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            aborted: Arc::clone(&self.aborted),
        }
    }

    /// Whether a session is currently running.
    pub fn is_streaming(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Open `uri` and call `on_line` for every non-empty line, in order, until
    /// the stream ends or the session is aborted.
    ///
    /// Lines are never checked for error envelopes; each one is handed over as-is.
    #[instrument(skip(self, credentials, on_line), fields(api_op = "get_stream"))]
    pub async fn execute_get_stream<F>(
        &self,
        uri: &str,
        credentials: &Credentials,
        mut on_line: F,
    ) -> TweetlineResult<()>
    where
        F: FnMut(&str) + Send,
    {
        let _session = ActiveSession::begin(&self.active, &self.aborted)?;

        let url = Url::parse(uri)
            .map_err(|e| TweetlineError::InvalidArgument(format!("Invalid URI {}: {}", uri, e)))?;
        let guard = self.metrics.api.begin_exchange(url.path());

        // streaming endpoints are signed without an explicit method
        let auth_header = match self.signer.authorization_header(&url, credentials, None) {
            Ok(header) => header,
            Err(e) => {
                guard.fail(&e.to_string());
                return Err(e);
            }
        };

        let request = self
            .transport
            .request(Method::GET, url)
            .header(AUTHORIZATION, auth_header);

        let raw = match self.transport.send(request, CompletionMode::HeadersOnly).await {
            Ok(raw) => raw,
            Err(e) => {
                guard.fail(&e.to_string());
                return Err(e);
            }
        };
        self.metrics.stream.record_open();

        if !raw.status.is_success() {
            debug!(status = raw.status.as_u16(), "Stream opened with non-success status");
        }

        let encoding = match ContentEncoding::from_header(raw.content_encoding.as_deref()) {
            Ok(encoding) => encoding,
            Err(e) => {
                guard.fail(&e.to_string());
                return Err(e);
            }
        };
        let body: ByteStream = match raw.body {
            ResponseBody::Streaming(body) => body,
            ResponseBody::Full(bytes) => Box::pin(futures::stream::once(async move { Ok(bytes) })),
        };
        let mut reader = LineReader::new(DecodedStream::new(body, encoding));

        debug!(stream_op = "open", encoding = %encoding, "Stream session started");

        let result = self.read_loop(&mut reader, &mut on_line).await;
        drop(reader);

        match &result {
            Ok(()) => guard.succeed(),
            Err(e) => {
                warn!(error = %e, "Stream terminated by error");
                guard.fail(&e.to_string());
            }
        }
        result
    }

    async fn read_loop<F>(&self, reader: &mut LineReader, on_line: &mut F) -> TweetlineResult<()>
    where
        F: FnMut(&str) + Send,
    {
        loop {
            if self.aborted.load(Ordering::SeqCst) {
                self.metrics.stream.record_abort();
                debug!(stream_op = "close", reason = "aborted");
                return Ok(());
            }

            match reader.read_line().await? {
                None => {
                    debug!(stream_op = "close", reason = "end_of_stream");
                    return Ok(());
                }
                Some(line) if line.is_empty() => self.metrics.stream.record_blank_line(),
                Some(line) => {
                    self.metrics.stream.record_line(line.len());
                    on_line(&line);
                }
            }
        }
    }
}
