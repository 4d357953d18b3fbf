use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Metrics for one-shot and streaming API exchanges
#[derive(Debug, Default)]
pub struct ApiMetrics {
    /// Total number of API requests
    pub request_count: AtomicU64,
    /// Total number of successful exchanges
    pub success_count: AtomicU64,
    /// Total number of failed exchanges
    pub failure_count: AtomicU64,
    /// Total time spent in successful exchanges (nanoseconds)
    pub total_latency_ns: AtomicU64,
    /// Exchanges whose response has not been released yet
    pub in_flight: AtomicU64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, endpoint: &str) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        trace!(api_op = "request", endpoint = endpoint);
    }

    pub fn record_success(&self, endpoint: &str, latency: Duration) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        trace!(
            api_op = "success",
            endpoint = endpoint,
            latency_ms = latency.as_millis() as u64
        );
    }

    pub fn record_failure(&self, endpoint: &str, error: &str) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        trace!(api_op = "failure", endpoint = endpoint, error = error);
    }

    /// Number of exchanges currently holding a response
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start tracking an exchange. The returned guard releases the in-flight slot
    /// when dropped, whichever way the exchange ends.
    pub fn begin_exchange(self: &Arc<Self>, endpoint: &str) -> ExchangeGuard {
        self.record_request(endpoint);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        ExchangeGuard {
            metrics: Arc::clone(self),
            endpoint: endpoint.to_string(),
            started: Instant::now(),
            settled: false,
        }
    }

    /// Calculate average latency in milliseconds
    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.success_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total_ns = self.total_latency_ns.load(Ordering::Relaxed);
        (total_ns as f64 / count as f64) / 1_000_000.0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.request_count.load(Ordering::Relaxed);
        if total == 0 {
            return 100.0;
        }
        let success = self.success_count.load(Ordering::Relaxed);
        (success as f64 / total as f64) * 100.0
    }

    /// Log a summary of API metrics
    pub fn log_summary(&self) {
        let total = self.request_count.load(Ordering::Relaxed);
        let success = self.success_count.load(Ordering::Relaxed);
        let failures = self.failure_count.load(Ordering::Relaxed);

        info!(
            operation = "api_metrics_summary",
            total_requests = total,
            successful = success,
            failed = failures,
            in_flight = self.in_flight(),
            success_rate_pct = self.success_rate(),
            avg_latency_ms = self.avg_latency_ms(),
        );
    }
}

/// In-flight accounting for a single exchange.
#[derive(Debug)]
pub struct ExchangeGuard {
    metrics: Arc<ApiMetrics>,
    endpoint: String,
    started: Instant,
    settled: bool,
}

impl ExchangeGuard {
    pub fn succeed(mut self) {
        self.settled = true;
        self.metrics
            .record_success(&self.endpoint, self.started.elapsed());
    }

    pub fn fail(mut self, error: &str) {
        self.settled = true;
        self.metrics.record_failure(&self.endpoint, error);
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        if !self.settled {
            // dropped mid-flight, e.g. the caller cancelled the future
            self.metrics.record_failure(&self.endpoint, "dropped");
        }
        self.metrics.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Metrics for streaming sessions
#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Total number of stream sessions opened
    pub streams_opened: AtomicU64,
    /// Lines handed to callbacks
    pub lines_delivered: AtomicU64,
    /// Blank keep-alive lines skipped
    pub blank_lines_skipped: AtomicU64,
    /// Decoded bytes read from stream bodies
    pub bytes_read: AtomicU64,
    /// Sessions that ended because of an abort request
    pub aborts_observed: AtomicU64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
        trace!(stream_op = "open");
    }

    pub fn record_line(&self, bytes: usize) {
        self.lines_delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_blank_line(&self) {
        self.blank_lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.aborts_observed.fetch_add(1, Ordering::Relaxed);
        debug!(stream_op = "abort_observed");
    }

    pub fn log_summary(&self, elapsed_secs: f64) {
        info!(
            operation = "stream_metrics_summary",
            streams_opened = self.streams_opened.load(Ordering::Relaxed),
            lines_delivered = self.lines_delivered.load(Ordering::Relaxed),
            blank_lines_skipped = self.blank_lines_skipped.load(Ordering::Relaxed),
            bytes_read = self.bytes_read.load(Ordering::Relaxed),
            aborts_observed = self.aborts_observed.load(Ordering::Relaxed),
            duration_secs = elapsed_secs,
        );
    }
}

/// Combined metrics for the entire client
pub struct Metrics {
    pub api: Arc<ApiMetrics>,
    pub stream: Arc<StreamMetrics>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            api: Arc::new(ApiMetrics::new()),
            stream: Arc::new(StreamMetrics::new()),
            start_time: Instant::now(),
        }
    }

    /// Log a complete metrics summary
    pub fn log_full_summary(&self) {
        let elapsed = self.elapsed().as_secs_f64();
        info!("=== tweetline Metrics Summary ===");
        self.api.log_summary();
        self.stream.log_summary(elapsed);
        info!("================================");
    }

    /// Get elapsed time since metrics creation
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
