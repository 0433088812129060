//! Request metrics for the API client
//!
//! Counters are plain atomics. Latencies go into a bounded ring buffer
//! (`VecDeque`, oldest sample evicted first) for percentile queries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

const MAX_LATENCY_SAMPLES: usize = 1000;

/// Counters and latency samples for one `ApiClient`
#[derive(Debug)]
pub struct ClientMetrics {
    requests: AtomicU64,
    retries_after_refresh: AtomicU64,
    timeouts: AtomicU64,
    session_expiries: AtomicU64,
    backend_errors: AtomicU64,
    latencies_ms: Mutex<VecDeque<u64>>,
}

/// Point-in-time copy of [`ClientMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub retries_after_refresh: u64,
    pub timeouts: u64,
    pub session_expiries: u64,
    pub backend_errors: u64,
    pub p50_latency_ms: Option<u64>,
    pub p95_latency_ms: Option<u64>,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            retries_after_refresh: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            session_expiries: AtomicU64::new(0),
            backend_errors: AtomicU64::new(0),
            latencies_ms: Mutex::new(VecDeque::with_capacity(MAX_LATENCY_SAMPLES)),
        }
    }

    /// Record one HTTP attempt and how long it took
    pub fn record_attempt(&self, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let mut samples = self.latencies_ms.lock();
        samples.push_back(ms);
        if samples.len() > MAX_LATENCY_SAMPLES {
            samples.pop_front();
        }
    }

    pub fn record_retry_after_refresh(&self) {
        self.retries_after_refresh.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_expired(&self) {
        self.session_expiries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_error(&self) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn p50_latency_ms(&self) -> Option<u64> {
        self.percentile(0.50)
    }

    pub fn p95_latency_ms(&self) -> Option<u64> {
        self.percentile(0.95)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            retries_after_refresh: self.retries_after_refresh.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            session_expiries: self.session_expiries.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            p50_latency_ms: self.p50_latency_ms(),
            p95_latency_ms: self.p95_latency_ms(),
        }
    }

    /// Nearest-rank percentile over the retained samples
    fn percentile(&self, percentile: f64) -> Option<u64> {
        let mut sorted: Vec<u64> = self.latencies_ms.lock().iter().copied().collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_unstable();

        let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
        Some(sorted[index])
    }
}
