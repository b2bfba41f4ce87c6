//! Serving metrics and statistics for the prediction endpoint.

use crate::types::Signal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the prediction endpoint
pub struct ServingMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Requests answered with an error
    pub requests_failed: AtomicU64,
    /// Features filled with 0.0 because the payload omitted them
    pub features_defaulted: AtomicU64,
    /// Successful predictions by signal label
    signals: RwLock<HashMap<&'static str, u64>>,
    /// Request handling times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServingMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            features_defaulted: AtomicU64::new(0),
            signals: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a served prediction
    pub fn record_prediction(&self, latency: Duration, signal: Signal, defaulted: usize) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.features_defaulted
            .fetch_add(defaulted as u64, Ordering::Relaxed);

        if let Ok(mut signals) = self.signals.write() {
            *signals.entry(signal.label()).or_insert(0) += 1;
        }
        self.record_latency(latency);
    }

    /// Record a request that ended in an error response
    pub fn record_failure(&self, latency: Duration) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
    }

    fn record_latency(&self, latency: Duration) {
        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            // Keep only last 10000 samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get request latency statistics
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Count of successful predictions for a signal
    pub fn signal_count(&self, signal: Signal) -> u64 {
        self.signals
            .read()
            .ok()
            .and_then(|s| s.get(signal.label()).copied())
            .unwrap_or(0)
    }

    /// Successful predictions per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let total = served + failed;
        let error_rate = if total > 0 {
            (failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let latency = self.latency_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             PRICE SIGNAL SERVER - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>6.1} req/s  ║",
            served,
            self.throughput()
        );
        info!(
            "║ Failed Requests:    {:>8}  │  Error Rate: {:>6.1}%       ║",
            failed, error_rate
        );
        info!(
            "║ Defaulted Features: {:>8}                                 ║",
            self.features_defaulted.load(Ordering::Relaxed)
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}      ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Signals:                                                     ║");
        for signal in [Signal::Buy, Signal::SellHold] {
            let count = self.signal_count(signal);
            let pct = if served > 0 {
                (count as f64 / served as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:12}: {:>6} ({:>5.1}%)                              ║", signal.label(), count, pct);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that prints metric summaries
pub struct MetricsReporter {
    metrics: Arc<ServingMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServingMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
