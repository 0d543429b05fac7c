//! Prediction counters and latency statistics for the classifier service.

use crate::types::prediction::RiskLabel;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the prediction service
pub struct PredictionMetrics {
    /// Total requests handled (successful or not)
    pub requests_processed: AtomicU64,
    /// Requests that failed
    pub requests_failed: AtomicU64,
    /// Successful predictions by label
    predictions_by_label: RwLock<HashMap<RiskLabel, u64>>,
    /// Failures by error kind
    errors_by_kind: RwLock<HashMap<&'static str, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            predictions_by_label: RwLock::new(HashMap::new()),
            errors_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, processing_time: Duration, label: RiskLabel) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        if let Ok(mut by_label) = self.predictions_by_label.write() {
            *by_label.entry(label).or_insert(0) += 1;
        }
    }

    /// Record a failed request
    pub fn record_error(&self, processing_time: Duration, kind: &'static str) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_time(processing_time);

        if let Ok(mut by_kind) = self.errors_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    fn record_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_predictions_by_label(&self) -> HashMap<RiskLabel, u64> {
        self.predictions_by_label
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_errors_by_kind(&self) -> HashMap<&'static str, u64> {
        self.errors_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Point-in-time view for the `/metrics` endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            throughput: self.get_throughput(),
            predictions: self
                .get_predictions_by_label()
                .into_iter()
                .map(|(label, count)| (label.to_string(), count))
                .collect(),
            errors: self
                .get_errors_by_kind()
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect(),
            processing: self.get_processing_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let succeeded = snapshot.requests_processed - snapshot.requests_failed;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              DPR RISK CLASSIFIER - METRICS SUMMARY           ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests: {:>8}  │  Failed: {:>8}  │  {:>6.2} req/s    ║",
            snapshot.requests_processed, snapshot.requests_failed, snapshot.throughput
        );
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            snapshot.processing.mean_us,
            snapshot.processing.p50_us,
            snapshot.processing.p95_us,
            snapshot.processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predictions by Risk Label:                                   ║");
        for label in [RiskLabel::Low, RiskLabel::Medium, RiskLabel::High, RiskLabel::Unknown] {
            let count = snapshot.predictions.get(label.as_str()).copied().unwrap_or(0);
            let pct = if succeeded > 0 {
                (count as f64 / succeeded as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!("║   {:8}: {:>6} ({:>5.1}%) {}", label.as_str(), count, pct, bar);
        }
        if !snapshot.errors.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Errors by Kind:                                              ║");
            for (kind, count) in &snapshot.errors {
                info!("║   {:20}: {:>6}", kind, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable metrics view
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_processed: u64,
    pub requests_failed: u64,
    pub throughput: f64,
    pub predictions: HashMap<String, u64>,
    pub errors: HashMap<String, u64>,
    pub processing: ProcessingStats,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
