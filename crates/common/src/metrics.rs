//! Metrics collection for ecowatch.
//!
//! Process-wide counters for HTTP traffic and the report workflow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug)]
pub struct Metrics {
    // === Request Metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    /// Active HTTP requests
    pub http_requests_active: AtomicU64,
    /// HTTP requests by status code category (2xx, 4xx, 5xx)
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds
    pub http_request_latency_us_total: AtomicU64,

    // === Report Workflow ===
    /// Reports created
    pub reports_created: AtomicU64,
    /// Reports removed by an administrator
    pub reports_deleted: AtomicU64,
    /// Plain upvotes recorded
    pub upvotes_recorded: AtomicU64,
    /// Verifications committed
    pub verifications_committed: AtomicU64,
    /// Verification commits that failed after the proximity gate
    pub verifications_failed: AtomicU64,
    /// Verification attempts rejected by the proximity gate
    pub proximity_rejections: AtomicU64,
    /// Community severity assessments recorded
    pub assessments_recorded: AtomicU64,
    /// Comments created
    pub comments_created: AtomicU64,

    // === Storage ===
    /// Store operations that returned an error
    pub store_errors_total: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_active: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_request_latency_us_total: AtomicU64::new(0),

            reports_created: AtomicU64::new(0),
            reports_deleted: AtomicU64::new(0),
            upvotes_recorded: AtomicU64::new(0),
            verifications_committed: AtomicU64::new(0),
            verifications_failed: AtomicU64::new(0),
            proximity_rejections: AtomicU64::new(0),
            assessments_recorded: AtomicU64::new(0),
            comments_created: AtomicU64::new(0),

            store_errors_total: AtomicU64::new(0),
        }
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        match status_code {
            200..=299 => self.http_requests_2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.http_requests_4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.http_requests_5xx.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Start tracking an active request.
    pub fn start_request(&self) {
        self.http_requests_active.fetch_add(1, Ordering::Relaxed);
    }

    /// End tracking an active request.
    pub fn end_request(&self) {
        self.http_requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_report_created(&self) {
        self.reports_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_deleted(&self) {
        self.reports_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upvote(&self) {
        self.upvotes_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a verification commit.
    pub fn record_verification(&self, success: bool) {
        if success {
            self.verifications_committed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.verifications_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_proximity_rejection(&self) {
        self.proximity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_assessment(&self) {
        self.assessments_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_comment(&self) {
        self.comments_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests_total: self.http_requests_total.load(Ordering::Relaxed),
            http_requests_active: self.http_requests_active.load(Ordering::Relaxed),
            http_requests_2xx: self.http_requests_2xx.load(Ordering::Relaxed),
            http_requests_4xx: self.http_requests_4xx.load(Ordering::Relaxed),
            http_requests_5xx: self.http_requests_5xx.load(Ordering::Relaxed),
            http_request_latency_avg_us: self.average_latency_us(),

            reports_created: self.reports_created.load(Ordering::Relaxed),
            reports_deleted: self.reports_deleted.load(Ordering::Relaxed),
            upvotes_recorded: self.upvotes_recorded.load(Ordering::Relaxed),
            verifications_committed: self.verifications_committed.load(Ordering::Relaxed),
            verifications_failed: self.verifications_failed.load(Ordering::Relaxed),
            proximity_rejections: self.proximity_rejections.load(Ordering::Relaxed),
            assessments_recorded: self.assessments_recorded.load(Ordering::Relaxed),
            comments_created: self.comments_created.load(Ordering::Relaxed),

            store_errors_total: self.store_errors_total.load(Ordering::Relaxed),
        }
    }

    /// Calculate average HTTP request latency.
    fn average_latency_us(&self) -> u64 {
        let total = self.http_request_latency_us_total.load(Ordering::Relaxed);
        let count = self.http_requests_total.load(Ordering::Relaxed);
        if count > 0 { total / count } else { 0 }
    }

    /// Export metrics in Prometheus format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        let mut metric = |name: &str, kind: &str, help: &str, value: u64| {
            output.push_str(&format!("# HELP ecowatch_{name} {help}\n"));
            output.push_str(&format!("# TYPE ecowatch_{name} {kind}\n"));
            output.push_str(&format!("ecowatch_{name} {value}\n"));
        };

        // HTTP metrics
        metric(
            "http_requests_total",
            "counter",
            "Total HTTP requests",
            snapshot.http_requests_total,
        );
        metric(
            "http_requests_active",
            "gauge",
            "Active HTTP requests",
            snapshot.http_requests_active,
        );
        metric(
            "http_request_latency_avg_us",
            "gauge",
            "Average request latency",
            snapshot.http_request_latency_avg_us,
        );

        // Workflow metrics
        metric(
            "reports_created",
            "counter",
            "Reports created",
            snapshot.reports_created,
        );
        metric(
            "reports_deleted",
            "counter",
            "Reports deleted by administrators",
            snapshot.reports_deleted,
        );
        metric(
            "upvotes_recorded",
            "counter",
            "Plain upvotes recorded",
            snapshot.upvotes_recorded,
        );
        metric(
            "verifications_committed",
            "counter",
            "Verifications committed",
            snapshot.verifications_committed,
        );
        metric(
            "verifications_failed",
            "counter",
            "Verification commits that failed",
            snapshot.verifications_failed,
        );
        metric(
            "proximity_rejections",
            "counter",
            "Verification attempts outside the proximity radius",
            snapshot.proximity_rejections,
        );
        metric(
            "assessments_recorded",
            "counter",
            "Community severity assessments",
            snapshot.assessments_recorded,
        );
        metric(
            "comments_created",
            "counter",
            "Comments created",
            snapshot.comments_created,
        );
        metric(
            "store_errors_total",
            "counter",
            "Store operations that failed",
            snapshot.store_errors_total,
        );

        output.push_str("# HELP ecowatch_http_requests_by_status HTTP requests by status\n");
        output.push_str("# TYPE ecowatch_http_requests_by_status counter\n");
        for (class, value) in [
            ("2xx", snapshot.http_requests_2xx),
            ("4xx", snapshot.http_requests_4xx),
            ("5xx", snapshot.http_requests_5xx),
        ] {
            output.push_str(&format!(
                "ecowatch_http_requests_by_status{{status=\"{class}\"}} {value}\n"
            ));
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    // HTTP
    pub http_requests_total: u64,
    pub http_requests_active: u64,
    pub http_requests_2xx: u64,
    pub http_requests_4xx: u64,
    pub http_requests_5xx: u64,
    pub http_request_latency_avg_us: u64,

    // Workflow
    pub reports_created: u64,
    pub reports_deleted: u64,
    pub upvotes_recorded: u64,
    pub verifications_committed: u64,
    pub verifications_failed: u64,
    pub proximity_rejections: u64,
    pub assessments_recorded: u64,
    pub comments_created: u64,

    // Storage
    pub store_errors_total: u64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
