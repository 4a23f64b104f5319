//! Global metrics registry
//!
//! Defines all Prometheus metrics used in the application.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::metrics_core::MetricsRecorder;

/// Global metrics instance
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Application metrics container
pub struct Metrics {
    /// Internal Prometheus registry
    registry: Registry,

    // ===== Lookup chain metrics =====
    /// Tier hits by tier (local, shared, authoritative)
    pub tier_hits_total: CounterVec,
    /// Tier clean misses by tier
    pub tier_misses_total: CounterVec,
    /// Degraded tier reads by tier
    pub tier_errors_total: CounterVec,
    /// Finished lookups by outcome
    pub lookups_total: CounterVec,
    /// Repair writes by target tier and status
    pub repairs_total: CounterVec,
    /// Authoritative fetch latency by status
    pub authoritative_fetch_duration_seconds: HistogramVec,

    // ===== HTTP metrics =====
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_active_connections: Gauge,

    // ===== System metrics =====
    /// Server uptime in seconds
    pub uptime_seconds: Gauge,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let tier_hits_total = CounterVec::new(
            Opts::new("geolocator_tier_hits_total", "Total hits by tier"),
            &["tier"],
        )
        .expect("Failed to create tier_hits_total metric");

        let tier_misses_total = CounterVec::new(
            Opts::new("geolocator_tier_misses_total", "Total misses by tier"),
            &["tier"],
        )
        .expect("Failed to create tier_misses_total metric");

        let tier_errors_total = CounterVec::new(
            Opts::new(
                "geolocator_tier_errors_total",
                "Total degraded tier reads treated as misses",
            ),
            &["tier"],
        )
        .expect("Failed to create tier_errors_total metric");

        let lookups_total = CounterVec::new(
            Opts::new("geolocator_lookups_total", "Total lookups by outcome"),
            &["outcome"],
        )
        .expect("Failed to create lookups_total metric");

        let repairs_total = CounterVec::new(
            Opts::new(
                "geolocator_repairs_total",
                "Total background repair writes by tier and status",
            ),
            &["tier", "status"],
        )
        .expect("Failed to create repairs_total metric");

        let authoritative_fetch_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "geolocator_authoritative_fetch_duration_seconds",
                "Authoritative source fetch latency",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["status"],
        )
        .expect("Failed to create authoritative_fetch_duration_seconds metric");

        let http_requests_total = CounterVec::new(
            Opts::new("geolocator_http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "geolocator_http_request_duration_seconds",
                "HTTP request latency",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["method", "endpoint", "status"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let http_active_connections = Gauge::new(
            "geolocator_http_active_connections",
            "Currently active HTTP connections",
        )
        .expect("Failed to create http_active_connections metric");

        let uptime_seconds = Gauge::new("geolocator_uptime_seconds", "Server uptime in seconds")
            .expect("Failed to create uptime_seconds metric");

        registry
            .register(Box::new(tier_hits_total.clone()))
            .expect("Failed to register tier_hits_total");
        registry
            .register(Box::new(tier_misses_total.clone()))
            .expect("Failed to register tier_misses_total");
        registry
            .register(Box::new(tier_errors_total.clone()))
            .expect("Failed to register tier_errors_total");
        registry
            .register(Box::new(lookups_total.clone()))
            .expect("Failed to register lookups_total");
        registry
            .register(Box::new(repairs_total.clone()))
            .expect("Failed to register repairs_total");
        registry
            .register(Box::new(authoritative_fetch_duration_seconds.clone()))
            .expect("Failed to register authoritative_fetch_duration_seconds");
        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds");
        registry
            .register(Box::new(http_active_connections.clone()))
            .expect("Failed to register http_active_connections");
        registry
            .register(Box::new(uptime_seconds.clone()))
            .expect("Failed to register uptime_seconds");

        Self {
            registry,
            tier_hits_total,
            tier_misses_total,
            tier_errors_total,
            lookups_total,
            repairs_total,
            authoritative_fetch_duration_seconds,
            http_requests_total,
            http_request_duration_seconds,
            http_active_connections,
            uptime_seconds,
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl MetricsRecorder for Metrics {
    fn inc_tier_hit(&self, tier: &str) {
        self.tier_hits_total.with_label_values(&[tier]).inc();
    }

    fn inc_tier_miss(&self, tier: &str) {
        self.tier_misses_total.with_label_values(&[tier]).inc();
    }

    fn inc_tier_error(&self, tier: &str) {
        self.tier_errors_total.with_label_values(&[tier]).inc();
    }

    fn inc_lookup(&self, outcome: &str) {
        self.lookups_total.with_label_values(&[outcome]).inc();
    }

    fn inc_repair(&self, tier: &str, status: &str) {
        self.repairs_total.with_label_values(&[tier, status]).inc();
    }

    fn observe_authoritative_fetch(&self, status: &str, duration_secs: f64) {
        self.authoritative_fetch_duration_seconds
            .with_label_values(&[status])
            .observe(duration_secs);
    }

    fn inc_active_connections(&self) {
        self.http_active_connections.inc();
    }

    fn dec_active_connections(&self) {
        self.http_active_connections.dec();
    }

    fn observe_http_request(&self, method: &str, endpoint: &str, status: &str, duration_secs: f64) {
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint, status])
            .observe(duration_secs);
        self.http_requests_total
            .with_label_values(&[method, endpoint, status])
            .inc();
    }
}

/// Wrapper that delegates to the global METRICS singleton.
///
/// This allows the global `Lazy<Metrics>` to be used with `Arc<dyn MetricsRecorder>`
/// since `Lazy<T>` doesn't implement `Clone`.
pub struct PrometheusMetricsWrapper;

impl MetricsRecorder for PrometheusMetricsWrapper {
    fn inc_tier_hit(&self, tier: &str) {
        METRICS.inc_tier_hit(tier);
    }

    fn inc_tier_miss(&self, tier: &str) {
        METRICS.inc_tier_miss(tier);
    }

    fn inc_tier_error(&self, tier: &str) {
        METRICS.inc_tier_error(tier);
    }

    fn inc_lookup(&self, outcome: &str) {
        METRICS.inc_lookup(outcome);
    }

    fn inc_repair(&self, tier: &str, status: &str) {
        METRICS.inc_repair(tier, status);
    }

    fn observe_authoritative_fetch(&self, status: &str, duration_secs: f64) {
        METRICS.observe_authoritative_fetch(status, duration_secs);
    }

    fn inc_active_connections(&self) {
        METRICS.inc_active_connections();
    }

    fn dec_active_connections(&self) {
        METRICS.dec_active_connections();
    }

    fn observe_http_request(&self, method: &str, endpoint: &str, status: &str, duration_secs: f64) {
        METRICS.observe_http_request(method, endpoint, status, duration_secs);
    }
}
