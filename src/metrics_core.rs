//! Core metrics traits (always compiled, no feature gate).
//!
//! Provides `MetricsRecorder` trait and `NoopMetrics` so that all modules
//! can accept `Arc<dyn MetricsRecorder>` unconditionally.  When the
//! `metrics` feature is disabled, `NoopMetrics` is injected and the
//! compiler optimises every call to a no-op.

use std::sync::Arc;

/// Trait for recording application metrics.
///
/// All methods are no-op by default, allowing partial implementation.
/// Implementations must be thread-safe (Send + Sync).
#[allow(unused_variables)]
pub trait MetricsRecorder: Send + Sync {
    // ===== Lookup chain =====

    /// Record a hit on a tier (local, shared, authoritative)
    fn inc_tier_hit(&self, tier: &str) {}

    /// Record a clean miss on a tier
    fn inc_tier_miss(&self, tier: &str) {}

    /// Record a degraded tier read (treated as a miss)
    fn inc_tier_error(&self, tier: &str) {}

    /// Record a finished lookup by outcome (ok, invalid_key, lookup_failed)
    fn inc_lookup(&self, outcome: &str) {}

    /// Record a finished repair write by target tier and status (ok, error, skipped)
    fn inc_repair(&self, tier: &str, status: &str) {}

    /// Observe the duration of an authoritative fetch
    fn observe_authoritative_fetch(&self, status: &str, duration_secs: f64) {}

    // ===== HTTP (timing middleware) =====

    /// Increment active connections counter
    fn inc_active_connections(&self) {}

    /// Decrement active connections counter
    fn dec_active_connections(&self) {}

    /// Observe HTTP request duration
    fn observe_http_request(&self, method: &str, endpoint: &str, status: &str, duration_secs: f64) {
    }
}

/// Noop metrics implementation for testing and non-metrics builds.
///
/// All methods do nothing, allowing code to run without Prometheus dependencies.
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {}

impl NoopMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn MetricsRecorder> {
        Arc::new(Self::new())
    }
}

impl Default for NoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}
