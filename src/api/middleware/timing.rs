//! HTTP timing middleware
//!
//! Records HTTP request duration, request count, and active connections
//! through the injected `MetricsRecorder`.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics_core::MetricsRecorder;

/// Drop guard that decrements active connections when dropped.
/// Ensures `dec()` runs even if the future panics.
struct ActiveConnectionGuard(Arc<dyn MetricsRecorder>);

impl Drop for ActiveConnectionGuard {
    fn drop(&mut self) {
        self.0.dec_active_connections();
    }
}

/// HTTP timing middleware factory
#[derive(Clone)]
pub struct TimingMiddleware {
    metrics: Arc<dyn MetricsRecorder>,
    route_prefix: Rc<str>,
}

impl TimingMiddleware {
    pub fn new(metrics: Arc<dyn MetricsRecorder>, route_prefix: &str) -> Self {
        Self {
            metrics,
            route_prefix: Rc::from(route_prefix.trim_end_matches('/')),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TimingService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
            route_prefix: self.route_prefix.clone(),
        }))
    }
}

pub struct TimingService<S> {
    service: Rc<S>,
    metrics: Arc<dyn MetricsRecorder>,
    route_prefix: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for TimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let metrics = self.metrics.clone();
        let start = Instant::now();

        // Extract method and endpoint for labels (avoid String allocation)
        let method = method_str(req.method());
        let endpoint = classify_endpoint(&self.route_prefix, req.path());

        Box::pin(async move {
            // Guard ensures dec() runs even on panic
            metrics.inc_active_connections();
            let _guard = ActiveConnectionGuard(metrics.clone());

            let result = srv.call(req).await;

            let status = match &result {
                Ok(response) => status_str(response.status()),
                Err(_) => "500",
            };
            metrics.observe_http_request(method, endpoint, status, start.elapsed().as_secs_f64());

            result
        })
    }
}

/// Map HTTP method to a static string (avoids allocation).
fn method_str(method: &actix_web::http::Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

/// Map HTTP status code to a static string (avoids allocation for common codes).
fn status_str(status: actix_web::http::StatusCode) -> &'static str {
    match status.as_u16() {
        200 => "200",
        204 => "204",
        400 => "400",
        404 => "404",
        405 => "405",
        500 => "500",
        503 => "503",
        _ => "other",
    }
}

/// Classify request path into endpoint category
///
/// This prevents label cardinality explosion: every IP would otherwise be its own label.
fn classify_endpoint(route_prefix: &str, path: &str) -> &'static str {
    let path = path.strip_prefix(route_prefix).unwrap_or(path);
    if path.starts_with("/geoip/") {
        "geoip"
    } else if path.starts_with("/health") {
        "health"
    } else {
        "other"
    }
}
