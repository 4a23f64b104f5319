use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use super::error_code::ErrorCode;
use super::types::{
    ApiResponse, HealthAuthoritativeCheck, HealthChecks, HealthResponse, HealthTiers,
};
use crate::services::{HealthStatus, LookupChain};
use crate::utils::TimeParser;

#[cfg(feature = "metrics")]
use super::metrics::MetricsService;

/// 权威数据源探测的最长等待时间
const STATUS_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

/// Health Service
///
/// 只探测权威数据源的存活状态；缓存层故障按未命中处理，不影响可用性，
/// 因此这里只报告各层使用的实现
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        chain: web::Data<Arc<LookupChain>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let source = chain.authoritative();
        let authoritative =
            match tokio::time::timeout(STATUS_CHECK_TIMEOUT, source.status()).await {
                Ok(HealthStatus::Healthy) => {
                    trace!("Authoritative source {} is healthy", source.name());
                    HealthAuthoritativeCheck {
                        status: HealthStatus::Healthy.to_string(),
                        provider: source.name().to_string(),
                        error: None,
                    }
                }
                Ok(HealthStatus::Unhealthy) => {
                    error!("Authoritative source {} is unhealthy", source.name());
                    HealthAuthoritativeCheck {
                        status: HealthStatus::Unhealthy.to_string(),
                        provider: source.name().to_string(),
                        error: Some("status check failed".to_string()),
                    }
                }
                Err(_) => {
                    error!("Authoritative source health check timeout");
                    HealthAuthoritativeCheck {
                        status: HealthStatus::Unhealthy.to_string(),
                        provider: source.name().to_string(),
                        error: Some("timeout".to_string()),
                    }
                }
            };

        let now = chrono::Utc::now();

        // 使用 TimeParser 的方法格式化运行时间
        let uptime_human = TimeParser::format_duration_human(app_start_time.start_datetime, now);

        // 计算运行秒数
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u32;

        let is_healthy = authoritative.error.is_none();

        let health_data = HealthResponse {
            status: if is_healthy {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
            timestamp: now.to_rfc3339(),
            uptime: uptime_seconds,
            checks: HealthChecks {
                authoritative,
                tiers: HealthTiers {
                    local: chain.local_name().to_string(),
                    shared: chain.shared_name().to_string(),
                },
            },
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        let health_response = ApiResponse {
            code: if is_healthy {
                ErrorCode::Success as i32
            } else {
                ErrorCode::ServiceUnavailable as i32
            },
            message: if is_healthy {
                "OK".to_string()
            } else {
                "Service Unavailable".to_string()
            },
            data: Some(health_data),
        };

        let response_status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        info!(
            "Health check completed in {:?}, status: {}, uptime: {}",
            start_time.elapsed(),
            if is_healthy { "healthy" } else { "unhealthy" },
            uptime_human
        );

        HttpResponse::build(response_status)
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(health_response)
    }

    // 简单的就绪检查，只返回 200 状态码
    pub async fn readiness_check() -> impl Responder {
        trace!("Received readiness check request");

        HttpResponse::Ok()
            .append_header(("Content-Type", "text/plain"))
            .body("OK")
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    let scope = web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check));

    #[cfg(feature = "metrics")]
    let scope = scope.route("/metrics", web::get().to(MetricsService::metrics));

    scope
}
