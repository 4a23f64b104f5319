//! 权威数据源抽象层
//!
//! 统一的 GeoIP 查询接口，根据配置自动选择实现：
//! 1. 检查 maxminddb_path 是否配置且文件可读
//! 2. 可读 → MaxMindProvider
//! 3. 不可读 → ExternalApiProvider

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::external_api::ExternalApiProvider;
use super::maxmind::MaxMindProvider;
use crate::config::ProviderConfig;
use crate::errors::Result;
use crate::storage::{GeoRecord, IpKey};

/// 数据源存活状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => f.write_str("healthy"),
            HealthStatus::Unhealthy => f.write_str("unhealthy"),
        }
    }
}

/// 权威数据源能力
///
/// - `fetch` 的任何错误对本次查询都是终态
/// - `status` 只给健康检查使用，查询路径上不调用
#[async_trait]
pub trait GeoSource: Send + Sync {
    async fn fetch(&self, key: &IpKey) -> Result<GeoRecord>;

    async fn status(&self) -> HealthStatus;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 统一 GeoIP Provider
///
/// 启动时根据配置自动选择实现
#[derive(Clone)]
pub struct GeoIpProvider {
    inner: Arc<dyn GeoSource>,
}

impl GeoIpProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let inner: Arc<dyn GeoSource> = if let Some(ref path) = config.maxminddb_path {
            match MaxMindProvider::new(path) {
                Ok(provider) => {
                    info!("GeoIP: Using MaxMind database at {}", path);
                    Arc::new(provider)
                }
                Err(e) => {
                    warn!(
                        "GeoIP: Failed to load MaxMind database at {}: {}, falling back to external API",
                        path, e
                    );
                    Arc::new(ExternalApiProvider::new(config))
                }
            }
        } else {
            debug!("GeoIP: No MaxMind database configured, using external API");
            Arc::new(ExternalApiProvider::new(config))
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Self { inner }
    }
}

#[async_trait]
impl GeoSource for GeoIpProvider {
    async fn fetch(&self, key: &IpKey) -> Result<GeoRecord> {
        self.inner.fetch(key).await
    }

    async fn status(&self) -> HealthStatus {
        self.inner.status().await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
