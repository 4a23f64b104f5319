use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::StoreFactory;
use crate::config::StaticConfig;
use crate::metrics_core::MetricsRecorder;
use crate::services::{GeoIpProvider, GeoSource, LookupChain, RepairScheduler};

pub struct StartupContext {
    pub chain: Arc<LookupChain>,
    pub repairs: Arc<RepairScheduler>,
    pub metrics: Arc<dyn MetricsRecorder>,
}

fn build_metrics() -> Arc<dyn MetricsRecorder> {
    #[cfg(feature = "metrics")]
    {
        Arc::new(crate::metrics::PrometheusMetricsWrapper)
    }
    #[cfg(not(feature = "metrics"))]
    {
        crate::metrics_core::NoopMetrics::arc()
    }
}

/// 准备服务器启动的上下文
/// 包括两个缓存层、权威数据源和查询链
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // Redis 的 TLS 连接需要进程级 crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    let metrics = build_metrics();

    let local = StoreFactory::create_local(&config.cache.local)
        .await
        .context("Failed to create local cache tier")?;
    let shared = StoreFactory::create_shared(&config.cache.shared)
        .await
        .context("Failed to create shared cache tier")?;

    let provider: Arc<dyn GeoSource> = Arc::new(GeoIpProvider::new(&config.provider));
    let repairs = Arc::new(RepairScheduler::new());

    let chain = Arc::new(LookupChain::new(
        local,
        shared,
        provider,
        repairs.clone(),
        metrics.clone(),
    ));

    info!(
        "Lookup chain ready: local={}, shared={}, authoritative={} ({:?})",
        chain.local_name(),
        chain.shared_name(),
        chain.authoritative().name(),
        start_time.elapsed()
    );

    Ok(StartupContext {
        chain,
        repairs,
        metrics,
    })
}
