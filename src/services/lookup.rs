//! 分层查询链
//!
//! 对单个 IP 按 Local → Shared → Authoritative 顺序查询，返回第一个命中的记录，
//! 并在后台把记录回填到未命中的更快层级。回填不阻塞调用方，失败只记录日志和指标。

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, trace, warn};

use crate::cache::{CacheResult, RecordStore, Tier};
use crate::errors::GeolocatorError;
use crate::metrics_core::MetricsRecorder;
use crate::services::geoip::GeoSource;
use crate::services::repair::RepairScheduler;
use crate::storage::{GeoRecord, IpKey};

/// 调用方可见的查询错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// 输入不是合法的 IPv4 地址，任何层级都未被访问
    InvalidKey(String),
    /// 所有缓存层未命中且权威数据源失败
    LookupFailed(String),
}

impl LookupError {
    pub fn message(&self) -> &str {
        match self {
            LookupError::InvalidKey(msg) | LookupError::LookupFailed(msg) => msg,
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidKey(msg) => write!(f, "invalid key: {}", msg),
            LookupError::LookupFailed(msg) => write!(f, "lookup failed: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {}

impl From<LookupError> for GeolocatorError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::InvalidKey(msg) => GeolocatorError::InvalidKey(msg),
            LookupError::LookupFailed(msg) => GeolocatorError::LookupFailed(msg),
        }
    }
}

pub struct LookupChain {
    local: Arc<dyn RecordStore>,
    shared: Arc<dyn RecordStore>,
    authoritative: Arc<dyn GeoSource>,
    repairs: Arc<RepairScheduler>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl LookupChain {
    pub fn new(
        local: Arc<dyn RecordStore>,
        shared: Arc<dyn RecordStore>,
        authoritative: Arc<dyn GeoSource>,
        repairs: Arc<RepairScheduler>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            local,
            shared,
            authoritative,
            repairs,
            metrics,
        }
    }

    /// 查询单个 IP 的地理位置
    pub async fn lookup(&self, raw_key: &str) -> Result<GeoRecord, LookupError> {
        let key: IpKey = match raw_key.parse() {
            Ok(key) => key,
            Err(e) => {
                debug!("Rejected lookup key {:?}: {}", raw_key, e);
                self.metrics.inc_lookup("invalid_key");
                return Err(LookupError::InvalidKey(e.message().to_string()));
            }
        };

        if let Some(record) = self.query_tier(Tier::Local, &self.local, &key).await {
            self.schedule_ensure_shared(key, record.clone());
            self.metrics.inc_lookup("ok");
            return Ok(record);
        }

        if let Some(record) = self.query_tier(Tier::Shared, &self.shared, &key).await {
            self.schedule_save(Tier::Local, self.local.clone(), key, record.clone());
            self.metrics.inc_lookup("ok");
            return Ok(record);
        }

        let started = Instant::now();
        match self.authoritative.fetch(&key).await {
            Ok(record) => {
                self.metrics
                    .observe_authoritative_fetch("ok", started.elapsed().as_secs_f64());
                self.metrics.inc_tier_hit(Tier::Authoritative.as_str());
                debug!(
                    "Authoritative source {} answered for {}",
                    self.authoritative.name(),
                    key
                );

                self.schedule_save(Tier::Local, self.local.clone(), key, record.clone());
                self.schedule_save(Tier::Shared, self.shared.clone(), key, record.clone());
                self.metrics.inc_lookup("ok");
                Ok(record)
            }
            Err(e) => {
                self.metrics
                    .observe_authoritative_fetch("error", started.elapsed().as_secs_f64());
                self.metrics.inc_tier_error(Tier::Authoritative.as_str());
                warn!(
                    "Authoritative source {} failed for {}: {}",
                    self.authoritative.name(),
                    key,
                    e
                );
                self.metrics.inc_lookup("lookup_failed");
                Err(LookupError::LookupFailed(e.message().to_string()))
            }
        }
    }

    /// 查询单个缓存层；层级故障按未命中处理
    async fn query_tier(
        &self,
        tier: Tier,
        store: &Arc<dyn RecordStore>,
        key: &IpKey,
    ) -> Option<GeoRecord> {
        match store.get(key).await {
            Ok(CacheResult::Found(record)) => {
                trace!("{} tier hit for {}", tier, key);
                self.metrics.inc_tier_hit(tier.as_str());
                Some(record)
            }
            Ok(CacheResult::Miss) => {
                trace!("{} tier miss for {}", tier, key);
                self.metrics.inc_tier_miss(tier.as_str());
                None
            }
            Err(e) => {
                let err = GeolocatorError::tier_unavailable(format!(
                    "{} tier ({}) read failed for {}: {}",
                    tier,
                    store.name(),
                    key,
                    e
                ));
                warn!("{}, treating as miss", err);
                self.metrics.inc_tier_error(tier.as_str());
                None
            }
        }
    }

    /// 后台写入指定层级
    fn schedule_save(
        &self,
        tier: Tier,
        store: Arc<dyn RecordStore>,
        key: IpKey,
        record: GeoRecord,
    ) {
        let metrics = self.metrics.clone();
        self.repairs.spawn(async move {
            save_into(tier, store.as_ref(), metrics.as_ref(), &key, record).await;
        });
    }

    /// Local 命中后，后台确认 Shared 层也有这条记录
    fn schedule_ensure_shared(&self, key: IpKey, record: GeoRecord) {
        let shared = self.shared.clone();
        let metrics = self.metrics.clone();
        self.repairs.spawn(async move {
            match shared.get(&key).await {
                Ok(CacheResult::Found(_)) => {
                    trace!("Shared tier already holds {}", key);
                    metrics.inc_repair(Tier::Shared.as_str(), "skipped");
                }
                Ok(CacheResult::Miss) => {
                    save_into(Tier::Shared, shared.as_ref(), metrics.as_ref(), &key, record).await;
                }
                Err(e) => {
                    debug!("Shared tier check for {} failed ({}), writing anyway", key, e);
                    save_into(Tier::Shared, shared.as_ref(), metrics.as_ref(), &key, record).await;
                }
            }
        });
    }

    /// Local 层实现名称
    pub fn local_name(&self) -> &'static str {
        self.local.name()
    }

    /// Shared 层实现名称
    pub fn shared_name(&self) -> &'static str {
        self.shared.name()
    }

    pub fn authoritative(&self) -> &Arc<dyn GeoSource> {
        &self.authoritative
    }

    pub fn repairs(&self) -> &Arc<RepairScheduler> {
        &self.repairs
    }
}

async fn save_into(
    tier: Tier,
    store: &dyn RecordStore,
    metrics: &dyn MetricsRecorder,
    key: &IpKey,
    record: GeoRecord,
) {
    match store.save(key, record).await {
        Ok(()) => {
            trace!("Repaired {} tier with {}", tier, key);
            metrics.inc_repair(tier.as_str(), "ok");
        }
        Err(e) => {
            let err = GeolocatorError::repair_failed(format!(
                "writing {} into {} tier ({}) failed: {}",
                key,
                tier,
                store.name(),
                e
            ));
            error!("{}", err);
            metrics.inc_repair(tier.as_str(), "error");
        }
    }
}
