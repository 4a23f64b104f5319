use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::{debug, trace};

use crate::cache::{CacheResult, RecordStore};
use crate::errors::Result;
use crate::storage::{GeoRecord, IpKey};

/// 基于 moka 的进程内缓存（默认的 Local 层）
///
/// 淘汰策略由 moka 负责：容量上限 + 固定 TTL
pub struct MokaRecordStore {
    inner: Cache<String, GeoRecord>,
}

impl MokaRecordStore {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        debug!(
            "MokaRecordStore initialized with max capacity: {}, TTL: {}s",
            max_capacity, ttl_secs
        );
        Self { inner }
    }

    /// 当前条目数（近似值，moka 异步维护）
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[async_trait]
impl RecordStore for MokaRecordStore {
    async fn get(&self, key: &IpKey) -> Result<CacheResult> {
        match self.inner.get(key.to_string().as_str()).await {
            Some(record) => {
                trace!("MokaRecordStore hit: {}", key);
                Ok(CacheResult::Found(record))
            }
            None => Ok(CacheResult::Miss),
        }
    }

    async fn save(&self, key: &IpKey, record: GeoRecord) -> Result<()> {
        self.inner.insert(key.to_string(), record).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "moka"
    }
}
