//! 根据配置构造各层存储
//!
//! 两个缓存层共用同一个 `RecordStore` 抽象，具体实现按名称选择：
//! - local:  moka | memory | null
//! - shared: redis | moka | memory | null

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::cache::object_cache::{
    MemoryRecordStore, MokaRecordStore, NullRecordStore, RedisRecordStore,
};
use crate::cache::{RecordStore, Tier};
use crate::config::{LocalCacheConfig, SharedCacheConfig};
use crate::errors::{GeolocatorError, Result};

/// 存储实现类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Moka,
    Memory,
    Redis,
    Null,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Moka => "moka",
            StoreKind::Memory => "memory",
            StoreKind::Redis => "redis",
            StoreKind::Null => "null",
        }
    }

    /// 该实现能否作为指定层使用
    ///
    /// Redis 是跨进程存储，放在 Local 层没有意义
    pub fn allowed_for(&self, tier: Tier) -> bool {
        match tier {
            Tier::Local => !matches!(self, StoreKind::Redis),
            Tier::Shared => true,
            Tier::Authoritative => false,
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "moka" => Ok(StoreKind::Moka),
            "memory" => Ok(StoreKind::Memory),
            "redis" => Ok(StoreKind::Redis),
            "null" | "none" => Ok(StoreKind::Null),
            _ => Err(format!(
                "Unknown store type: '{}'. Valid: moka, memory, redis, null",
                s
            )),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct StoreFactory;

impl StoreFactory {
    /// 构造 Local 层
    pub async fn create_local(config: &LocalCacheConfig) -> Result<Arc<dyn RecordStore>> {
        let kind = Self::parse_kind(&config.cache_type, Tier::Local)?;

        let store: Arc<dyn RecordStore> = match kind {
            StoreKind::Moka => Arc::new(MokaRecordStore::new(config.max_capacity, config.ttl)),
            StoreKind::Memory => Arc::new(MemoryRecordStore::new()),
            StoreKind::Null => Arc::new(NullRecordStore::new()),
            StoreKind::Redis => unreachable!("rejected by parse_kind"),
        };

        info!("Local tier: using {} store", store.name());
        Ok(store)
    }

    /// 构造 Shared 层
    pub async fn create_shared(config: &SharedCacheConfig) -> Result<Arc<dyn RecordStore>> {
        let kind = Self::parse_kind(&config.cache_type, Tier::Shared)?;

        let store: Arc<dyn RecordStore> = match kind {
            StoreKind::Redis => Arc::new(RedisRecordStore::new(config).await?),
            StoreKind::Moka => Arc::new(MokaRecordStore::new(u64::MAX, config.ttl)),
            StoreKind::Memory => Arc::new(MemoryRecordStore::new()),
            StoreKind::Null => Arc::new(NullRecordStore::new()),
        };

        info!("Shared tier: using {} store", store.name());
        Ok(store)
    }

    fn parse_kind(name: &str, tier: Tier) -> Result<StoreKind> {
        let kind: StoreKind = name
            .parse()
            .map_err(GeolocatorError::cache_plugin_not_found)?;

        if !kind.allowed_for(tier) {
            return Err(GeolocatorError::cache_plugin_not_found(format!(
                "Store type '{}' cannot be used for the {} tier",
                kind, tier
            )));
        }

        Ok(kind)
    }
}
