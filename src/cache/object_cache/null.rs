use async_trait::async_trait;
use tracing::trace;

use crate::cache::{CacheResult, RecordStore};
use crate::errors::Result;
use crate::storage::{GeoRecord, IpKey};

/// 禁用某一层时使用：永远未命中，写入为空操作
pub struct NullRecordStore;

impl NullRecordStore {
    pub fn new() -> Self {
        trace!("Using NullRecordStore: tier disabled");
        NullRecordStore
    }
}

impl Default for NullRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for NullRecordStore {
    async fn get(&self, key: &IpKey) -> Result<CacheResult> {
        trace!("NullRecordStore.get called for key: {}", key);
        Ok(CacheResult::Miss)
    }

    async fn save(&self, key: &IpKey, _: GeoRecord) -> Result<()> {
        trace!("NullRecordStore.save called for key: {}", key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_store_always_misses() {
        let store = NullRecordStore::new();
        let key: IpKey = "8.8.8.8".parse().unwrap();

        assert_eq!(store.get(&key).await.unwrap(), CacheResult::Miss);

        // save 应该是空操作
        store.save(&key, GeoRecord::new(&key)).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), CacheResult::Miss);
    }
}
