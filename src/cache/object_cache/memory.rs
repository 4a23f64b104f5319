use crate::cache::{CacheResult, RecordStore};
use crate::errors::Result;
use crate::storage::{GeoRecord, IpKey};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// 无淘汰的内存存储，适合单实例部署把 Shared 层也放在进程内
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Arc<DashMap<String, GeoRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &IpKey) -> Result<CacheResult> {
        if let Some(value) = self.inner.get(key.to_string().as_str()) {
            Ok(CacheResult::Found(value.clone()))
        } else {
            Ok(CacheResult::Miss)
        }
    }

    async fn save(&self, key: &IpKey, record: GeoRecord) -> Result<()> {
        self.inner.insert(key.to_string(), record);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
