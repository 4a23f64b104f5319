use std::fmt;

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::{GeoRecord, IpKey};

/// 查询链中的层级，按优先级排序
///
/// 顺序固定为 Local > Shared > Authoritative，不可配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Local,
    Shared,
    Authoritative,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Local => "local",
            Tier::Shared => "shared",
            Tier::Authoritative => "authoritative",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult {
    /// 命中
    Found(GeoRecord),
    /// 干净的未命中
    Miss,
}

/// 记录存储能力（Local / Shared 两个层级共用）
///
/// - `get` 返回 `Err` 表示该层自身故障（连接断开、数据损坏），
///   调用方必须把它当作未命中处理
/// - `save` 总是整体覆盖，不做合并
/// - 实现自身负责并发安全
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &IpKey) -> Result<CacheResult>;

    async fn save(&self, key: &IpKey, record: GeoRecord) -> Result<()>;

    /// 获取实现名称（用于日志和健康检查）
    fn name(&self) -> &'static str;
}
