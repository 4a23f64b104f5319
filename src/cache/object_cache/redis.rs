use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::cache::{CacheResult, RecordStore};
use crate::config::SharedCacheConfig;
use crate::errors::{GeolocatorError, Result};
use crate::storage::{GeoRecord, IpKey};

/// 基于 Redis 的共享缓存层
///
/// - 值为 JSON 序列化的 `GeoRecord`
/// - 写入使用 `SET EX`，过期由 Redis 负责
/// - 连接懒建立，出错时重置，下一次调用重新连接
/// - 所有错误都向上返回，由查询链决定按未命中处理
pub struct RedisRecordStore {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
    ttl: u64,
    timeout: Duration,
}

impl RedisRecordStore {
    /// 创建 Redis 存储
    ///
    /// URL 非法时返回错误；服务暂时不可达只记录警告，不阻止启动
    pub async fn new(config: &SharedCacheConfig) -> Result<Self> {
        let redis_config = &config.redis;

        let client = redis::Client::open(redis_config.url.clone()).map_err(|e| {
            GeolocatorError::cache_connection(format!(
                "Invalid Redis URL '{}': {}",
                redis_config.url, e
            ))
        })?;

        let store = Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: redis_config.key_prefix.clone(),
            ttl: config.ttl,
            timeout: Duration::from_millis(redis_config.timeout_ms),
        };

        match store.ping().await {
            Ok(response) => debug!("Redis connection test successful: {}", response),
            Err(e) => warn!(
                "Redis at {} is not reachable yet: {}. Shared tier will be treated as a miss until it recovers",
                redis_config.url, e
            ),
        }

        debug!(
            "RedisRecordStore created with prefix: '{}', TTL: {}s",
            store.key_prefix, store.ttl
        );

        Ok(store)
    }

    /// 发送 PING，用于启动检查和健康检查
    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.get_connection().await?;
        let response: String = self
            .with_timeout("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(response)
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        // 首先尝试读取现有连接
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        // 需要建立新连接
        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self
            .with_timeout("connect", self.client.get_multiplexed_async_connection())
            .await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// 给单次 Redis 操作加上超时，超时与 Redis 错误统一转换为 CacheConnection
    async fn with_timeout<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GeolocatorError::cache_connection(format!(
                "Redis {} failed: {}",
                operation, e
            ))),
            Err(_) => Err(GeolocatorError::cache_connection(format!(
                "Redis {} timed out after {}ms",
                operation,
                self.timeout.as_millis()
            ))),
        }
    }

    fn make_key(&self, key: &IpKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn get(&self, key: &IpKey) -> Result<CacheResult> {
        let redis_key = self.make_key(key);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                self.reset_connection().await;
                return Err(e);
            }
        };

        let result: Result<Option<String>> = self.with_timeout("GET", conn.get(&redis_key)).await;

        match result {
            Ok(Some(data)) => {
                let record: GeoRecord = serde_json::from_str(&data).map_err(|e| {
                    GeolocatorError::serialization(format!(
                        "Failed to deserialize GeoRecord for key '{}': {}",
                        key, e
                    ))
                })?;
                trace!("Successfully retrieved key: {}", key);
                Ok(CacheResult::Found(record))
            }
            Ok(None) => {
                trace!("Key not found in cache: {}", key);
                Ok(CacheResult::Miss)
            }
            Err(e) => {
                // 连接可能已断开，重置连接
                self.reset_connection().await;
                Err(e)
            }
        }
    }

    async fn save(&self, key: &IpKey, record: GeoRecord) -> Result<()> {
        let redis_key = self.make_key(key);
        let serialized = serde_json::to_string(&record)?;

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                self.reset_connection().await;
                return Err(e);
            }
        };

        let result: Result<()> = self
            .with_timeout("SET", conn.set_ex(redis_key, serialized, self.ttl))
            .await;

        match result {
            Ok(()) => {
                trace!("Successfully inserted key into cache: {}", key);
                Ok(())
            }
            Err(e) => {
                self.reset_connection().await;
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
