//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 MaxMind GeoLite2-City.mmdb 文件进行 IP 地理位置查询

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoSource, HealthStatus};
use crate::errors::{GeolocatorError, Result};
use crate::storage::{GeoRecord, IpKey};

/// MaxMind GeoIP Provider
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 从文件路径创建 MaxMind Provider
    pub fn new(path: &str) -> Result<Self> {
        let reader = Reader::open_readfile(path).map_err(|e| {
            GeolocatorError::provider_config(format!(
                "Cannot open MaxMind database '{}': {}",
                path, e
            ))
        })?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup_sync(&self, key: &IpKey) -> Result<GeoRecord> {
        let ip_addr = IpAddr::V4(key.addr());

        let result = self
            .reader
            .lookup(ip_addr)
            .map_err(|e| GeolocatorError::upstream(format!("MaxMind lookup failed: {}", e)))?;

        let no_data = || GeolocatorError::upstream(format!("no data for {}", key));
        if !result.has_data() {
            return Err(no_data());
        }

        let city: maxminddb::geoip2::City = result
            .decode()
            .map_err(|e| GeolocatorError::serialization(format!("MaxMind decode failed: {}", e)))?
            .ok_or_else(no_data)?;

        let mut record = GeoRecord::new(key);
        record.country = city.country.names.english.map(|s| s.to_string());
        record.country_code = city.country.iso_code.map(String::from);
        if let Some(subdivision) = city.subdivisions.first() {
            record.region = subdivision.iso_code.map(String::from);
            record.region_name = subdivision.names.english.map(|s| s.to_string());
        }
        record.city = city.city.names.english.map(|s| s.to_string());
        record.zip = city.postal.code.map(|s| s.to_string());
        record.latitude = city.location.latitude;
        record.longitude = city.location.longitude;
        record.timezone = city.location.time_zone.map(|s| s.to_string());

        trace!(
            "MaxMind lookup for {}: country={:?}, city={:?}",
            key, record.country_code, record.city
        );

        Ok(record)
    }
}

#[async_trait]
impl GeoSource for MaxMindProvider {
    async fn fetch(&self, key: &IpKey) -> Result<GeoRecord> {
        self.lookup_sync(key)
    }

    /// 数据库在内存中，加载成功即视为可用
    async fn status(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
