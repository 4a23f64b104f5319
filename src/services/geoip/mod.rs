//! GeoIP 权威数据源模块
//!
//! 提供 IP 地址地理位置查询功能，支持：
//! - MaxMind GeoLite2 本地数据库
//! - 外部 API (ip-api.com)，带重试

mod external_api;
mod maxmind;
mod provider;
mod retry;

pub use external_api::ExternalApiProvider;
pub use maxmind::MaxMindProvider;
pub use provider::{GeoIpProvider, GeoSource, HealthStatus};
pub use retry::{RetryConfig, with_retry};
