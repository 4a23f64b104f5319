//! 外部 GeoIP API 实现
//!
//! 使用外部 HTTP API 进行 IP 地理位置查询（默认 ip-api.com）
//! 传输错误、超时、429 与 5xx 会按退避策略重试

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoSource, HealthStatus};
use super::retry::{RetryConfig, with_retry};
use crate::config::ProviderConfig;
use crate::errors::{GeolocatorError, Result};
use crate::storage::{GeoRecord, IpKey};
use crate::utils::ip::is_private_or_local;

/// 单次 HTTP 尝试的失败原因
#[derive(Debug)]
enum FetchError {
    /// 连接失败、超时等
    Transport(String),
    /// 非 2xx 响应
    Status(u16),
    /// 响应体无法解析
    Payload(String),
    /// 上游明确拒绝（`"status": "fail"`）
    Rejected(String),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::Payload(_) | FetchError::Rejected(_) => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "request failed: {}", msg),
            FetchError::Status(code) => write!(f, "upstream returned HTTP {}", code),
            FetchError::Payload(msg) => write!(f, "malformed response: {}", msg),
            FetchError::Rejected(msg) => write!(f, "upstream rejected lookup: {}", msg),
        }
    }
}

impl From<FetchError> for GeolocatorError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Payload(_) => GeolocatorError::serialization(err.to_string()),
            _ => GeolocatorError::upstream(err.to_string()),
        }
    }
}

/// 外部 API GeoIP Provider
///
/// `ureq` 是同步客户端，每次请求都放到 `spawn_blocking` 中执行
pub struct ExternalApiProvider {
    agent: Agent,
    api_url_template: String,
    status_url: String,
    retry: RetryConfig,
}

impl ExternalApiProvider {
    /// 创建外部 API Provider
    ///
    /// `api_url` 使用 `{ip}` 作为占位符
    /// 例如: `http://ip-api.com/json/{ip}?fields=status,countryCode,city`
    pub fn new(config: &ProviderConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_url_template: config.api_url.clone(),
            status_url: config.status_url.clone(),
            retry: RetryConfig::from(config),
        }
    }

    fn build_url(&self, key: &IpKey) -> String {
        self.api_url_template.replace("{ip}", &key.to_string())
    }

    /// 发起一次 GET 并解析 JSON（同步，在 spawn_blocking 中调用）
    fn get_json_sync(agent: &Agent, url: &str) -> std::result::Result<Value, FetchError> {
        let resp = agent
            .get(url)
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.into_body()
            .read_json::<Value>()
            .map_err(|e| FetchError::Payload(e.to_string()))
    }

    /// 异步包装：单次尝试
    async fn get_json(&self, url: String) -> std::result::Result<Value, FetchError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::get_json_sync(&agent, &url))
            .await
            .unwrap_or_else(|e| Err(FetchError::Transport(format!("blocking task failed: {}", e))))
    }

    /// 将 ip-api.com 格式的响应转换为 GeoRecord
    ///
    /// 成功: `{"status":"success","country":"United States","countryCode":"US",...}`
    /// 失败: `{"status":"fail","message":"private range"}`
    fn parse_record(key: &IpKey, json: &Value) -> std::result::Result<GeoRecord, FetchError> {
        if !json.is_object() {
            return Err(FetchError::Payload("expected a JSON object".to_string()));
        }

        if json["status"].as_str() == Some("fail") {
            let reason = json["message"].as_str().unwrap_or("unknown reason");
            return Err(FetchError::Rejected(reason.to_string()));
        }

        let text = |field: &str| json[field].as_str().map(String::from);

        let mut record = GeoRecord::new(key);
        record.country = text("country");
        record.country_code = text("countryCode").or_else(|| text("country_code"));
        record.region = text("region");
        record.region_name = text("regionName");
        record.city = text("city");
        record.zip = text("zip");
        record.latitude = json["lat"].as_f64();
        record.longitude = json["lon"].as_f64();
        record.timezone = text("timezone");
        record.isp = text("isp");
        record.org = text("org");
        record.asn = text("as");

        trace!(
            "External API lookup for {}: country={:?}, city={:?}",
            key, record.country_code, record.city
        );

        Ok(record)
    }
}

#[async_trait]
impl GeoSource for ExternalApiProvider {
    async fn fetch(&self, key: &IpKey) -> Result<GeoRecord> {
        // 上游不会为保留地址返回数据，直接拒绝，省一次 HTTP
        if is_private_or_local(&IpAddr::V4(key.addr())) {
            return Err(GeolocatorError::upstream(format!(
                "{} is a private or reserved address",
                key
            )));
        }

        let url = self.build_url(key);
        let json = with_retry(
            "geoip_api_fetch",
            self.retry,
            FetchError::is_retryable,
            || self.get_json(url.clone()),
        )
        .await?;

        Ok(Self::parse_record(key, &json)?)
    }

    async fn status(&self) -> HealthStatus {
        match self.get_json(self.status_url.clone()).await {
            Ok(_) => HealthStatus::Healthy,
            // 能连通但响应不是 JSON 也算存活
            Err(FetchError::Payload(_)) => HealthStatus::Healthy,
            Err(e) => {
                warn!("GeoIP API status check failed: {}", e);
                HealthStatus::Unhealthy
            }
        }
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
