use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::GeolocatorError;

/// IP 地理位置记录
///
/// 由权威数据源创建后不再修改，缓存层只做整体覆盖
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
}

impl GeoRecord {
    /// 创建只有 IP 的空记录，其余字段由 provider 填充
    pub fn new(key: &IpKey) -> Self {
        Self {
            ip: key.to_string(),
            country: None,
            country_code: None,
            region: None,
            region_name: None,
            city: None,
            zip: None,
            latitude: None,
            longitude: None,
            timezone: None,
            isp: None,
            org: None,
            asn: None,
        }
    }
}

/// 已校验的 IPv4 查询键
///
/// 只能通过 `FromStr` 构造，保证进入查询链的 key 都是合法的点分十进制地址。
/// `Display` 输出规范化形式，用作各缓存层的存储 key。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpKey(Ipv4Addr);

impl IpKey {
    pub fn addr(&self) -> Ipv4Addr {
        self.0
    }
}

impl FromStr for IpKey {
    type Err = GeolocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::utils::ip::parse_ipv4_key(s).map(IpKey)
    }
}

impl From<Ipv4Addr> for IpKey {
    fn from(addr: Ipv4Addr) -> Self {
        IpKey(addr)
    }
}

impl fmt::Display for IpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
