//! IP 地址处理工具
//!
//! - IPv4 查询键校验（严格点分十进制）
//! - 私有/保留地址判断

use std::net::{IpAddr, Ipv4Addr};

use crate::errors::{GeolocatorError, Result};

/// 校验并解析 IPv4 查询键
///
/// 只接受四段 0-255 的点分十进制地址，拒绝 IPv6、主机名、空串以及
/// 带前导零的八位组（`Ipv4Addr` 的解析本身就是严格的）。
pub fn parse_ipv4_key(raw: &str) -> Result<Ipv4Addr> {
    if raw.is_empty() {
        return Err(GeolocatorError::invalid_key("empty IP address"));
    }

    raw.parse::<Ipv4Addr>().map_err(|_| {
        GeolocatorError::invalid_key(format!("'{}' is not a valid IPv4 address", raw))
    })
}

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // 100.64.0.0/10 (CGNAT, RFC 6598)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            // - fc00::/7 (ULA, RFC 4193)
            // - fe80::/10 (Link-local)
            // - ::1 (Loopback)
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
