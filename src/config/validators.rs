//! 启动配置校验
//!
//! 在服务启动前检查静态配置，返回所有发现的问题而不是遇到第一个就停止。

use std::str::FromStr;

use tracing::level_filters::LevelFilter;

use super::StaticConfig;
use crate::cache::{StoreKind, Tier};

/// 校验静态配置
///
/// 返回 `Err(问题列表)`，调用方负责输出并终止启动
pub fn validate_config(config: &StaticConfig) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if config.server.port == 0 && config.server.unix_socket.is_none() {
        problems.push("server.port must not be 0".to_string());
    }

    if !config.server.route_prefix.is_empty() && !config.server.route_prefix.starts_with('/') {
        problems.push(format!(
            "server.route_prefix '{}' must start with '/'",
            config.server.route_prefix
        ));
    }

    match config.cache.local.cache_type.parse::<StoreKind>() {
        Ok(kind) if !kind.allowed_for(Tier::Local) => {
            problems.push(format!(
                "cache.local.type: '{}' cannot be used for the local tier",
                kind
            ));
        }
        Ok(_) => {}
        Err(e) => problems.push(format!("cache.local.type: {}", e)),
    }
    if let Err(e) = config.cache.shared.cache_type.parse::<StoreKind>() {
        problems.push(format!("cache.shared.type: {}", e));
    }

    if config.cache.local.max_capacity == 0 {
        problems.push("cache.local.max_capacity must be greater than 0".to_string());
    }
    if config.cache.local.ttl == 0 {
        problems.push("cache.local.ttl must be greater than 0".to_string());
    }
    // Redis 拒绝 SET EX 0
    if config.cache.shared.ttl == 0 {
        problems.push("cache.shared.ttl must be greater than 0".to_string());
    }

    if config.provider.maxminddb_path.is_none() && !config.provider.api_url.contains("{ip}") {
        problems.push(format!(
            "provider.api_url '{}' must contain the {{ip}} placeholder",
            config.provider.api_url
        ));
    }

    if config.provider.timeout_ms == 0 {
        problems.push("provider.timeout_ms must be greater than 0".to_string());
    }

    if config.provider.retry_base_delay_ms > config.provider.retry_max_delay_ms {
        problems.push(
            "provider.retry_base_delay_ms must not exceed provider.retry_max_delay_ms".to_string(),
        );
    }

    if !matches!(config.logging.format.as_str(), "text" | "json") {
        problems.push(format!(
            "logging.format '{}' is invalid. Valid: text, json",
            config.logging.format
        ));
    }

    if !is_valid_log_level(&config.logging.level) {
        problems.push(format!(
            "logging.level '{}' is invalid. Valid: off, error, warn, info, debug, trace \
             (optionally as target=level directives)",
            config.logging.level
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// 接受单个级别或 `target=level` 形式的指令列表
fn is_valid_log_level(level: &str) -> bool {
    !level.trim().is_empty()
        && level.split(',').all(|directive| {
            let level = directive.rsplit('=').next().unwrap_or(directive);
            LevelFilter::from_str(level.trim()).is_ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&StaticConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_problems() {
        let mut config = StaticConfig::default();
        config.server.port = 0;
        config.cache.shared.cache_type = "memcached".to_string();
        config.provider.api_url = "http://example.com/lookup".to_string();
        config.logging.format = "xml".to_string();

        let problems = validate_config(&config).unwrap_err();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("memcached")));
        assert!(problems.iter().any(|p| p.contains("{ip}")));
    }

    #[test]
    fn test_redis_rejected_for_local_tier() {
        let mut config = StaticConfig::default();
        config.cache.local.cache_type = "redis".to_string();

        let problems = validate_config(&config).unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("local tier"));
    }

    #[test]
    fn test_api_url_not_checked_when_maxmind_configured() {
        let mut config = StaticConfig::default();
        config.provider.maxminddb_path = Some("/data/GeoLite2-City.mmdb".to_string());
        config.provider.api_url = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_route_prefix_must_be_absolute() {
        let mut config = StaticConfig::default();
        config.server.route_prefix = "api".to_string();
        assert!(validate_config(&config).is_err());

        config.server.route_prefix = "/api".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = StaticConfig::default();
        config.cache.local.ttl = 0;
        config.cache.shared.ttl = 0;

        let problems = validate_config(&config).unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().any(|p| p.contains("cache.local.ttl")));
        assert!(problems.iter().any(|p| p.contains("cache.shared.ttl")));
    }

    #[test]
    fn test_log_level_validated() {
        let mut config = StaticConfig::default();
        for level in ["debug", "WARN", "off", "geolocator=debug,actix_web=warn"] {
            config.logging.level = level.to_string();
            assert!(validate_config(&config).is_ok(), "{}", level);
        }

        for level in ["verbose", "", "geolocator=loud"] {
            config.logging.level = level.to_string();
            let problems = validate_config(&config).unwrap_err();
            assert!(problems[0].contains("logging.level"), "{}", level);
        }
    }
}
