use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量
/// - cache: 本地缓存层与共享缓存层
/// - provider: 权威 GeoIP 数据源
/// - logging: 日志配置
/// - repair: 后台回填任务
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub repair: RepairConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置，文件不存在时只使用环境变量和默认值
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    /// ENV 前缀：GL，分隔符：__
    /// 示例：GL__SERVER__PORT=9999
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 GL，分隔符 __
            .add_source(
                Environment::with_prefix("GL")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default)]
    pub unix_socket: Option<String>,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 所有路由的公共前缀，例如 "/api"
    #[serde(default)]
    pub route_prefix: String,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub local: LocalCacheConfig,
    #[serde(default)]
    pub shared: SharedCacheConfig,
}

/// 本地缓存层配置（进程内）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCacheConfig {
    #[serde(rename = "type")]
    #[serde(default = "default_local_cache_type")]
    pub cache_type: String,
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_local_ttl")]
    pub ttl: u64,
}

/// 共享缓存层配置（跨进程）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedCacheConfig {
    #[serde(rename = "type")]
    #[serde(default = "default_shared_cache_type")]
    pub cache_type: String,
    #[serde(default = "default_shared_ttl")]
    pub ttl: u64,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
    /// 单次 Redis 操作（含建立连接）的超时时间
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

/// 权威 GeoIP 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    /// 如果配置且文件可读，使用本地解析；否则使用外部 API
    #[serde(default)]
    pub maxminddb_path: Option<String>,

    /// 外部 GeoIP API URL，使用 {ip} 作为占位符
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// 外部 API 存活探测地址
    #[serde(default = "default_status_url")]
    pub status_url: String,

    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 后台回填任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// 关闭时等待回填任务完成的最长时间
    #[serde(default = "default_repair_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_local_cache_type() -> String {
    "moka".to_string()
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_local_ttl() -> u64 {
    3600
}

fn default_shared_cache_type() -> String {
    "redis".to_string()
}

fn default_shared_ttl() -> u64 {
    86400
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "geolocator:".to_string()
}

fn default_redis_timeout_ms() -> u64 {
    500
}

fn default_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as".to_string()
}

fn default_status_url() -> String {
    "http://ip-api.com/json/?fields=status".to_string()
}

fn default_provider_timeout_ms() -> u64 {
    2000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_repair_shutdown_timeout() -> u64 {
    10
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            unix_socket: None,
            cpu_count: default_cpu_count(),
            route_prefix: String::new(),
        }
    }
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_local_cache_type(),
            max_capacity: default_memory_capacity(),
            ttl: default_local_ttl(),
        }
    }
}

impl Default for SharedCacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_shared_cache_type(),
            ttl: default_shared_ttl(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            maxminddb_path: None,
            api_url: default_api_url(),
            status_url: default_status_url(),
            timeout_ms: default_provider_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: default_repair_shutdown_timeout(),
        }
    }
}
