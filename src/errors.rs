use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeolocatorError {
    InvalidKey(String),
    TierUnavailable(String),
    LookupFailed(String),
    RepairFailed(String),
    CacheConnection(String),
    CachePluginNotFound(String),
    ProviderConfig(String),
    Upstream(String),
    Serialization(String),
    FileOperation(String),
}

impl GeolocatorError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeolocatorError::InvalidKey(_) => "E001",
            GeolocatorError::TierUnavailable(_) => "E002",
            GeolocatorError::LookupFailed(_) => "E003",
            GeolocatorError::RepairFailed(_) => "E004",
            GeolocatorError::CacheConnection(_) => "E005",
            GeolocatorError::CachePluginNotFound(_) => "E006",
            GeolocatorError::ProviderConfig(_) => "E007",
            GeolocatorError::Upstream(_) => "E008",
            GeolocatorError::Serialization(_) => "E009",
            GeolocatorError::FileOperation(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeolocatorError::InvalidKey(_) => "Invalid Key",
            GeolocatorError::TierUnavailable(_) => "Tier Unavailable",
            GeolocatorError::LookupFailed(_) => "Lookup Failed",
            GeolocatorError::RepairFailed(_) => "Repair Failed",
            GeolocatorError::CacheConnection(_) => "Cache Connection Error",
            GeolocatorError::CachePluginNotFound(_) => "Cache Plugin Not Found",
            GeolocatorError::ProviderConfig(_) => "Provider Configuration Error",
            GeolocatorError::Upstream(_) => "Upstream Error",
            GeolocatorError::Serialization(_) => "Serialization Error",
            GeolocatorError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeolocatorError::InvalidKey(msg)
            | GeolocatorError::TierUnavailable(msg)
            | GeolocatorError::LookupFailed(msg)
            | GeolocatorError::RepairFailed(msg)
            | GeolocatorError::CacheConnection(msg)
            | GeolocatorError::CachePluginNotFound(msg)
            | GeolocatorError::ProviderConfig(msg)
            | GeolocatorError::Upstream(msg)
            | GeolocatorError::Serialization(msg)
            | GeolocatorError::FileOperation(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 启动阶段）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeolocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeolocatorError {}

// 便捷的构造函数
impl GeolocatorError {
    pub fn invalid_key<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::InvalidKey(msg.into())
    }

    pub fn tier_unavailable<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::TierUnavailable(msg.into())
    }

    pub fn lookup_failed<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::LookupFailed(msg.into())
    }

    pub fn repair_failed<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::RepairFailed(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::CacheConnection(msg.into())
    }

    pub fn cache_plugin_not_found<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::CachePluginNotFound(msg.into())
    }

    pub fn provider_config<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::ProviderConfig(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::Upstream(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        GeolocatorError::FileOperation(msg.into())
    }
}

impl From<std::io::Error> for GeolocatorError {
    fn from(err: std::io::Error) -> Self {
        GeolocatorError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GeolocatorError {
    fn from(err: serde_json::Error) -> Self {
        GeolocatorError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for GeolocatorError {
    fn from(err: redis::RedisError) -> Self {
        GeolocatorError::CacheConnection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeolocatorError>;
