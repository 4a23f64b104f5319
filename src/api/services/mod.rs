pub mod error_code;
pub mod geoip;
pub mod health;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod types;

pub use error_code::ErrorCode;
pub use geoip::{GeoIpService, geoip_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use types::{ApiResponse, ErrorResponse};
