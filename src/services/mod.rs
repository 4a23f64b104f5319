//! Service layer
//!
//! - `geoip`: authoritative sources (external API, MaxMind)
//! - `lookup`: the tiered lookup chain
//! - `repair`: background tier repopulation

pub mod geoip;
pub mod lookup;
pub mod repair;

pub use geoip::{GeoIpProvider, GeoSource, HealthStatus};
pub use lookup::{LookupChain, LookupError};
pub use repair::RepairScheduler;
