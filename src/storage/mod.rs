//! 数据模型
//!
//! - `GeoRecord`: 地理位置记录，在各层之间整体复制
//! - `IpKey`: 已校验的 IPv4 查询键

pub mod models;

pub use models::{GeoRecord, IpKey};
