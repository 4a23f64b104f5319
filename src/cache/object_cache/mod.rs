pub mod memory;
pub mod moka;
pub mod null;
pub mod redis;

pub use memory::MemoryRecordStore;
pub use moka::MokaRecordStore;
pub use null::NullRecordStore;
pub use redis::RedisRecordStore;
