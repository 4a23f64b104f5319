pub mod factory;
pub mod object_cache;
pub mod traits;

pub use factory::{StoreFactory, StoreKind};
pub use object_cache::{MemoryRecordStore, MokaRecordStore, NullRecordStore, RedisRecordStore};
pub use traits::{CacheResult, RecordStore, Tier};
