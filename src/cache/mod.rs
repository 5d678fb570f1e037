//! Key-value cache store and the records kept in it.

pub mod keyed_lock;
pub mod keys;
pub mod memory_store;
pub mod models;
pub mod operations;
pub mod redis_store;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;

pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use store::{CacheStore, CacheStoreExt};
