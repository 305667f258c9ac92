//! Cache module for Redis-based code storage
//!
//! Provides the Redis client with connection retry logic and the
//! `CodeStore` implementation built on it.

pub mod redis_client;
pub mod redis_code_store;

pub use redis_client::RedisClient;
pub use redis_code_store::RedisCodeStore;

// Re-export commonly used types
pub use pv_shared::config::CacheConfig;
