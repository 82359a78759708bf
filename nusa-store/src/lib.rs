pub mod app_config;
pub mod cache;

pub use app_config::Config;
pub use cache::{cache_key, CacheError, FlightCache, MemoryCache, NoopCache, RedisCache, RedisConfig};
