//! Result-set cache keyed by a canonical request fingerprint.
//!
//! Only unfiltered aggregated flight lists are stored; filtering and
//! sorting always re-run on the way out. The key covers exactly the
//! fields that change what the aggregator would fetch — filters, sort
//! directives, and formatting do not participate.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::Serialize;
use sha2::{Digest, Sha256};

use nusa_core::{Flight, SearchRequest};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait FlightCache: Send + Sync {
    /// Looks up the unfiltered result set for this request. Any backend
    /// error reads as a miss.
    async fn get(&self, req: &SearchRequest) -> Option<Vec<Flight>>;

    /// Stores the unfiltered result set under the request fingerprint.
    async fn set(&self, req: &SearchRequest, flights: &[Flight]) -> Result<(), CacheError>;
}

#[derive(Serialize)]
struct KeySubset<'a> {
    origin: &'a str,
    destination: &'a str,
    departure_date: &'a str,
    return_date: &'a str,
    passengers: i32,
    cabin_class: &'a str,
}

/// Canonical fingerprint for a request: the identifying subset serialized
/// deterministically, hashed with SHA-256, prefixed for the keyspace.
pub fn cache_key(req: &SearchRequest) -> String {
    let subset = KeySubset {
        origin: &req.origin,
        destination: &req.destination,
        departure_date: &req.departure_date,
        return_date: req.return_date.as_deref().unwrap_or(""),
        passengers: req.passengers,
        cabin_class: &req.cabin_class,
    };

    let payload = serde_json::to_vec(&subset).expect("key subset always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&payload);
    format!("flight:{:x}", hasher.finalize())
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub ttl: Duration,
}

pub struct RedisCache {
    client: redis::Client,
    ttl: Duration,
}

impl RedisCache {
    /// Connects and verifies the backend with a ping before use.
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(format!("redis://{}:{}", config.host, config.port))?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(Self {
            client,
            ttl: config.ttl,
        })
    }
}

#[async_trait]
impl FlightCache for RedisCache {
    async fn get(&self, req: &SearchRequest) -> Option<Vec<Flight>> {
        let key = cache_key(req);
        let mut conn = self.client.get_multiplexed_async_connection().await.ok()?;
        let data: Option<Vec<u8>> = conn.get(&key).await.ok()?;
        serde_json::from_slice(&data?).ok()
    }

    async fn set(&self, req: &SearchRequest, flights: &[Flight]) -> Result<(), CacheError> {
        let key = cache_key(req);
        let data = serde_json::to_vec(flights)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(key, data, self.ttl.as_secs()).await?;
        Ok(())
    }
}

/// In-process cache with the same contract as the Redis backend. Expiry is
/// enforced on read. Used in tests and single-node development setups.
pub struct MemoryCache {
    entries: tokio::sync::RwLock<HashMap<String, MemoryEntry>>,
    ttl: Duration,
}

struct MemoryEntry {
    flights: Vec<Flight>,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: tokio::sync::RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl FlightCache for MemoryCache {
    async fn get(&self, req: &SearchRequest) -> Option<Vec<Flight>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&cache_key(req))?;
        if Instant::now() > entry.expires_at {
            return None;
        }
        Some(entry.flights.clone())
    }

    async fn set(&self, req: &SearchRequest, flights: &[Flight]) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            cache_key(req),
            MemoryEntry {
                flights: flights.to_vec(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }
}

/// Cache for environments without a backend: every lookup misses, every
/// store silently succeeds.
pub struct NoopCache;

#[async_trait]
impl FlightCache for NoopCache {
    async fn get(&self, _req: &SearchRequest) -> Option<Vec<Flight>> {
        None
    }

    async fn set(&self, _req: &SearchRequest, _flights: &[Flight]) -> Result<(), CacheError> {
        Ok(())
    }
}
