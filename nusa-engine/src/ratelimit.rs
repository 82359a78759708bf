//! Per-provider token buckets gating outbound provider calls.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tokio::time::{sleep_until, Instant};

use nusa_provider::ProviderError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            burst_size: 20,
        }
    }
}

/// Maps provider names to token buckets. Buckets are created lazily with
/// the default quota; names configured via [`set_provider_limit`]
/// keep their own quota. Reads take the shared lock, writes the exclusive
/// one; the buckets themselves are internally thread-safe.
///
/// [`set_provider_limit`]: ProviderLimiter::set_provider_limit
pub struct ProviderLimiter {
    buckets: RwLock<HashMap<String, Arc<DirectRateLimiter>>>,
    defaults: RateLimitConfig,
}

impl ProviderLimiter {
    pub fn new(defaults: RateLimitConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            defaults,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    /// Installs an explicit quota for one provider, replacing whatever
    /// bucket it may already have.
    pub fn set_provider_limit(&self, provider: &str, requests_per_second: f64, burst_size: u32) {
        let bucket = build_bucket(RateLimitConfig {
            requests_per_second,
            burst_size,
        });
        let mut buckets = self.buckets.write().expect("rate limiter map lock");
        buckets.insert(provider.to_string(), bucket);
    }

    /// Acquires one token for the named provider, or fails with a deadline
    /// error if the token does not free up in time.
    pub async fn wait(&self, deadline: Instant, provider: &str) -> Result<(), ProviderError> {
        if Instant::now() >= deadline {
            return Err(ProviderError::DeadlineExceeded);
        }

        let bucket = self.bucket(provider);
        tokio::select! {
            _ = bucket.until_ready() => Ok(()),
            _ = sleep_until(deadline) => Err(ProviderError::DeadlineExceeded),
        }
    }

    fn bucket(&self, provider: &str) -> Arc<DirectRateLimiter> {
        {
            let buckets = self.buckets.read().expect("rate limiter map lock");
            if let Some(bucket) = buckets.get(provider) {
                return Arc::clone(bucket);
            }
        }

        // Double-checked: another caller may have inserted between the
        // read unlock and the write lock.
        let mut buckets = self.buckets.write().expect("rate limiter map lock");
        if let Some(bucket) = buckets.get(provider) {
            return Arc::clone(bucket);
        }

        let bucket = build_bucket(self.defaults);
        buckets.insert(provider.to_string(), Arc::clone(&bucket));
        bucket
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.read().expect("rate limiter map lock").len()
    }
}

fn build_bucket(config: RateLimitConfig) -> Arc<DirectRateLimiter> {
    let rps = config.requests_per_second.max(0.001);
    let period = Duration::from_secs_f64(1.0 / rps);
    let burst = NonZeroU32::new(config.burst_size.max(1)).expect("burst is non-zero");

    let quota = Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst);
    Arc::new(RateLimiter::direct(quota))
}
