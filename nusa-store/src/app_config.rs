use std::time::Duration;

use serde::Deserialize;

/// Runtime configuration, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_enabled: bool,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_ttl: Duration,
}

/// Environment values as they arrive; booleans and durations are lenient
/// strings and converted after deserialization.
#[derive(Debug, Deserialize)]
struct RawConfig {
    port: u16,
    cache_enabled: String,
    redis_host: String,
    redis_port: u16,
    redis_ttl: String,
}

impl Config {
    /// Reads `PORT`, `CACHE_ENABLED`, `REDIS_HOST`, `REDIS_PORT`, and
    /// `REDIS_TTL` from the environment, with documented defaults for
    /// anything unset.
    pub fn load() -> Result<Self, config::ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .set_default("port", 8080)?
            .set_default("cache_enabled", "true")?
            .set_default("redis_host", "localhost")?
            .set_default("redis_port", 6379)?
            .set_default("redis_ttl", "5m")?
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()?;

        Ok(Self {
            port: raw.port,
            cache_enabled: parse_bool(&raw.cache_enabled),
            redis_host: raw.redis_host,
            redis_port: raw.redis_port,
            redis_ttl: parse_duration(&raw.redis_ttl).unwrap_or(Duration::from_secs(300)),
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Parses compound duration strings such as `300ms`, `5m`, or `1m30s`.
/// Units: `ms`, `s`, `m`, `h`. Returns `None` for anything malformed.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let number: f64 = rest[..digits_end].parse().ok()?;

        let unit_rest = &rest[digits_end..];
        let (unit_len, secs_per_unit) = if unit_rest.starts_with("ms") {
            (2, 0.001)
        } else if unit_rest.starts_with('s') {
            (1, 1.0)
        } else if unit_rest.starts_with('m') {
            (1, 60.0)
        } else if unit_rest.starts_with('h') {
            (1, 3600.0)
        } else {
            return None;
        };

        total += Duration::from_secs_f64(number * secs_per_unit);
        rest = &unit_rest[unit_len..];
    }

    Some(total)
}
