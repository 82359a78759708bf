use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nusa_api::{app, AppState};
use nusa_engine::{Aggregator, AggregatorConfig, ProviderLimiter};
use nusa_store::{FlightCache, NoopCache, RedisCache, RedisConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nusa_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = nusa_store::Config::load().context("Failed to load config")?;

    let providers = nusa_provider::default_providers().context("Failed to initialize providers")?;
    tracing::info!("Initialized {} flight providers", providers.len());

    let limiter = Arc::new(ProviderLimiter::with_defaults());
    limiter.set_provider_limit("garuda", 20.0, 30);
    limiter.set_provider_limit("lionair", 15.0, 25);
    limiter.set_provider_limit("batikair", 15.0, 25);
    limiter.set_provider_limit("airasia", 10.0, 20);

    let aggregator = Arc::new(Aggregator::new(
        providers,
        AggregatorConfig::default(),
        limiter,
    ));

    let cache: Arc<dyn FlightCache> = if config.cache_enabled {
        let redis = RedisCache::new(RedisConfig {
            host: config.redis_host.clone(),
            port: config.redis_port,
            ttl: config.redis_ttl,
        })
        .await
        .context("Failed to connect to Redis")?;
        tracing::info!(
            "Redis cache enabled (host: {}:{}, TTL: {:?})",
            config.redis_host,
            config.redis_port,
            config.redis_ttl
        );
        Arc::new(redis)
    } else {
        tracing::info!("Cache disabled");
        Arc::new(NoopCache)
    };

    let state = AppState { aggregator, cache };
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting flight aggregator server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listen address")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
