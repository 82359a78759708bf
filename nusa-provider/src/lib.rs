use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use nusa_core::{Flight, SearchRequest};

pub mod airasia;
pub mod batikair;
pub mod garuda;
pub mod lionair;
pub mod sim;
mod units;

pub use airasia::AirAsiaProvider;
pub use batikair::BatikAirProvider;
pub use garuda::GarudaProvider;
pub use lionair::LionAirProvider;
pub use sim::Simulation;

/// Errors a provider adapter can signal.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The embedded fixture payload could not be decoded. Fatal at
    /// construction time.
    #[error("failed to decode provider payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// The request deadline fired before the provider responded.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// Transient upstream failure; worth retrying.
    #[error("temporary service unavailable")]
    Unavailable,
    /// The upstream answered with something the adapter cannot work with.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Contract every upstream data source implements. Adapters own all
/// provider-specific parsing; callers only ever see canonical [`Flight`]
/// records matching the request's route, cabin class, and departure date.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// Stable lowercase provider tag.
    fn name(&self) -> &'static str;

    /// Searches this provider. Implementations must give up with
    /// [`ProviderError::DeadlineExceeded`] once `deadline` has passed.
    async fn search(
        &self,
        deadline: Instant,
        req: &SearchRequest,
    ) -> Result<Vec<Flight>, ProviderError>;
}

/// Constructs the full production provider set with their default latency
/// and failure profiles.
pub fn default_providers() -> Result<Vec<Arc<dyn FlightProvider>>, ProviderError> {
    Ok(vec![
        Arc::new(GarudaProvider::new()?),
        Arc::new(LionAirProvider::new()?),
        Arc::new(BatikAirProvider::new()?),
        Arc::new(AirAsiaProvider::new()?),
    ])
}
