use std::sync::Arc;

use nusa_engine::Aggregator;
use nusa_store::FlightCache;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub cache: Arc<dyn FlightCache>,
}
