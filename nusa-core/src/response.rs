use serde::{Deserialize, Serialize};

use crate::flight::Flight;
use crate::request::{SearchFilters, SearchRequest};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub total_results: usize,
    pub providers_queried: usize,
    pub providers_succeeded: usize,
    pub providers_failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_providers: Vec<String>,
    pub search_time_ms: u64,
    pub cache_hit: bool,
}

/// Echo of the request the results answer, defaults applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub passengers: i32,
    pub cabin_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    pub sort_by: String,
    pub sort_order: String,
}

impl From<&SearchRequest> for SearchCriteria {
    fn from(req: &SearchRequest) -> Self {
        Self {
            origin: req.origin.clone(),
            destination: req.destination.clone(),
            departure_date: req.departure_date.clone(),
            return_date: req.return_date.clone(),
            passengers: req.passengers,
            cabin_class: req.cabin_class.clone(),
            filters: req.filters.clone(),
            sort_by: req.sort_by.clone(),
            sort_order: req.sort_order.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search_criteria: SearchCriteria,
    pub metadata: SearchMetadata,
    pub flights: Vec<Flight>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoundTripResponse {
    pub search_criteria: SearchCriteria,
    pub metadata: SearchMetadata,
    pub outbound_flights: Vec<Flight>,
    pub return_flights: Vec<Flight>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}
