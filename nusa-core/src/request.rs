use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Optional result-set predicates. Every field is independent; an absent
/// field filters nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stops: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub airlines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
}

/// Immutable description of one search. Created at ingress, validated once,
/// then passed by reference through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default)]
    pub passengers: i32,
    #[serde(default)]
    pub cabin_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default)]
    pub sort_order: String,
}

impl SearchRequest {
    /// Checks the required fields and fills the documented defaults in place.
    pub fn validate(&mut self) -> CoreResult<()> {
        if self.origin.is_empty() {
            return Err(CoreError::MissingOrigin);
        }
        if self.destination.is_empty() {
            return Err(CoreError::MissingDestination);
        }
        if self.departure_date.is_empty() {
            return Err(CoreError::MissingDepartureDate);
        }
        if self.passengers <= 0 {
            self.passengers = 1;
        }
        if self.cabin_class.is_empty() {
            self.cabin_class = "economy".to_string();
        }
        if self.sort_by.is_empty() {
            self.sort_by = "best_value".to_string();
        }
        if self.sort_order.is_empty() {
            self.sort_order = "asc".to_string();
        }
        Ok(())
    }

    /// True when a non-empty return date turns this into a round trip.
    pub fn is_round_trip(&self) -> bool {
        self.return_date.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// The mirrored request for the return leg: endpoints swapped, the
    /// return date promoted to departure date.
    pub fn return_leg(&self) -> Option<SearchRequest> {
        let return_date = self.return_date.as_deref().filter(|d| !d.is_empty())?;
        Some(SearchRequest {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            departure_date: return_date.to_string(),
            return_date: None,
            passengers: self.passengers,
            cabin_class: self.cabin_class.clone(),
            filters: self.filters.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order.clone(),
        })
    }
}
