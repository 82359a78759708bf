//! Garuda Indonesia adapter. The tidiest upstream: integer minute
//! durations, an explicit stop count, structured baggage weights, and
//! RFC 3339 timestamps with offsets.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::Instant;

use nusa_core::currency::format_idr;
use nusa_core::timezone::{self, Zone};
use nusa_core::{Airline, Baggage, Flight, FlightDuration, Layover, Location, Price, SearchRequest};

use crate::sim::Simulation;
use crate::{FlightProvider, ProviderError};

const FIXTURE: &str = include_str!("fixtures/garuda.json");

#[derive(Debug, Deserialize)]
struct GarudaResponse {
    flights: Vec<GarudaFlight>,
}

#[derive(Debug, Deserialize)]
struct GarudaFlight {
    flight_id: String,
    airline: GarudaAirline,
    flight_number: String,
    departure: GarudaLocation,
    arrival: GarudaLocation,
    duration_minutes: u32,
    stops: u32,
    #[serde(default)]
    layovers: Vec<GarudaLayover>,
    price: GarudaPrice,
    available_seats: u32,
    cabin_class: String,
    #[serde(default)]
    aircraft: Option<String>,
    #[serde(default)]
    amenities: Vec<String>,
    baggage: GarudaBaggage,
}

#[derive(Debug, Deserialize)]
struct GarudaAirline {
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GarudaLocation {
    airport: String,
    city: String,
    #[serde(default)]
    terminal: Option<String>,
    time: String,
}

#[derive(Debug, Deserialize)]
struct GarudaLayover {
    airport: String,
    city: String,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct GarudaPrice {
    amount: f64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct GarudaBaggage {
    carry_on: u32,
    checked: u32,
}

pub struct GarudaProvider {
    flights: Vec<GarudaFlight>,
    sim: Simulation,
}

impl GarudaProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_simulation(Simulation::new(50, 100))
    }

    pub fn with_simulation(sim: Simulation) -> Result<Self, ProviderError> {
        let payload: GarudaResponse = serde_json::from_str(FIXTURE)?;
        Ok(Self {
            flights: payload.flights,
            sim,
        })
    }

    fn normalize(&self, f: &GarudaFlight) -> Option<Flight> {
        let dep_time = timezone::parse(&f.departure.time, None).ok()?;
        let arr_time = timezone::parse(&f.arrival.time, None).ok()?;

        let dep_time = timezone::convert_to_airport_zone(dep_time, &f.departure.airport);
        let arr_time = timezone::convert_to_airport_zone(arr_time, &f.arrival.airport);

        let layovers = f
            .layovers
            .iter()
            .map(|l| Layover {
                airport: l.airport.clone(),
                city: l.city.clone(),
                duration: l.duration,
            })
            .collect();

        Some(Flight {
            id: f.flight_id.clone(),
            provider: self.name().to_string(),
            airline: Airline {
                code: f.airline.code.clone(),
                name: f.airline.name.clone(),
            },
            flight_number: f.flight_number.clone(),
            departure: Location {
                airport: f.departure.airport.clone(),
                city: f.departure.city.clone(),
                terminal: f.departure.terminal.clone().filter(|t| !t.is_empty()),
                time: dep_time,
                timezone: Zone::of_airport(&f.departure.airport).name().to_string(),
            },
            arrival: Location {
                airport: f.arrival.airport.clone(),
                city: f.arrival.city.clone(),
                terminal: f.arrival.terminal.clone().filter(|t| !t.is_empty()),
                time: arr_time,
                timezone: Zone::of_airport(&f.arrival.airport).name().to_string(),
            },
            duration: FlightDuration::from_total_minutes(f.duration_minutes),
            stops: f.stops,
            layovers,
            price: Price {
                amount: f.price.amount,
                currency: f.price.currency.clone(),
                formatted: format_idr(f.price.amount),
            },
            available_seats: f.available_seats,
            cabin_class: f.cabin_class.clone(),
            aircraft: f.aircraft.clone().filter(|a| !a.is_empty()),
            amenities: f.amenities.clone(),
            baggage: Baggage {
                cabin_kg: f.baggage.carry_on as f64,
                checked_kg: f.baggage.checked as f64,
            },
            best_value_score: None,
        })
    }
}

#[async_trait]
impl FlightProvider for GarudaProvider {
    fn name(&self) -> &'static str {
        "garuda"
    }

    async fn search(
        &self,
        deadline: Instant,
        req: &SearchRequest,
    ) -> Result<Vec<Flight>, ProviderError> {
        self.sim.hold(deadline).await?;

        let Ok(req_date) = NaiveDate::parse_from_str(&req.departure_date, "%Y-%m-%d") else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for f in &self.flights {
            if !f.departure.airport.eq_ignore_ascii_case(&req.origin)
                || !f.arrival.airport.eq_ignore_ascii_case(&req.destination)
            {
                continue;
            }
            if !f.cabin_class.eq_ignore_ascii_case(&req.cabin_class) {
                continue;
            }

            // Date comparison happens in the zone the timestamp carried,
            // before any airport-zone conversion.
            let Ok(dep_time) = timezone::parse(&f.departure.time, None) else {
                continue;
            };
            if dep_time.date_naive() != req_date {
                continue;
            }

            if let Some(flight) = self.normalize(f) {
                results.push(flight);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request() -> SearchRequest {
        SearchRequest {
            origin: "CGK".to_string(),
            destination: "DPS".to_string(),
            departure_date: "2025-12-15".to_string(),
            return_date: None,
            passengers: 1,
            cabin_class: "economy".to_string(),
            filters: None,
            sort_by: "price".to_string(),
            sort_order: "asc".to_string(),
        }
    }

    fn provider() -> GarudaProvider {
        GarudaProvider::with_simulation(Simulation::instant()).expect("fixture should parse")
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_search_matches_route_cabin_and_date() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        assert!(!flights.is_empty());
        for f in &flights {
            assert_eq!(f.provider, "garuda");
            assert_eq!(f.departure.airport, "CGK");
            assert_eq!(f.arrival.airport, "DPS");
            assert_eq!(f.cabin_class, "economy");
            assert_eq!(f.departure.time.date_naive().to_string(), "2025-12-15");
        }
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let mut req = request();
        req.origin = "cgk".to_string();
        req.destination = "dps".to_string();
        req.cabin_class = "Economy".to_string();

        let flights = provider()
            .search(far_deadline(), &req)
            .await
            .expect("search should succeed");
        assert!(!flights.is_empty());
    }

    #[tokio::test]
    async fn test_search_other_date_is_empty() {
        let mut req = request();
        req.departure_date = "2025-12-17".to_string();
        let flights = provider()
            .search(far_deadline(), &req)
            .await
            .expect("search should succeed");
        assert!(flights.is_empty());
    }

    #[tokio::test]
    async fn test_normalization_detail() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        let f = &flights[0];
        assert_eq!(f.duration.total_minutes, f.duration.hours * 60 + f.duration.minutes);
        assert_eq!(f.departure.timezone, "WIB");
        assert_eq!(f.arrival.timezone, "WITA");
        assert_eq!(f.arrival.time.offset().local_minus_utc(), 8 * 3600);
        assert!(f.price.formatted.starts_with("IDR "));
        assert!(f.layovers.len() as u32 <= f.stops);
    }

    #[tokio::test]
    async fn test_expired_deadline_cancels() {
        let deadline = Instant::now() - Duration::from_millis(1);
        let err = provider()
            .search(deadline, &request())
            .await
            .expect_err("expired deadline should cancel");
        assert!(matches!(err, ProviderError::DeadlineExceeded));
    }
}
