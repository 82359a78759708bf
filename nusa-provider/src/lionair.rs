//! Lion Air adapter. Schedule timestamps are naive local values with a
//! separate zone name, stops come as a `is_direct` flag plus a count, and
//! baggage weights are free-form `"N kg"` strings.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::Instant;

use nusa_core::currency::format_idr;
use nusa_core::timezone::{self, Zone};
use nusa_core::{Airline, Baggage, Flight, FlightDuration, Layover, Location, Price, SearchRequest};

use crate::sim::Simulation;
use crate::units::parse_weight_kg;
use crate::{FlightProvider, ProviderError};

const FIXTURE: &str = include_str!("fixtures/lionair.json");

#[derive(Debug, Deserialize)]
struct LionResponse {
    results: Vec<LionFlight>,
}

#[derive(Debug, Deserialize)]
struct LionFlight {
    id: String,
    carrier: LionCarrier,
    flight_code: String,
    origin: LionAirport,
    destination: LionAirport,
    schedule: LionSchedule,
    flight_time: u32,
    is_direct: bool,
    stop_count: u32,
    #[serde(default)]
    stopovers: Vec<LionStopover>,
    pricing: LionPricing,
    seats_remaining: u32,
    class: String,
    #[serde(default)]
    plane_type: Option<String>,
    #[serde(default)]
    services: Vec<String>,
    baggage: LionBaggage,
}

#[derive(Debug, Deserialize)]
struct LionCarrier {
    iata: String,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct LionAirport {
    code: String,
    name: String,
    #[serde(default)]
    gate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LionSchedule {
    departure: String,
    arrival: String,
    timezone: String,
}

#[derive(Debug, Deserialize)]
struct LionStopover {
    airport_code: String,
    city_name: String,
    wait_time: u32,
}

#[derive(Debug, Deserialize)]
struct LionPricing {
    total: f64,
    currency_code: String,
}

#[derive(Debug, Deserialize)]
struct LionBaggage {
    cabin: String,
    hold: String,
}

pub struct LionAirProvider {
    flights: Vec<LionFlight>,
    sim: Simulation,
}

impl LionAirProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_simulation(Simulation::new(100, 200))
    }

    pub fn with_simulation(sim: Simulation) -> Result<Self, ProviderError> {
        let payload: LionResponse = serde_json::from_str(FIXTURE)?;
        Ok(Self {
            flights: payload.results,
            sim,
        })
    }

    fn normalize(&self, f: &LionFlight) -> Option<Flight> {
        let hint = Some(f.schedule.timezone.as_str());
        let dep_time = timezone::parse(&f.schedule.departure, hint).ok()?;
        let arr_time = timezone::parse(&f.schedule.arrival, hint).ok()?;

        // The departure keeps the schedule zone; only the arrival is
        // re-expressed at the destination airport.
        let arr_time = timezone::convert_to_airport_zone(arr_time, &f.destination.code);

        let stops = if f.is_direct { 0 } else { f.stop_count };

        let layovers = f
            .stopovers
            .iter()
            .map(|s| Layover {
                airport: s.airport_code.clone(),
                city: s.city_name.clone(),
                duration: s.wait_time,
            })
            .collect();

        let cabin_kg = parse_weight_kg(&f.baggage.cabin).unwrap_or(0.0);
        let checked_kg = parse_weight_kg(&f.baggage.hold).unwrap_or(0.0);

        Some(Flight {
            id: f.id.clone(),
            provider: self.name().to_string(),
            airline: Airline {
                code: f.carrier.iata.clone(),
                name: f.carrier.full_name.clone(),
            },
            flight_number: f.flight_code.clone(),
            departure: Location {
                airport: f.origin.code.clone(),
                city: f.origin.name.clone(),
                terminal: f.origin.gate.clone().filter(|g| !g.is_empty()),
                time: dep_time,
                timezone: Zone::of_airport(&f.origin.code).name().to_string(),
            },
            arrival: Location {
                airport: f.destination.code.clone(),
                city: f.destination.name.clone(),
                terminal: f.destination.gate.clone().filter(|g| !g.is_empty()),
                time: arr_time,
                timezone: Zone::of_airport(&f.destination.code).name().to_string(),
            },
            duration: FlightDuration::from_total_minutes(f.flight_time),
            stops,
            layovers,
            price: Price {
                amount: f.pricing.total,
                currency: f.pricing.currency_code.clone(),
                formatted: format_idr(f.pricing.total),
            },
            available_seats: f.seats_remaining,
            cabin_class: f.class.clone(),
            aircraft: f.plane_type.clone().filter(|p| !p.is_empty()),
            amenities: f.services.clone(),
            baggage: Baggage {
                cabin_kg,
                checked_kg,
            },
            best_value_score: None,
        })
    }
}

#[async_trait]
impl FlightProvider for LionAirProvider {
    fn name(&self) -> &'static str {
        "lionair"
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
            if !f.origin.code.eq_ignore_ascii_case(&req.origin)
                || !f.destination.code.eq_ignore_ascii_case(&req.destination)
            {
                continue;
            }
            if !f.class.eq_ignore_ascii_case(&req.cabin_class) {
                continue;
            }

            let hint = Some(f.schedule.timezone.as_str());
            let Ok(dep_time) = timezone::parse(&f.schedule.departure, hint) else {
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

    fn provider() -> LionAirProvider {
        LionAirProvider::with_simulation(Simulation::instant()).expect("fixture should parse")
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_naive_schedule_times_use_zone_hint() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        assert!(!flights.is_empty());
        for f in &flights {
            // Departures out of CGK are scheduled in WIB.
            assert_eq!(f.departure.time.offset().local_minus_utc(), 7 * 3600);
            assert_eq!(f.departure.time.date_naive().to_string(), "2025-12-15");
        }
    }

    #[tokio::test]
    async fn test_direct_flag_overrides_stop_count() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        // Upstream marks this one direct while still reporting stop_count=1;
        // the flag wins.
        let inconsistent = flights
            .iter()
            .find(|f| f.id == "LNI-34-1215")
            .expect("fixture flight should match");
        assert_eq!(inconsistent.stops, 0);

        let one_stop = flights
            .iter()
            .find(|f| f.id == "LNI-38-1215")
            .expect("fixture flight should match");
        assert_eq!(one_stop.stops, 1);
        assert_eq!(one_stop.layovers.len(), 1);
    }

    #[tokio::test]
    async fn test_baggage_strings_parsed() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        for f in &flights {
            assert!(f.baggage.cabin_kg > 0.0);
        }
        // An unparseable hold allowance falls back to zero.
        let no_hold = flights
            .iter()
            .find(|f| f.id == "LNI-34-1215")
            .expect("fixture flight should match");
        assert_eq!(no_hold.baggage.checked_kg, 0.0);
    }

    #[tokio::test]
    async fn test_arrival_converted_to_destination_zone() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        for f in &flights {
            assert_eq!(f.arrival.timezone, "WITA");
            assert_eq!(f.arrival.time.offset().local_minus_utc(), 8 * 3600);
        }
    }
}
