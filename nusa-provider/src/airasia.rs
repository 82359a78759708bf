//! Indonesia AirAsia adapter. Durations come as fractional hours, a
//! `direct_flight` flag forces the stop count to zero, prices are always
//! rupiah, and the service occasionally fails transiently.

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

const FIXTURE: &str = include_str!("fixtures/airasia.json");

/// Cabin allowance applied when the free-form baggage string cannot be
/// parsed. Checked baggage never gets a fallback; it stays zero. Every
/// fare on this feed includes a 7 kg cabin bag, while checked baggage is
/// an unreported paid add-on.
const DEFAULT_CABIN_KG: f64 = 7.0;

#[derive(Debug, Deserialize)]
struct AirAsiaResponse {
    flight_offers: Vec<AirAsiaFlight>,
}

#[derive(Debug, Deserialize)]
struct AirAsiaFlight {
    offer_id: String,
    marketing_carrier: AirAsiaCarrier,
    flight_num: String,
    from: AirAsiaLocation,
    to: AirAsiaLocation,
    depart_at: String,
    arrive_at: String,
    duration_hours: f64,
    direct_flight: bool,
    #[serde(default)]
    stops: Vec<AirAsiaStop>,
    price_idr: f64,
    seats_left: u32,
    travel_class: String,
    #[serde(default)]
    equipment: Option<String>,
    #[serde(default)]
    perks: Vec<String>,
    baggage_info: String,
}

#[derive(Debug, Deserialize)]
struct AirAsiaCarrier {
    airline_code: String,
    airline_name: String,
}

#[derive(Debug, Deserialize)]
struct AirAsiaLocation {
    iata: String,
    city_name: String,
}

#[derive(Debug, Deserialize)]
struct AirAsiaStop {
    stop_airport: String,
    stop_city: String,
    stop_duration_mins: u32,
}

pub struct AirAsiaProvider {
    flights: Vec<AirAsiaFlight>,
    sim: Simulation,
}

impl AirAsiaProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_simulation(Simulation::new(50, 150).with_failure_rate(0.1))
    }

    pub fn with_simulation(sim: Simulation) -> Result<Self, ProviderError> {
        let payload: AirAsiaResponse = serde_json::from_str(FIXTURE)?;
        Ok(Self {
            flights: payload.flight_offers,
            sim,
        })
    }

    fn normalize(&self, f: &AirAsiaFlight) -> Option<Flight> {
        let dep_time = timezone::parse(&f.depart_at, None).ok()?;
        let arr_time = timezone::parse(&f.arrive_at, None).ok()?;

        let dep_time = timezone::convert_to_airport_zone(dep_time, &f.from.iata);
        let arr_time = timezone::convert_to_airport_zone(arr_time, &f.to.iata);

        let total_minutes = (f.duration_hours * 60.0).round() as u32;

        let stops = if f.direct_flight {
            0
        } else {
            f.stops.len() as u32
        };

        let layovers = f
            .stops
            .iter()
            .map(|s| Layover {
                airport: s.stop_airport.clone(),
                city: s.stop_city.clone(),
                duration: s.stop_duration_mins,
            })
            .collect();

        let cabin_kg = parse_weight_kg(&f.baggage_info).unwrap_or(DEFAULT_CABIN_KG);

        Some(Flight {
            id: f.offer_id.clone(),
            provider: self.name().to_string(),
            airline: Airline {
                code: f.marketing_carrier.airline_code.clone(),
                name: f.marketing_carrier.airline_name.clone(),
            },
            flight_number: f.flight_num.clone(),
            departure: Location {
                airport: f.from.iata.clone(),
                city: f.from.city_name.clone(),
                terminal: None,
                time: dep_time,
                timezone: Zone::of_airport(&f.from.iata).name().to_string(),
            },
            arrival: Location {
                airport: f.to.iata.clone(),
                city: f.to.city_name.clone(),
                terminal: None,
                time: arr_time,
                timezone: Zone::of_airport(&f.to.iata).name().to_string(),
            },
            duration: FlightDuration::from_total_minutes(total_minutes),
            stops,
            layovers,
            price: Price {
                amount: f.price_idr,
                currency: "IDR".to_string(),
                formatted: format_idr(f.price_idr),
            },
            available_seats: f.seats_left,
            cabin_class: f.travel_class.clone(),
            aircraft: f.equipment.clone().filter(|e| !e.is_empty()),
            amenities: f.perks.clone(),
            baggage: Baggage {
                cabin_kg,
                checked_kg: 0.0,
            },
            best_value_score: None,
        })
    }
}

#[async_trait]
impl FlightProvider for AirAsiaProvider {
    fn name(&self) -> &'static str {
        "airasia"
    }

    async fn search(
        &self,
        deadline: Instant,
        req: &SearchRequest,
    ) -> Result<Vec<Flight>, ProviderError> {
        self.sim.hold(deadline).await?;

        if self.sim.roll_failure() {
            return Err(ProviderError::Unavailable);
        }

        let Ok(req_date) = NaiveDate::parse_from_str(&req.departure_date, "%Y-%m-%d") else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for f in &self.flights {
            if !f.from.iata.eq_ignore_ascii_case(&req.origin)
                || !f.to.iata.eq_ignore_ascii_case(&req.destination)
            {
                continue;
            }
            if !f.travel_class.eq_ignore_ascii_case(&req.cabin_class) {
                continue;
            }

            let Ok(dep_time) = timezone::parse(&f.depart_at, None) else {
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

    fn provider() -> AirAsiaProvider {
        AirAsiaProvider::with_simulation(Simulation::instant()).expect("fixture should parse")
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn test_fractional_hours_round_to_minutes() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        let direct = flights
            .iter()
            .find(|f| f.id == "QZ-7520-1215")
            .expect("fixture flight should match");
        // 1.83 h rounds to 110 minutes.
        assert_eq!(direct.duration.total_minutes, 110);
        assert_eq!(direct.duration.hours, 1);
        assert_eq!(direct.duration.minutes, 50);
    }

    #[tokio::test]
    async fn test_direct_flag_forces_zero_stops() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        let one_stop = flights
            .iter()
            .find(|f| f.id == "QZ-7530-1215")
            .expect("fixture flight should match");
        assert_eq!(one_stop.stops, 1);
        assert_eq!(one_stop.layovers.len(), 1);

        assert!(flights
            .iter()
            .filter(|f| f.id != "QZ-7530-1215")
            .all(|f| f.stops == 0));
    }

    #[tokio::test]
    async fn test_unparseable_baggage_defaults() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        let no_weight = flights
            .iter()
            .find(|f| f.id == "QZ-7526-1215")
            .expect("fixture flight should match");
        assert_eq!(no_weight.baggage.cabin_kg, DEFAULT_CABIN_KG);
        assert_eq!(no_weight.baggage.checked_kg, 0.0);
    }

    #[tokio::test]
    async fn test_prices_are_rupiah() {
        let flights = provider()
            .search(far_deadline(), &request())
            .await
            .expect("search should succeed");
        for f in &flights {
            assert_eq!(f.price.currency, "IDR");
            assert!(f.price.formatted.starts_with("IDR "));
        }
    }

    #[tokio::test]
    async fn test_seeded_transient_failure_rate() {
        let provider = AirAsiaProvider::with_simulation(
            Simulation::instant().with_failure_rate(0.1).with_seed(42),
        )
        .expect("fixture should parse");

        let mut failures = 0u32;
        for _ in 0..1000 {
            match provider.search(far_deadline(), &request()).await {
                Ok(_) => {}
                Err(ProviderError::Unavailable) => failures += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let rate = f64::from(failures) / 1000.0;
        assert!((0.06..=0.14).contains(&rate), "failure rate {rate} out of band");
    }
}
