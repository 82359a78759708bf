//! Batik Air adapter. Travel time arrives as an `"Nh Mm"` string, baggage
//! as a single combined allowance string, and the flight list sits under a
//! `data` wrapper. Timestamps carry offsets written without a colon.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::time::Instant;

use nusa_core::currency::format_idr;
use nusa_core::timezone::{self, Zone};
use nusa_core::{Airline, Baggage, Flight, FlightDuration, Layover, Location, Price, SearchRequest};

use crate::sim::Simulation;
use crate::units::{parse_travel_time, parse_weight_kg_before};
use crate::{FlightProvider, ProviderError};

const FIXTURE: &str = include_str!("fixtures/batikair.json");

#[derive(Debug, Deserialize)]
struct BatikResponse {
    data: BatikData,
}

#[derive(Debug, Deserialize)]
struct BatikData {
    #[serde(rename = "availableFlights")]
    available_flights: Vec<BatikFlight>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikFlight {
    flight_id: String,
    operating_carrier: BatikCarrier,
    flight_no: String,
    departure_info: BatikDeparture,
    arrival_info: BatikArrival,
    travel_time: String,
    number_of_stops: u32,
    #[serde(default)]
    connection_points: Vec<BatikConnection>,
    fare: BatikFare,
    seats_available: u32,
    cabin_type: String,
    #[serde(default)]
    aircraft_type: Option<String>,
    #[serde(default)]
    included_services: Vec<String>,
    baggage_allowance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikCarrier {
    carrier_code: String,
    carrier_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikDeparture {
    airport_code: String,
    city_name: String,
    #[serde(default)]
    terminal_no: Option<String>,
    departure_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikArrival {
    airport_code: String,
    city_name: String,
    #[serde(default)]
    terminal_no: Option<String>,
    arrival_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikConnection {
    airport: String,
    city: String,
    layover_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatikFare {
    total_price: f64,
    currency_code: String,
}

pub struct BatikAirProvider {
    flights: Vec<BatikFlight>,
    sim: Simulation,
}

impl BatikAirProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_simulation(Simulation::new(200, 400))
    }

    pub fn with_simulation(sim: Simulation) -> Result<Self, ProviderError> {
        let payload: BatikResponse = serde_json::from_str(FIXTURE)?;
        Ok(Self {
            flights: payload.data.available_flights,
            sim,
        })
    }

    fn normalize(&self, f: &BatikFlight) -> Option<Flight> {
        let dep_time = timezone::parse(&f.departure_info.departure_time, None).ok()?;
        let arr_time = timezone::parse(&f.arrival_info.arrival_time, None).ok()?;

        let dep_time = timezone::convert_to_airport_zone(dep_time, &f.departure_info.airport_code);
        let arr_time = timezone::convert_to_airport_zone(arr_time, &f.arrival_info.airport_code);

        let total_minutes = parse_travel_time(&f.travel_time);

        let layovers = f
            .connection_points
            .iter()
            .map(|c| Layover {
                airport: c.airport.clone(),
                city: c.city.clone(),
                duration: c.layover_minutes,
            })
            .collect();

        let cabin_kg = parse_weight_kg_before(&f.baggage_allowance, "cabin").unwrap_or(0.0);
        let checked_kg = parse_weight_kg_before(&f.baggage_allowance, "checked").unwrap_or(0.0);

        Some(Flight {
            id: f.flight_id.clone(),
            provider: self.name().to_string(),
            airline: Airline {
                code: f.operating_carrier.carrier_code.clone(),
                name: f.operating_carrier.carrier_name.clone(),
            },
            flight_number: f.flight_no.clone(),
            departure: Location {
                airport: f.departure_info.airport_code.clone(),
                city: f.departure_info.city_name.clone(),
                terminal: f.departure_info.terminal_no.clone().filter(|t| !t.is_empty()),
                time: dep_time,
                timezone: Zone::of_airport(&f.departure_info.airport_code).name().to_string(),
            },
            arrival: Location {
                airport: f.arrival_info.airport_code.clone(),
                city: f.arrival_info.city_name.clone(),
                terminal: f.arrival_info.terminal_no.clone().filter(|t| !t.is_empty()),
                time: arr_time,
                timezone: Zone::of_airport(&f.arrival_info.airport_code).name().to_string(),
            },
            duration: FlightDuration::from_total_minutes(total_minutes),
            stops: f.number_of_stops,
            layovers,
            price: Price {
                amount: f.fare.total_price,
                currency: f.fare.currency_code.clone(),
                formatted: format_idr(f.fare.total_price),
            },
            available_seats: f.seats_available,
            cabin_class: f.cabin_type.clone(),
            aircraft: f.aircraft_type.clone().filter(|a| !a.is_empty()),
            amenities: f.included_services.clone(),
            baggage: Baggage {
                cabin_kg,
                checked_kg,
            },
            best_value_score: None,
        })
    }
}

#[async_trait]
impl FlightProvider for BatikAirProvider {
    fn name(&self) -> &'static str {
        "batikair"
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
            if !f.departure_info.airport_code.eq_ignore_ascii_case(&req.origin)
                || !f.arrival_info.airport_code.eq_ignore_ascii_case(&req.destination)
            {
                continue;
            }
            if !f.cabin_type.eq_ignore_ascii_case(&req.cabin_class) {
                continue;
            }

            let Ok(dep_time) = timezone::parse(&f.departure_info.departure_time, None) else {
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
