use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Canonical flight record. Every provider adapter normalizes into this
/// shape; downstream stages never see provider-specific payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: String,
    pub provider: String,
    pub airline: Airline,
    pub flight_number: String,
    pub departure: Location,
    pub arrival: Location,
    pub duration: FlightDuration,
    pub stops: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layovers: Vec<Layover>,
    pub price: Price,
    pub available_seats: u32,
    pub cabin_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aircraft: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,
    pub baggage: Baggage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_value_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub code: String,
    pub name: String,
}

/// Departure or arrival endpoint. `time` keeps the airport's fixed offset so
/// the serialized instant reads as local wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub airport: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    pub time: DateTime<FixedOffset>,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDuration {
    pub hours: u32,
    pub minutes: u32,
    pub total_minutes: u32,
}

impl FlightDuration {
    /// Decomposes a total-minutes figure, keeping `total_minutes ==
    /// hours * 60 + minutes` by construction.
    pub fn from_total_minutes(total: u32) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
            total_minutes: total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layover {
    pub airport: String,
    pub city: String,
    #[serde(rename = "duration_minutes")]
    pub duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baggage {
    pub cabin_kg: f64,
    pub checked_kg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_decomposition() {
        let d = FlightDuration::from_total_minutes(135);
        assert_eq!(d.hours, 2);
        assert_eq!(d.minutes, 15);
        assert_eq!(d.total_minutes, d.hours * 60 + d.minutes);

        let d = FlightDuration::from_total_minutes(60);
        assert_eq!(d.hours, 1);
        assert_eq!(d.minutes, 0);

        let d = FlightDuration::from_total_minutes(0);
        assert_eq!(d.total_minutes, 0);
    }

    #[test]
    fn test_flight_serialization_preserves_offset() {
        let json = r#"
            {
                "id": "GA-1",
                "provider": "garuda",
                "airline": {"code": "GA", "name": "Garuda Indonesia"},
                "flight_number": "GA402",
                "departure": {
                    "airport": "CGK",
                    "city": "Jakarta",
                    "time": "2025-12-15T06:30:00+07:00",
                    "timezone": "WIB"
                },
                "arrival": {
                    "airport": "DPS",
                    "city": "Denpasar",
                    "time": "2025-12-15T09:20:00+08:00",
                    "timezone": "WITA"
                },
                "duration": {"hours": 1, "minutes": 50, "total_minutes": 110},
                "stops": 0,
                "price": {"amount": 1250000.0, "currency": "IDR", "formatted": "IDR 1.250.000"},
                "available_seats": 12,
                "cabin_class": "economy",
                "baggage": {"cabin_kg": 7.0, "checked_kg": 20.0}
            }
        "#;
        let flight: Flight = serde_json::from_str(json).expect("flight should deserialize");
        assert_eq!(flight.departure.time.offset().local_minus_utc(), 7 * 3600);
        assert_eq!(flight.best_value_score, None);

        let out = serde_json::to_string(&flight).expect("flight should serialize");
        assert!(out.contains("+07:00"));
        assert!(!out.contains("best_value_score"));
    }
}
