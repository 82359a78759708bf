//! Best-value scoring. Scores are normalized against the set being ranked,
//! so they must be computed after filtering.

use nusa_core::Flight;

const PRICE_WEIGHT: f64 = 0.5;
const DURATION_WEIGHT: f64 = 0.3;
const STOPS_WEIGHT: f64 = 0.2;

/// Attaches a best-value score to every flight. Lower is better.
pub fn calculate_scores(mut flights: Vec<Flight>) -> Vec<Flight> {
    if flights.is_empty() {
        return flights;
    }

    let max_price = flights.iter().map(|f| f.price.amount).fold(0.0, f64::max);
    let max_duration = flights
        .iter()
        .map(|f| f64::from(f.duration.total_minutes))
        .fold(0.0, f64::max);

    for flight in &mut flights {
        flight.best_value_score = Some(best_value(flight, max_price, max_duration));
    }

    flights
}

/// Weighted composite of price, duration, and stops, each scaled against
/// the set maximum, rounded to two decimals.
pub fn best_value(flight: &Flight, max_price: f64, max_duration: f64) -> f64 {
    let price_score = if max_price > 0.0 {
        flight.price.amount / max_price * 100.0
    } else {
        0.0
    };

    let duration_score = if max_duration > 0.0 {
        f64::from(flight.duration.total_minutes) / max_duration * 100.0
    } else {
        0.0
    };

    let stops_score = f64::from(flight.stops) * 15.0;

    let score =
        price_score * PRICE_WEIGHT + duration_score * DURATION_WEIGHT + stops_score * STOPS_WEIGHT;
    (score * 100.0).round() / 100.0
}
