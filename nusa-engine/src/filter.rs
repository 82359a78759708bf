//! Predicate filtering and ordered output. Runs on every request,
//! cache hit or miss, in a fixed order: filter, then rank (best_value
//! only), then sort.

use std::cmp::Ordering;

use chrono::{NaiveTime, Timelike};

use nusa_core::{Flight, SearchFilters};

use crate::ranking;

/// Applies the full filter/rank/sort stage and returns the ordered set.
pub fn apply(
    flights: Vec<Flight>,
    filters: Option<&SearchFilters>,
    sort_by: &str,
    sort_order: &str,
) -> Vec<Flight> {
    let mut filtered = apply_filters(flights, filters);

    // best_value needs set-wide maxima, so it is scored over the filtered
    // set rather than the aggregated one.
    if sort_by == "best_value" {
        filtered = ranking::calculate_scores(filtered);
    }

    apply_sort(filtered, sort_by, sort_order)
}

fn apply_filters(flights: Vec<Flight>, filters: Option<&SearchFilters>) -> Vec<Flight> {
    let Some(filters) = filters else {
        return flights;
    };

    flights
        .into_iter()
        .filter(|f| matches_filters(f, filters))
        .collect()
}

fn matches_filters(f: &Flight, filters: &SearchFilters) -> bool {
    if filters.price_min.is_some_and(|min| f.price.amount < min) {
        return false;
    }
    if filters.price_max.is_some_and(|max| f.price.amount > max) {
        return false;
    }

    if filters.max_stops.is_some_and(|max| f.stops > max) {
        return false;
    }

    if !filters.airlines.is_empty()
        && !filters
            .airlines
            .iter()
            .any(|a| f.airline.code.eq_ignore_ascii_case(a))
    {
        return false;
    }

    let departure_minute = minute_of_day(f.departure.time.time());
    if let Some(min) = parse_time_of_day(filters.departure_time_min.as_deref()) {
        if departure_minute < min {
            return false;
        }
    }
    if let Some(max) = parse_time_of_day(filters.departure_time_max.as_deref()) {
        if departure_minute > max {
            return false;
        }
    }

    let arrival_minute = minute_of_day(f.arrival.time.time());
    if let Some(min) = parse_time_of_day(filters.arrival_time_min.as_deref()) {
        if arrival_minute < min {
            return false;
        }
    }
    if let Some(max) = parse_time_of_day(filters.arrival_time_max.as_deref()) {
        if arrival_minute > max {
            return false;
        }
    }

    if filters
        .max_duration
        .is_some_and(|max| f.duration.total_minutes > max)
    {
        return false;
    }

    true
}

/// `HH:MM` to minutes since midnight. An absent or unparseable value
/// yields `None`, which skips the predicate.
fn parse_time_of_day(value: Option<&str>) -> Option<u32> {
    let time = NaiveTime::parse_from_str(value?, "%H:%M").ok()?;
    Some(minute_of_day(time))
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn apply_sort(mut flights: Vec<Flight>, sort_by: &str, sort_order: &str) -> Vec<Flight> {
    if flights.is_empty() {
        return flights;
    }

    let ascending = !sort_order.eq_ignore_ascii_case("desc");
    let order = move |ord: Ordering| if ascending { ord } else { ord.reverse() };

    match sort_by.to_lowercase().as_str() {
        "price" => flights.sort_by(|a, b| order(a.price.amount.total_cmp(&b.price.amount))),
        "duration" => flights
            .sort_by(|a, b| order(a.duration.total_minutes.cmp(&b.duration.total_minutes))),
        "departure" => flights.sort_by(|a, b| order(a.departure.time.cmp(&b.departure.time))),
        "arrival" => flights.sort_by(|a, b| order(a.arrival.time.cmp(&b.arrival.time))),
        "best_value" => flights.sort_by(|a, b| {
            order(
                a.best_value_score
                    .unwrap_or(0.0)
                    .total_cmp(&b.best_value_score.unwrap_or(0.0)),
            )
        }),
        "stops" => flights.sort_by(|a, b| order(a.stops.cmp(&b.stops))),
        // Unrecognized keys fall back to price ascending.
        _ => flights.sort_by(|a, b| a.price.amount.total_cmp(&b.price.amount)),
    }

    flights
}
