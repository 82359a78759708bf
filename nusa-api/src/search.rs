use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::warn;

use nusa_core::{
    RoundTripResponse, SearchCriteria, SearchMetadata, SearchRequest, SearchResponse,
};
use nusa_engine::aggregator::AggregatedResult;
use nusa_engine::filter;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/flights/search", post(search_flights))
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/v1/flights/search
///
/// Coordinates one request through the pipeline: validate, probe the
/// cache, aggregate on a miss, store the unfiltered set, then
/// filter/rank/sort on the way out.
async fn search_flights(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let started = Instant::now();

    let Json(mut req) = payload.map_err(|err| AppError::InvalidRequest(err.body_text()))?;
    req.validate()?;

    if let Some(cached) = state.cache.get(&req).await {
        let flights = filter::apply(cached, req.filters.as_ref(), &req.sort_by, &req.sort_order);
        // A hit implies an earlier fully-successful aggregation.
        let provider_count = state.aggregator.provider_count();
        let response = SearchResponse {
            search_criteria: SearchCriteria::from(&req),
            metadata: SearchMetadata {
                total_results: flights.len(),
                providers_queried: provider_count,
                providers_succeeded: provider_count,
                providers_failed: 0,
                failed_providers: Vec::new(),
                search_time_ms: elapsed_ms(started),
                cache_hit: true,
            },
            flights,
        };
        return Ok(Json(response).into_response());
    }

    if req.is_round_trip() {
        return search_round_trip(state, req, started).await;
    }

    let result = state.aggregator.search(&req).await;
    if let Err(err) = state.cache.set(&req, &result.flights).await {
        warn!(error = %err, "failed to cache search results");
    }

    let AggregatedResult {
        flights,
        providers_queried,
        providers_succeeded,
        providers_failed,
        failed_providers,
    } = result;
    let flights = filter::apply(flights, req.filters.as_ref(), &req.sort_by, &req.sort_order);

    let response = SearchResponse {
        search_criteria: SearchCriteria::from(&req),
        metadata: SearchMetadata {
            total_results: flights.len(),
            providers_queried,
            providers_succeeded,
            providers_failed,
            failed_providers,
            search_time_ms: elapsed_ms(started),
            cache_hit: false,
        },
        flights,
    };
    Ok(Json(response).into_response())
}

async fn search_round_trip(
    state: AppState,
    req: SearchRequest,
    started: Instant,
) -> Result<Response, AppError> {
    let (outbound, return_result) = state.aggregator.search_round_trip(&req).await;

    let AggregatedResult {
        flights: outbound_raw,
        providers_queried,
        providers_succeeded,
        providers_failed,
        failed_providers,
    } = outbound;
    let outbound_flights =
        filter::apply(outbound_raw, req.filters.as_ref(), &req.sort_by, &req.sort_order);

    let mut total_queried = providers_queried;
    let mut total_succeeded = providers_succeeded;
    let mut total_failed = providers_failed;
    let mut all_failed_providers = failed_providers;

    let return_flights = match return_result {
        Some(result) => {
            total_queried += result.providers_queried;
            total_succeeded += result.providers_succeeded;
            total_failed += result.providers_failed;
            all_failed_providers.extend(result.failed_providers);
            filter::apply(result.flights, req.filters.as_ref(), &req.sort_by, &req.sort_order)
        }
        None => Vec::new(),
    };

    let response = RoundTripResponse {
        search_criteria: SearchCriteria::from(&req),
        metadata: SearchMetadata {
            total_results: outbound_flights.len() + return_flights.len(),
            providers_queried: total_queried,
            providers_succeeded: total_succeeded,
            providers_failed: total_failed,
            failed_providers: unique_strings(all_failed_providers),
            search_time_ms: elapsed_ms(started),
            cache_hit: false,
        },
        outbound_flights,
        return_flights,
    };
    Ok(Json(response).into_response())
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn unique_strings(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
