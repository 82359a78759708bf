//! Concurrent provider fan-out with per-provider retry and a shared
//! request deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, sleep_until, timeout_at, Instant};
use tracing::warn;

use nusa_core::{Flight, SearchRequest};
use nusa_provider::{FlightProvider, ProviderError};

use crate::ratelimit::ProviderLimiter;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Hard ceiling for one aggregation, shared by every provider task.
    pub timeout: Duration,
    /// Retries after the first attempt; a provider is called at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
    /// Backoff schedule; attempts beyond its length reuse the last delay.
    pub retry_delays: Vec<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            max_retries: 3,
            retry_delays: vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ],
        }
    }
}

/// Union of the successful provider outputs for one request plus
/// per-provider accounting.
#[derive(Debug, Default)]
pub struct AggregatedResult {
    pub flights: Vec<Flight>,
    pub providers_queried: usize,
    pub providers_succeeded: usize,
    pub providers_failed: usize,
    pub failed_providers: Vec<String>,
}

pub struct Aggregator {
    providers: Vec<Arc<dyn FlightProvider>>,
    config: AggregatorConfig,
    limiter: Arc<ProviderLimiter>,
}

impl Aggregator {
    pub fn new(
        providers: Vec<Arc<dyn FlightProvider>>,
        config: AggregatorConfig,
        limiter: Arc<ProviderLimiter>,
    ) -> Self {
        Self {
            providers,
            config,
            limiter,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Fans out to every provider concurrently and joins whatever arrives
    /// before the deadline. One provider failing never fails the request;
    /// it is accounted in `failed_providers` instead.
    pub async fn search(&self, req: &SearchRequest) -> AggregatedResult {
        let deadline = Instant::now() + self.config.timeout;

        let mut result = AggregatedResult {
            providers_queried: self.providers.len(),
            ..AggregatedResult::default()
        };
        if self.providers.is_empty() {
            return result;
        }

        // Sized for one outcome per provider so workers never block on send.
        let (tx, mut rx) = mpsc::channel(self.providers.len());

        for provider in &self.providers {
            let tx = tx.clone();
            let provider = Arc::clone(provider);
            let req = req.clone();
            let limiter = Arc::clone(&self.limiter);
            let config = self.config.clone();

            tokio::spawn(async move {
                let outcome = match limiter.wait(deadline, provider.name()).await {
                    Ok(()) => search_with_retry(provider.as_ref(), deadline, &req, &config).await,
                    Err(err) => Err(err),
                };
                let _ = tx.send((provider.name(), outcome)).await;
            });
        }

        // Workers hold the only remaining senders; the drain below ends
        // once the last one reports.
        drop(tx);

        while let Some((name, outcome)) = rx.recv().await {
            match outcome {
                Ok(flights) => {
                    result.providers_succeeded += 1;
                    result.flights.extend(flights);
                }
                Err(err) => {
                    warn!(provider = name, error = %err, "provider search failed");
                    result.providers_failed += 1;
                    result.failed_providers.push(name.to_string());
                }
            }
        }

        result
    }

    /// Runs the outbound and return legs as two independent aggregations.
    /// Without a return date this degenerates to a plain one-way search.
    pub async fn search_round_trip(
        &self,
        req: &SearchRequest,
    ) -> (AggregatedResult, Option<AggregatedResult>) {
        let Some(return_req) = req.return_leg() else {
            return (self.search(req).await, None);
        };

        let (outbound, return_result) = tokio::join!(self.search(req), self.search(&return_req));
        (outbound, Some(return_result))
    }
}

async fn search_with_retry(
    provider: &dyn FlightProvider,
    deadline: Instant,
    req: &SearchRequest,
    config: &AggregatorConfig,
) -> Result<Vec<Flight>, ProviderError> {
    let mut last_err = ProviderError::DeadlineExceeded;

    for attempt in 0..=config.max_retries {
        if Instant::now() >= deadline {
            return Err(ProviderError::DeadlineExceeded);
        }

        if attempt > 0 {
            let idx = ((attempt - 1) as usize).min(config.retry_delays.len().saturating_sub(1));
            if let Some(delay) = config.retry_delays.get(idx) {
                tokio::select! {
                    _ = sleep(*delay) => {}
                    _ = sleep_until(deadline) => return Err(ProviderError::DeadlineExceeded),
                }
            }
        }

        match timeout_at(deadline, provider.search(deadline, req)).await {
            Ok(Ok(flights)) => return Ok(flights),
            Ok(Err(err)) => {
                warn!(
                    provider = provider.name(),
                    attempt = attempt + 1,
                    error = %err,
                    "provider attempt failed"
                );
                last_err = err;
            }
            Err(_) => last_err = ProviderError::DeadlineExceeded,
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::ProviderLimiter;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicU32, Ordering};

    use nusa_core::{Airline, Baggage, FlightDuration, Location, Price};

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

    fn flight(id: &str) -> Flight {
        let time = DateTime::parse_from_rfc3339("2025-12-15T06:30:00+07:00")
            .expect("static test timestamp");
        Flight {
            id: id.to_string(),
            provider: "test".to_string(),
            airline: Airline {
                code: "TS".to_string(),
                name: "Test Air".to_string(),
            },
            flight_number: "TS1".to_string(),
            departure: Location {
                airport: "CGK".to_string(),
                city: "Jakarta".to_string(),
                terminal: None,
                time,
                timezone: "WIB".to_string(),
            },
            arrival: Location {
                airport: "DPS".to_string(),
                city: "Denpasar".to_string(),
                terminal: None,
                time,
                timezone: "WITA".to_string(),
            },
            duration: FlightDuration::from_total_minutes(110),
            stops: 0,
            layovers: Vec::new(),
            price: Price {
                amount: 1000000.0,
                currency: "IDR".to_string(),
                formatted: "IDR 1.000.000".to_string(),
            },
            available_seats: 10,
            cabin_class: "economy".to_string(),
            aircraft: None,
            amenities: Vec::new(),
            baggage: Baggage {
                cabin_kg: 7.0,
                checked_kg: 20.0,
            },
            best_value_score: None,
        }
    }

    struct StubProvider {
        name: &'static str,
        flights: Vec<Flight>,
        calls: AtomicU32,
    }

    impl StubProvider {
        fn new(name: &'static str, flights: Vec<Flight>) -> Arc<Self> {
            Arc::new(Self {
                name,
                flights,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl FlightProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(
            &self,
            _deadline: Instant,
            _req: &SearchRequest,
        ) -> Result<Vec<Flight>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.flights.clone())
        }
    }

    struct FailingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl FlightProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn search(
            &self,
            _deadline: Instant,
            _req: &SearchRequest,
        ) -> Result<Vec<Flight>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Unavailable)
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl FlightProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn search(
            &self,
            deadline: Instant,
            _req: &SearchRequest,
        ) -> Result<Vec<Flight>, ProviderError> {
            tokio::select! {
                _ = sleep(Duration::from_secs(10)) => Ok(Vec::new()),
                _ = sleep_until(deadline) => Err(ProviderError::DeadlineExceeded),
            }
        }
    }

    fn aggregator(providers: Vec<Arc<dyn FlightProvider>>, config: AggregatorConfig) -> Aggregator {
        Aggregator::new(providers, config, Arc::new(ProviderLimiter::with_defaults()))
    }

    #[tokio::test]
    async fn test_aggregates_all_successful_providers() {
        let a = StubProvider::new("a", vec![flight("a-1"), flight("a-2")]);
        let b = StubProvider::new("b", vec![flight("b-1")]);
        let agg = aggregator(vec![a, b], AggregatorConfig::default());

        let result = agg.search(&request()).await;
        assert_eq!(result.providers_queried, 2);
        assert_eq!(result.providers_succeeded, 2);
        assert_eq!(result.providers_failed, 0);
        assert!(result.failed_providers.is_empty());
        assert_eq!(result.flights.len(), 3);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successful_flights() {
        let good = StubProvider::new("good", vec![flight("g-1")]);
        let bad: Arc<dyn FlightProvider> = Arc::new(FailingProvider {
            calls: AtomicU32::new(0),
        });
        let config = AggregatorConfig {
            max_retries: 0,
            ..AggregatorConfig::default()
        };
        let agg = aggregator(vec![good, bad], config);

        let result = agg.search(&request()).await;
        assert_eq!(result.providers_succeeded, 1);
        assert_eq!(result.providers_failed, 1);
        assert_eq!(result.failed_providers, vec!["flaky".to_string()]);
        assert_eq!(result.flights.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_cap_bounds_upstream_calls() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicU32::new(0),
        });
        let config = AggregatorConfig {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_delays: vec![Duration::from_millis(1)],
        };
        let agg = aggregator(vec![provider.clone()], config);

        let result = agg.search(&request()).await;
        assert_eq!(result.providers_failed, 1);
        // max_retries = 3 means at most four tries in total.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_timeout_shorter_than_latency_fails_all() {
        let providers: Vec<Arc<dyn FlightProvider>> = vec![Arc::new(SlowProvider), Arc::new(SlowProvider)];
        let config = AggregatorConfig {
            timeout: Duration::from_millis(20),
            max_retries: 1,
            retry_delays: vec![Duration::from_millis(10)],
        };
        let agg = aggregator(providers, config);

        let result = agg.search(&request()).await;
        assert_eq!(result.providers_queried, 2);
        assert_eq!(result.providers_succeeded, 0);
        assert_eq!(result.providers_failed, 2);
        assert!(result.flights.is_empty());
    }

    #[tokio::test]
    async fn test_empty_provider_set() {
        let agg = aggregator(Vec::new(), AggregatorConfig::default());
        let result = agg.search(&request()).await;
        assert_eq!(result.providers_queried, 0);
        assert_eq!(result.providers_succeeded, 0);
        assert!(result.flights.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_runs_both_legs() {
        let a = StubProvider::new("a", vec![flight("a-1")]);
        let mut req = request();
        req.return_date = Some("2025-12-20".to_string());

        let agg = aggregator(vec![a], AggregatorConfig::default());
        let (outbound, return_result) = agg.search_round_trip(&req).await;

        assert_eq!(outbound.providers_queried, 1);
        let return_result = return_result.expect("round trip should produce a return leg");
        assert_eq!(return_result.providers_queried, 1);
    }

    #[tokio::test]
    async fn test_round_trip_without_return_date_is_one_way() {
        let a = StubProvider::new("a", vec![flight("a-1")]);
        let agg = aggregator(vec![a], AggregatorConfig::default());
        let (outbound, return_result) = agg.search_round_trip(&request()).await;

        assert_eq!(outbound.providers_succeeded, 1);
        assert!(return_result.is_none());
    }
}
