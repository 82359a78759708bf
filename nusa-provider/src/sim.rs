use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};

use crate::ProviderError;

/// Network behavior model for the simulated providers: a bounded random
/// response delay and an optional transient-failure probability. Real
/// adapters would replace this with actual I/O.
pub struct Simulation {
    latency_min_ms: u64,
    latency_max_ms: u64,
    failure_rate: f64,
    rng: Mutex<fastrand::Rng>,
}

impl Simulation {
    pub fn new(latency_min_ms: u64, latency_max_ms: u64) -> Self {
        Self {
            latency_min_ms,
            latency_max_ms,
            failure_rate: 0.0,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// A simulation that answers immediately and never fails. Useful in
    /// tests that exercise pipeline logic rather than timing.
    pub fn instant() -> Self {
        Self::new(0, 0)
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }

    /// Fixes the RNG seed so latency draws and failure rolls are
    /// reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            ..self
        }
    }

    /// Sleeps for one latency draw, racing the deadline.
    pub async fn hold(&self, deadline: Instant) -> Result<(), ProviderError> {
        if Instant::now() >= deadline {
            return Err(ProviderError::DeadlineExceeded);
        }

        let delay_ms = {
            let mut rng = self.rng.lock().expect("simulation rng lock");
            rng.u64(self.latency_min_ms..=self.latency_max_ms)
        };

        tokio::select! {
            _ = sleep(Duration::from_millis(delay_ms)) => Ok(()),
            _ = sleep_until(deadline) => Err(ProviderError::DeadlineExceeded),
        }
    }

    /// Rolls the transient-failure dice once.
    pub fn roll_failure(&self) -> bool {
        if self.failure_rate <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().expect("simulation rng lock");
        rng.f64() < self.failure_rate
    }
}
