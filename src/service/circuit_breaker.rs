use crate::error::LookupError;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Consecutive-failure circuit breaker shared by every lookup.
///
/// Closed: calls pass, failures are counted. After `threshold` consecutive
/// failures the circuit opens and calls fail fast with
/// [`LookupError::CircuitOpen`]. Once `timeout` has elapsed it half-opens:
/// calls pass again, the first success closes it and the first failure
/// re-opens it.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, timeout: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Ask permission to call the protected service.
    pub fn try_acquire(&self) -> Result<(), LookupError> {
        let mut inner = self.lock();
        if inner.state == CircuitState::Open {
            let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or(self.timeout);
            if elapsed < self.timeout {
                return Err(LookupError::CircuitOpen);
            }
            inner.state = CircuitState::HalfOpen;
            info!("circuit breaker transitioning to half-open state");
        }
        Ok(())
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            info!("circuit breaker reset to closed state");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        let trip = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.threshold;
        if trip {
            if inner.state != CircuitState::Open {
                warn!(
                    failures = inner.consecutive_failures,
                    "circuit breaker opened"
                );
            }
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    /// Run `f` under the breaker. Only service-health failures count against it.
    pub async fn call<F, Fut, T>(&self, f: F) -> Result<T, LookupError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        self.try_acquire()?;
        let result = f().await;
        match &result {
            Err(e) if e.is_service_failure() => self.record_failure(),
            _ => self.record_success(),
        }
        result
    }
}
