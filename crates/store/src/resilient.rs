//! Circuit-breaker wrapper around a backend store.
//!
//! Enforces a per-call timeout and sheds load by failing fast once the
//! failure rate over a rolling window crosses a threshold. After a reset
//! period a single probe call is let through (half-open); its outcome
//! decides whether the circuit closes again or re-opens.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::op::{DataStore, Operation, Outcome};

/// Breaker tuning. Defaults match the original deployment: 10s call
/// timeout, 50% failure threshold over a 10s rolling window, 30s reset.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub call_timeout: Duration,
    /// Failure fraction (0.0..=1.0) at which the circuit opens.
    pub failure_rate_threshold: f64,
    /// Minimum calls in the window before the rate is considered.
    pub min_calls: usize,
    pub rolling_window: Duration,
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            failure_rate_threshold: 0.5,
            min_calls: 5,
            rolling_window: Duration::from_secs(10),
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { since: Instant },
    HalfOpen { probe_in_flight: bool },
}

#[derive(Debug)]
struct Breaker {
    state: State,
    /// (when, failed) per completed call, pruned to the rolling window.
    window: VecDeque<(Instant, bool)>,
}

/// [`DataStore`] decorator adding timeout + circuit breaking.
#[derive(Debug)]
pub struct ResilientStore<S> {
    inner: S,
    config: BreakerConfig,
    breaker: Mutex<Breaker>,
}

impl<S> ResilientStore<S> {
    pub fn new(inner: S, config: BreakerConfig) -> Self {
        Self {
            inner,
            config,
            breaker: Mutex::new(Breaker {
                state: State::Closed,
                window: VecDeque::new(),
            }),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether the circuit is currently open (monitoring hook).
    pub fn is_open(&self) -> bool {
        self.breaker
            .lock()
            .map(|b| matches!(b.state, State::Open { .. }))
            .unwrap_or(true)
    }

    /// Admission check; transitions Open -> HalfOpen after the reset period.
    fn admit(&self) -> Result<(), StoreError> {
        let mut breaker = self
            .breaker
            .lock()
            .map_err(|_| StoreError::Internal("breaker lock poisoned".to_string()))?;

        match breaker.state {
            State::Closed => Ok(()),
            State::Open { since } => {
                if since.elapsed() >= self.config.reset_timeout {
                    tracing::info!("storage circuit breaker half-open; letting one probe through");
                    breaker.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    Ok(())
                } else {
                    Err(StoreError::CircuitOpen)
                }
            }
            State::HalfOpen { probe_in_flight } => {
                if probe_in_flight {
                    Err(StoreError::CircuitOpen)
                } else {
                    breaker.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    Ok(())
                }
            }
        }
    }

    fn record(&self, failed: bool) {
        let Ok(mut breaker) = self.breaker.lock() else {
            return;
        };

        match breaker.state {
            State::HalfOpen { .. } => {
                if failed {
                    tracing::warn!("storage circuit breaker re-opened after failed probe");
                    breaker.state = State::Open {
                        since: Instant::now(),
                    };
                } else {
                    tracing::info!("storage circuit breaker closed");
                    breaker.state = State::Closed;
                    breaker.window.clear();
                }
            }
            State::Closed => {
                let now = Instant::now();
                breaker.window.push_back((now, failed));
                let horizon = self.config.rolling_window;
                while let Some((at, _)) = breaker.window.front() {
                    if now.duration_since(*at) > horizon {
                        breaker.window.pop_front();
                    } else {
                        break;
                    }
                }

                let total = breaker.window.len();
                let failures = breaker.window.iter().filter(|(_, f)| *f).count();
                if total >= self.config.min_calls
                    && failures as f64 / total as f64 >= self.config.failure_rate_threshold
                {
                    tracing::warn!(
                        failures,
                        total,
                        "storage circuit breaker OPEN; shedding load"
                    );
                    breaker.state = State::Open {
                        since: Instant::now(),
                    };
                }
            }
            State::Open { .. } => {}
        }
    }
}

#[async_trait]
impl<S: DataStore> DataStore for ResilientStore<S> {
    async fn execute<E: Entity>(&self, op: Operation<E>) -> Result<Outcome<E>, StoreError> {
        self.admit()?;

        let result = match tokio::time::timeout(self.config.call_timeout, self.inner.execute(op))
            .await
        {
            Ok(inner_result) => inner_result,
            Err(_elapsed) => Err(StoreError::Timeout),
        };

        self.record(result.is_err());
        result
    }
}
