use crate::config::{CircuitBreakerConfig, TripCondition};
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// Calls flow through and outcomes are counted.
    Closed = 0,
    /// Calls are rejected until the break duration elapses.
    Open = 1,
    /// A single trial call decides whether to close or re-open.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    #[cfg(feature = "metrics")]
    fn label(self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

/// Admission granted by [`Circuit::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Permit {
    /// Ordinary call through a closed circuit.
    Normal,
    /// The single half-open trial.
    Trial,
}

#[derive(Debug, Clone, Copy)]
struct CallRecord {
    at: tokio::time::Instant,
    is_failure: bool,
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    opened_at: tokio::time::Instant,
    consecutive_failures: usize,
    records: VecDeque<CallRecord>,
    trial_in_flight: bool,
}

impl Circuit {
    pub(crate) fn new(state_atomic: Arc<AtomicU8>) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            state: CircuitState::Closed,
            state_atomic,
            opened_at: tokio::time::Instant::now(),
            consecutive_failures: 0,
            records: VecDeque::new(),
            trial_in_flight: false,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> Option<Permit> {
        match self.state {
            CircuitState::Closed => Some(Permit::Normal),
            CircuitState::Open => {
                if self.opened_at.elapsed() >= config.break_duration {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.trial_in_flight = true;
                    Some(Permit::Trial)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    None
                } else {
                    self.trial_in_flight = true;
                    Some(Permit::Trial)
                }
            }
        }
    }

    /// Records the outcome of a call admitted with `permit`.
    pub(crate) fn record(&mut self, permit: Permit, failed: bool, config: &CircuitBreakerConfig) {
        let event = if failed {
            CircuitBreakerEvent::FailureRecorded {
                policy_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            }
        } else {
            CircuitBreakerEvent::SuccessRecorded {
                policy_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            }
        };
        config.event_listeners.emit(&event);

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_calls_total",
            "circuitbreaker" => config.name.clone(),
            "outcome" => if failed { "failure" } else { "success" }
        )
        .increment(1);

        match (permit, self.state) {
            (Permit::Trial, CircuitState::HalfOpen) => {
                self.trial_in_flight = false;
                let next = if failed {
                    CircuitState::Open
                } else {
                    CircuitState::Closed
                };
                self.transition_to(next, config);
            }
            (Permit::Normal, CircuitState::Closed) => self.record_closed(failed, config),
            // Outcomes of calls admitted under an earlier state are stale.
            _ => {}
        }
    }

    /// Frees the trial slot when the trial call was dropped before finishing.
    pub(crate) fn release_trial(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.trial_in_flight = false;
        }
    }

    fn record_closed(&mut self, failed: bool, config: &CircuitBreakerConfig) {
        match &config.trip {
            TripCondition::ConsecutiveFailures { fault_tolerance } => {
                if !failed {
                    self.consecutive_failures = 0;
                    return;
                }
                self.consecutive_failures += 1;
                if self.consecutive_failures >= *fault_tolerance {
                    self.transition_to(CircuitState::Open, config);
                }
            }
            TripCondition::FailureRate {
                failure_threshold,
                sampling_duration,
                minimum_throughput,
            } => {
                let now = tokio::time::Instant::now();
                self.prune(now, *sampling_duration);
                self.records.push_back(CallRecord {
                    at: now,
                    is_failure: failed,
                });
                if !failed {
                    return;
                }

                let total = self.records.len();
                let failures = self.records.iter().filter(|r| r.is_failure).count();
                if total >= (*minimum_throughput).max(1)
                    && failures as f64 / total as f64 >= *failure_threshold
                {
                    self.transition_to(CircuitState::Open, config);
                }
            }
        }
    }

    fn prune(&mut self, now: tokio::time::Instant, window: Duration) {
        while let Some(record) = self.records.front() {
            if now.duration_since(record.at) >= window {
                self.records.pop_front();
            } else {
                break;
            }
        }
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                policy_name: config.name.clone(),
                timestamp: Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(circuitbreaker = %config.name, from = ?from_state, to = ?state, "Circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from_state.label(),
                "to" => state.label()
            )
            .increment(1);
            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone())
                .set(state as u8 as f64);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        if state == CircuitState::Open {
            self.opened_at = tokio::time::Instant::now();
        }
        self.consecutive_failures = 0;
        self.records.clear();
        self.trial_in_flight = false;
    }
}
