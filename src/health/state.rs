//! Collector health state machine.
//!
//! # States
//! - Unavailable: starting up, not yet accepting traffic
//! - Ready: every synchronous startup step succeeded
//! - Failed: a front-end stopped after startup
//!
//! # State Transitions
//! ```text
//! Unavailable → Ready
//! Ready       → Failed
//! Unavailable → Failed   (only with early failure enabled)
//! ```
//!
//! Early failure is enabled when startup waits for HTTP binds, so a front-end
//! that cannot bind fails the collector before it was ever Ready.
//!
//! Nothing returns to Unavailable and Failed is terminal. Setting the current
//! status again is a no-op.

use std::sync::Mutex;

use axum::http::StatusCode;
use thiserror::Error;

use crate::observability::metrics;

/// Process-wide readiness indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Unavailable,
    Ready,
    Failed,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unavailable => "unavailable",
            HealthStatus::Ready => "ready",
            HealthStatus::Failed => "failed",
        }
    }

    /// Whether moving from `self` to `next` is always allowed.
    pub fn can_transition_to(self, next: HealthStatus) -> bool {
        matches!(
            (self, next),
            (HealthStatus::Unavailable, HealthStatus::Ready)
                | (HealthStatus::Ready, HealthStatus::Failed)
        )
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("health status cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: HealthStatus,
    pub to: HealthStatus,
}

struct Inner {
    status: HealthStatus,
    history: Vec<HealthStatus>,
}

/// Shared, monotonic health state.
///
/// Safe to update from several tasks at once; the check and the update
/// happen under one lock.
pub struct HealthState {
    inner: Mutex<Inner>,
    ready_code: StatusCode,
    early_failure: bool,
}

impl HealthState {
    pub fn new(initial: HealthStatus, ready_code: StatusCode) -> Self {
        metrics::record_health_status(initial);
        Self {
            inner: Mutex::new(Inner {
                status: initial,
                history: vec![initial],
            }),
            ready_code,
            early_failure: false,
        }
    }

    /// Also allow Unavailable → Failed.
    pub fn with_early_failure(mut self, allowed: bool) -> Self {
        self.early_failure = allowed;
        self
    }

    pub fn status(&self) -> HealthStatus {
        self.lock().status
    }

    /// Every status held so far, oldest first.
    pub fn history(&self) -> Vec<HealthStatus> {
        self.lock().history.clone()
    }

    /// Move to `next` if the transition table allows it.
    pub fn set(&self, next: HealthStatus) -> Result<(), TransitionError> {
        let mut inner = self.lock();
        let current = inner.status;
        if current == next {
            return Ok(());
        }
        let early = self.early_failure
            && current == HealthStatus::Unavailable
            && next == HealthStatus::Failed;
        if !early && !current.can_transition_to(next) {
            return Err(TransitionError {
                from: current,
                to: next,
            });
        }

        inner.status = next;
        inner.history.push(next);
        drop(inner);

        metrics::record_health_status(next);
        tracing::info!(from = %current, to = %next, "Health status changed");
        Ok(())
    }

    /// HTTP status code served for the current status.
    pub fn status_code(&self) -> StatusCode {
        match self.status() {
            HealthStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            HealthStatus::Ready => self.ready_code,
            HealthStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock still holds a consistent status; every write is a
        // single assignment plus push.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> HealthState {
        HealthState::new(HealthStatus::Unavailable, StatusCode::OK)
    }

    #[test]
    fn codes_follow_status() {
        let state = HealthState::new(HealthStatus::Unavailable, StatusCode::NO_CONTENT);
        assert_eq!(state.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        state.set(HealthStatus::Ready).unwrap();
        assert_eq!(state.status_code(), StatusCode::NO_CONTENT);

        state.set(HealthStatus::Failed).unwrap();
        assert_eq!(state.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn ready_never_returns_to_unavailable() {
        let state = state();
        state.set(HealthStatus::Ready).unwrap();

        let err = state.set(HealthStatus::Unavailable).unwrap_err();
        assert_eq!(err.from, HealthStatus::Ready);
        assert_eq!(state.status(), HealthStatus::Ready);
    }

    #[test]
    fn early_failure_needs_opt_in() {
        let strict = state();
        let err = strict.set(HealthStatus::Failed).unwrap_err();
        assert_eq!(err.from, HealthStatus::Unavailable);
        assert_eq!(strict.status(), HealthStatus::Unavailable);

        let early = state().with_early_failure(true);
        early.set(HealthStatus::Failed).unwrap();
        assert_eq!(early.status(), HealthStatus::Failed);
    }

    #[test]
    fn failed_is_terminal() {
        let state = state().with_early_failure(true);
        state.set(HealthStatus::Failed).unwrap();

        assert!(state.set(HealthStatus::Ready).is_err());
        assert!(state.set(HealthStatus::Unavailable).is_err());
        assert_eq!(state.status(), HealthStatus::Failed);
        assert_eq!(
            state.history(),
            vec![HealthStatus::Unavailable, HealthStatus::Failed]
        );
    }

    #[test]
    fn repeated_status_is_a_no_op() {
        let state = state();
        state.set(HealthStatus::Ready).unwrap();
        state.set(HealthStatus::Ready).unwrap();

        assert_eq!(
            state.history(),
            vec![HealthStatus::Unavailable, HealthStatus::Ready]
        );
    }

    #[test]
    fn concurrent_writers_keep_order_monotonic() {
        let state = std::sync::Arc::new(state());
        state.set(HealthStatus::Ready).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                std::thread::spawn(move || {
                    let next = if i % 2 == 0 {
                        HealthStatus::Ready
                    } else {
                        HealthStatus::Failed
                    };
                    let _ = state.set(next);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(state.status(), HealthStatus::Failed);
        let history = state.history();
        for pair in history.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]));
        }
    }
}
