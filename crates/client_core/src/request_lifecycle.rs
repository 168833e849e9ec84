//! Single-category request lifecycle: Idle -> Pending -> Succeeded | Failed.
//!
//! Each `run` takes a fresh generation. Completions belonging to a generation that
//! has since been superseded are dropped and never published. A run dropped while
//! still current settles as `Failed` instead of staying Pending.

use std::{
    fmt,
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::{
    sync::watch,
    time::{self, Instant},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCategory {
    Optimize,
    Report,
}

impl fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestCategory::Optimize => f.write_str("optimize"),
            RequestCategory::Report => f.write_str("report"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending {
        started_at: Instant,
    },
    Succeeded(T),
    Failed(String),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Idle
    }
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            RequestState::Succeeded(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Published as `Failed` when a pending run's future is dropped before it settles.
pub const RUN_CANCELLED_MESSAGE: &str = "Request was cancelled before it completed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
    /// A newer run (or reset) took over before this one completed.
    Superseded,
}

pub struct RequestLifecycleController<T> {
    category: RequestCategory,
    generation: AtomicU64,
    state: watch::Sender<RequestState<T>>,
}

impl<T> RequestLifecycleController<T> {
    pub fn new(category: RequestCategory) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            category,
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn category(&self) -> RequestCategory {
        self.category
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(str::to_owned)
    }

    /// Drops any terminal state and invalidates whatever run is in flight.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = RequestState::Idle;
        });
        debug!(category = %self.category, "request state reset");
    }

    /// Executes `operation` once, publishing Pending immediately and the terminal
    /// state when it completes. Success is held back until `min_duration` has
    /// elapsed since Pending; failure is published at once.
    pub async fn run<F, E>(&self, operation: F, min_duration: Duration) -> RunOutcome
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let (generation, started_at) = self.begin();
        let mut guard = PendingRun {
            controller: self,
            generation,
            settled: false,
        };

        let outcome = match operation.await {
            Ok(payload) => {
                if !self.is_current(generation) {
                    return self.discard(generation);
                }
                let deadline = started_at + min_duration;
                if Instant::now() < deadline {
                    debug!(
                        category = %self.category,
                        generation,
                        wait_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
                        "holding result until minimum duration"
                    );
                    time::sleep_until(deadline).await;
                }
                if self.publish(generation, RequestState::Succeeded(payload)) {
                    info!(
                        category = %self.category,
                        generation,
                        elapsed_ms = started_at.elapsed().as_millis() as u64,
                        "request succeeded"
                    );
                    RunOutcome::Succeeded
                } else {
                    self.discard(generation)
                }
            }
            Err(err) => {
                let message = err.to_string();
                if self.publish(generation, RequestState::Failed(message.clone())) {
                    warn!(category = %self.category, generation, error = %message, "request failed");
                    RunOutcome::Failed
                } else {
                    self.discard(generation)
                }
            }
        };
        guard.settled = true;
        outcome
    }

    fn begin(&self) -> (u64, Instant) {
        let started_at = Instant::now();
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = RequestState::Pending { started_at };
        });
        debug!(category = %self.category, generation, "request pending");
        (generation, started_at)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Generation check and write happen under the channel lock, so a newer
    /// Pending can never be overwritten by an older completion.
    fn publish(&self, generation: u64, next: RequestState<T>) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = next;
            true
        })
    }

    fn discard(&self, generation: u64) -> RunOutcome {
        debug!(
            category = %self.category,
            generation,
            current = self.generation.load(Ordering::SeqCst),
            "dropping superseded completion"
        );
        RunOutcome::Superseded
    }
}

/// Settles a run whose future is dropped mid-flight (timeout, `select!`, task abort).
struct PendingRun<'a, T> {
    controller: &'a RequestLifecycleController<T>,
    generation: u64,
    settled: bool,
}

impl<T> Drop for PendingRun<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let controller = self.controller;
        let cancelled = RequestState::Failed(RUN_CANCELLED_MESSAGE.to_string());
        if controller.publish(self.generation, cancelled) {
            warn!(
                category = %controller.category,
                generation = self.generation,
                "request dropped while pending"
            );
        }
    }
}

impl<T: Clone> RequestLifecycleController<T> {
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn payload(&self) -> Option<T> {
        self.state.borrow().payload().cloned()
    }
}

#[cfg(test)]
#[path = "tests/request_lifecycle_tests.rs"]
mod tests;
