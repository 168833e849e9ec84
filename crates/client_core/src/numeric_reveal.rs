//! Count-up animation for displayed metric values.
//!
//! The stepping logic is pure (`next_value`, `RevealSequence`); `NumericRevealAnimator`
//! only drives it from a tokio interval. Displayed values never feed back into the
//! data model.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use shared::domain::{MetricKind, ProcessMetrics};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time,
};
use tracing::debug;

pub const DEFAULT_TICK: Duration = Duration::from_millis(16);

/// Advances `current` by `increment`, clamping to `target` once it is reached.
pub fn next_value(current: f64, target: f64, increment: f64) -> f64 {
    let next = current + increment;
    if next >= target {
        target
    } else {
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealPlan {
    pub target: f64,
    pub duration: Duration,
    pub tick: Duration,
}

impl RevealPlan {
    pub fn new(target: f64, duration: Duration, tick: Duration) -> Self {
        Self {
            target,
            duration,
            tick,
        }
    }

    /// Per-tick step, or `None` when the plan should jump straight to its target.
    pub fn increment(&self) -> Option<f64> {
        if !self.target.is_finite() || self.tick.is_zero() {
            return None;
        }
        let ticks = self.duration.as_secs_f64() / self.tick.as_secs_f64();
        let increment = self.target / ticks;
        (increment.is_finite() && increment > 0.0).then_some(increment)
    }

    pub fn sequence(&self) -> RevealSequence {
        RevealSequence {
            current: 0.0,
            target: self.target,
            increment: self.increment(),
            finished: false,
        }
    }
}

/// Values shown after each successive tick; the last item is exactly the target.
#[derive(Debug, Clone)]
pub struct RevealSequence {
    current: f64,
    target: f64,
    increment: Option<f64>,
    finished: bool,
}

impl Iterator for RevealSequence {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.finished {
            return None;
        }
        self.current = match self.increment {
            Some(increment) => next_value(self.current, self.target, increment),
            None => self.target,
        };
        if self.current == self.target {
            self.finished = true;
        }
        Some(self.current)
    }
}

pub struct NumericRevealAnimator {
    tick: Duration,
    displayed: Arc<watch::Sender<f64>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl NumericRevealAnimator {
    pub fn new(tick: Duration) -> Self {
        let (displayed, _) = watch::channel(0.0);
        Self {
            tick,
            displayed: Arc::new(displayed),
            ticker: Mutex::new(None),
        }
    }

    pub fn displayed(&self) -> f64 {
        *self.displayed.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.displayed.subscribe()
    }

    /// Restarts from 0 towards `target`; any running animation is abandoned.
    pub async fn animate(&self, target: f64, duration: Duration) {
        let mut ticker = self.ticker.lock().await;
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
        self.displayed.send_replace(0.0);

        let plan = RevealPlan::new(target, duration, self.tick);
        if plan.increment().is_none() {
            self.displayed.send_replace(target);
            return;
        }

        let displayed = Arc::clone(&self.displayed);
        let tick = self.tick;
        *ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval(tick);
            // The first tick completes immediately.
            interval.tick().await;
            for value in plan.sequence() {
                interval.tick().await;
                displayed.send_replace(value);
            }
        }));
    }

    /// Stops any animation and shows 0.
    pub async fn clear(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
        self.displayed.send_replace(0.0);
    }
}

impl Drop for NumericRevealAnimator {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

/// One independent animator per displayed metric.
pub struct MetricReveals {
    animators: BTreeMap<MetricKind, NumericRevealAnimator>,
}

impl MetricReveals {
    pub fn new(tick: Duration) -> Self {
        Self {
            animators: MetricKind::ALL
                .into_iter()
                .map(|kind| (kind, NumericRevealAnimator::new(tick)))
                .collect(),
        }
    }

    pub fn get(&self, kind: MetricKind) -> Option<&NumericRevealAnimator> {
        self.animators.get(&kind)
    }

    pub async fn animate_all(&self, metrics: &ProcessMetrics, duration: Duration) {
        debug!(duration_ms = duration.as_millis() as u64, "revealing metrics");
        for (kind, target) in metrics.iter() {
            if let Some(animator) = self.animators.get(&kind) {
                animator.animate(target, duration).await;
            }
        }
    }

    pub async fn clear_all(&self) {
        for animator in self.animators.values() {
            animator.clear().await;
        }
    }

    pub fn displayed(&self) -> BTreeMap<MetricKind, f64> {
        self.animators
            .iter()
            .map(|(kind, animator)| (*kind, animator.displayed()))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/numeric_reveal_tests.rs"]
mod tests;
