use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing policy for the interaction controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Minimum time the optimize request stays visibly pending.
    pub optimize_min_duration_ms: u64,
    pub report_min_duration_ms: u64,
    pub reveal_duration_ms: u64,
    pub reveal_tick_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            optimize_min_duration_ms: 1_800,
            report_min_duration_ms: 0,
            reveal_duration_ms: 1_200,
            reveal_tick_ms: 16,
        }
    }
}

impl ControllerSettings {
    pub fn optimize_min_duration(&self) -> Duration {
        Duration::from_millis(self.optimize_min_duration_ms)
    }

    pub fn report_min_duration(&self) -> Duration {
        Duration::from_millis(self.report_min_duration_ms)
    }

    pub fn reveal_duration(&self) -> Duration {
        Duration::from_millis(self.reveal_duration_ms)
    }

    /// Never zero; tokio intervals reject a zero period.
    pub fn reveal_tick(&self) -> Duration {
        Duration::from_millis(self.reveal_tick_ms.max(1))
    }
}
