//! Lifecycle SLO snapshot and replay-ledger history.

use serde::{Deserialize, Serialize};

/// Replay-ledger row count above which the SLO verdict flips to "at risk".
pub const REPLAY_ROW_CAP: f64 = 50_000.0;

/// Derived view over the metrics exposition endpoint; never stored, rebuilt on
/// every metrics poll. Each field has a conservative default used when the
/// named series is absent (targets keep their documented values, counters 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SloSnapshot {
    pub stop_target_seconds: f64,
    pub restart_target_seconds: f64,
    pub stop_compliance_ratio: f64,
    pub restart_compliance_ratio: f64,
    pub stop_last_seconds: f64,
    pub restart_last_seconds: f64,
    pub restart_budget_blocks: f64,
    pub idempotency_conflicts: f64,
    pub idempotency_replays: f64,
    pub replay_rows: f64,
    pub replay_oldest_age_seconds: f64,
    pub replay_stats_error: f64,
}

impl Default for SloSnapshot {
    fn default() -> Self {
        Self {
            stop_target_seconds: 3.0,
            restart_target_seconds: 5.0,
            stop_compliance_ratio: 0.0,
            restart_compliance_ratio: 0.0,
            stop_last_seconds: 0.0,
            restart_last_seconds: 0.0,
            restart_budget_blocks: 0.0,
            idempotency_conflicts: 0.0,
            idempotency_replays: 0.0,
            replay_rows: 0.0,
            replay_oldest_age_seconds: 0.0,
            replay_stats_error: 0.0,
        }
    }
}

impl SloSnapshot {
    /// "On track" requires all five conditions; any single violation flips the
    /// verdict to "at risk".
    pub fn on_track(&self) -> bool {
        self.stop_compliance_ratio >= 0.95
            && self.restart_compliance_ratio >= 0.95
            && self.idempotency_conflicts <= 0.0
            && self.replay_rows <= REPLAY_ROW_CAP
            && self.replay_stats_error == 0.0
    }
}

/// One day of replay/conflict activity. Counts are non-negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayHistoryPoint {
    pub day: String,
    pub replay_events: f64,
    pub conflict_events: f64,
}

/// Bounded lookback window over the replay ledger, used only for trend display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayHistory {
    pub days: u32,
    pub row_count: f64,
    pub oldest_age_seconds: f64,
    pub newest_age_seconds: f64,
    pub points: Vec<ReplayHistoryPoint>,
}

impl Default for ReplayHistory {
    fn default() -> Self {
        Self {
            days: 7,
            row_count: 0.0,
            oldest_age_seconds: 0.0,
            newest_age_seconds: 0.0,
            points: Vec::new(),
        }
    }
}
