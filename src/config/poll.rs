//! Polling cadence and timeout configuration.

use serde::{Deserialize, Serialize};

/// Per-resource polling intervals and the shared request timeout.
///
/// Defaults mirror the cadence the controller's own dashboard uses: fast
/// lifecycle polling, slower trend data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between incidents polls
    pub incidents_interval_seconds: u64,
    /// Seconds between timeline polls
    pub timeline_interval_seconds: u64,
    /// Seconds between lifecycle polls
    pub lifecycle_interval_seconds: u64,
    /// Seconds between metrics polls
    pub metrics_interval_seconds: u64,
    /// Seconds between replay-history polls
    pub replay_interval_seconds: u64,
    /// Seconds between incident-chain polls (active only while an incident is
    /// selected)
    pub chain_interval_seconds: u64,
    /// Lookback window requested from the replay-history endpoint
    pub replay_window_days: u32,
    /// Per-request timeout; a timeout is an ordinary resource-scoped failure
    pub timeout_seconds: u64,
    /// Seconds to wait before re-opening a dropped push-stream subscription
    pub stream_reconnect_seconds: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            incidents_interval_seconds: 2,
            timeline_interval_seconds: 3,
            lifecycle_interval_seconds: 1,
            metrics_interval_seconds: 3,
            replay_interval_seconds: 10,
            chain_interval_seconds: 3,
            replay_window_days: 7,
            timeout_seconds: 10,
            stream_reconnect_seconds: 1,
        }
    }
}
