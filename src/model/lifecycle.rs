//! Worker lifecycle and live push-stream payloads.

use serde::{Deserialize, Serialize};

/// Current phase of the managed process's lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecyclePhase {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
    /// No snapshot has arrived yet, or the wire value was unrecognized
    #[default]
    Unknown,
}

impl LifecyclePhase {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "STOPPED" => LifecyclePhase::Stopped,
            "STARTING" => LifecyclePhase::Starting,
            "RUNNING" => LifecyclePhase::Running,
            "STOPPING" => LifecyclePhase::Stopping,
            "FAILED" => LifecyclePhase::Failed,
            _ => LifecyclePhase::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecyclePhase::Stopped => "STOPPED",
            LifecyclePhase::Starting => "STARTING",
            LifecyclePhase::Running => "RUNNING",
            LifecyclePhase::Stopping => "STOPPING",
            LifecyclePhase::Failed => "FAILED",
            LifecyclePhase::Unknown => "UNKNOWN",
        }
    }

    /// Restart is offered only from a terminal phase with a known last command.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecyclePhase::Stopped | LifecyclePhase::Failed)
    }
}

/// Snapshot of the worker lifecycle endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSnapshot {
    #[serde(with = "phase_string")]
    pub phase: LifecyclePhase,
    pub operation: String,
    pub pid: i64,
    pub managed: bool,
    pub last_error: String,
    pub status: String,
    pub lifecycle: String,
    /// Last command the controller ran; needed to offer "restart"
    pub command: String,
    pub timestamp: f64,
}

/// Serialize the phase as the controller's upper-case wire string and accept
/// anything on the way in (unrecognized values map to `Unknown`).
mod phase_string {
    use super::LifecyclePhase;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(phase: &LifecyclePhase, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(phase.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LifecyclePhase, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(LifecyclePhase::parse(&raw))
    }
}

/// Push-stream payload delivered over SSE.
///
/// `status` is a superset of the lifecycle phases plus transient alert states
/// such as `LOOP_DETECTED` and `WATCHDOG_ALERT`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveStats {
    pub cpu: f64,
    pub last_line: String,
    pub status: String,
    pub command: String,
    pub pid: i64,
}
