//! Incident and timeline event records.

use serde::{Deserialize, Serialize};

/// One terminal or ongoing supervised-process outcome, as recorded by the
/// controller.
///
/// All numeric fields default to 0 and all string fields to empty; the
/// normalizer guarantees no null survives into this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Stable id assigned by the controller, unique within a snapshot
    pub id: i64,
    pub timestamp: String,
    pub command: String,
    pub model_name: String,
    /// Wire value kept verbatim; see [`ExitReason::classify`]
    pub exit_reason: String,
    /// Peak CPU percentage observed for the run
    pub max_cpu: f64,
    /// Normalized log pattern, empty when none was extracted
    pub pattern: String,
    pub token_savings_estimate: f64,
    pub reason: String,
    pub cpu_score: f64,
    pub entropy_score: f64,
    pub confidence_score: f64,
    pub recovery_status: String,
    pub restart_count: f64,
}

/// Classified exit reason. The wire field is free-form; only the variants the
/// console reacts to are distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Success,
    LoopDetected,
    WatchdogAlert,
    SafetyLimitExceeded,
    Other,
}

impl ExitReason {
    pub fn classify(raw: &str) -> Self {
        match raw {
            "SUCCESS" => ExitReason::Success,
            "LOOP_DETECTED" => ExitReason::LoopDetected,
            "WATCHDOG_ALERT" => ExitReason::WatchdogAlert,
            "SAFETY_LIMIT_EXCEEDED" => ExitReason::SafetyLimitExceeded,
            _ => ExitReason::Other,
        }
    }

    /// True when the controller took (or flagged) an action for this run.
    pub fn is_actioned(self) -> bool {
        matches!(
            self,
            ExitReason::LoopDetected | ExitReason::WatchdogAlert | ExitReason::SafetyLimitExceeded
        )
    }
}

impl Incident {
    pub fn exit_reason(&self) -> ExitReason {
        ExitReason::classify(&self.exit_reason)
    }
}

/// A point-in-time occurrence, optionally correlated to an incident.
///
/// `event_type` and `timestamp` are mandatory on the wire; an event missing
/// either is dropped during normalization. Optional numerics stay `None` so
/// "absent" is distinguishable from an explicit zero downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub event_id: String,
    pub run_id: String,
    /// Correlation key; empty when the event is uncorrelated
    pub incident_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: String,
    pub title: String,
    pub summary: String,
    pub reason: String,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    /// Opaque evidence mapping, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Expanded form of a timeline event scoped to one incident, as served by the
/// chain endpoint. `event_type`/`created_at`/`reason_text` are canonical;
/// `type`/`timestamp`/`reason` are kept as compatibility aliases and always
/// populated from the canonical fields when the wire omits them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentChainEvent {
    pub id: i64,
    pub event_id: String,
    pub run_id: String,
    pub incident_id: String,
    pub event_type: String,
    pub actor: String,
    pub reason_text: String,
    pub created_at: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub compat_type: String,
    pub title: String,
    pub summary: String,
    pub reason: String,
    pub pid: f64,
    pub cpu_score: f64,
    pub entropy_score: f64,
    pub confidence_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Map<String, serde_json::Value>>,
}
