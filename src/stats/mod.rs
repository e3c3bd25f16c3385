//! Headline derivations over an incidents snapshot.
//!
//! Pure functions the presentation layer reads for its stat cards and the
//! "why the controller acted" panel.

use crate::model::{ExitReason, Incident, ReplayHistoryPoint};

/// Confidence band for the latest actioned incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn classify(confidence_score: f64) -> Self {
        if confidence_score >= 85.0 {
            ConfidenceBand::High
        } else if confidence_score >= 65.0 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceBand::High => "High certainty",
            ConfidenceBand::Medium => "Medium certainty",
            ConfidenceBand::Low => "Low certainty",
        }
    }
}

/// Aggregates over one incidents snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentStats {
    pub total_incidents: usize,
    /// Incidents with exit reason `LOOP_DETECTED`
    pub loops_prevented: usize,
    /// Summed token-savings estimate across the snapshot
    pub total_savings: f64,
    /// First incident in snapshot order with an actioned exit reason
    pub latest_actioned: Option<Incident>,
}

impl IncidentStats {
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        Self {
            total_incidents: incidents.len(),
            loops_prevented: incidents
                .iter()
                .filter(|i| i.exit_reason() == ExitReason::LoopDetected)
                .count(),
            total_savings: incidents.iter().map(|i| i.token_savings_estimate).sum(),
            latest_actioned: incidents
                .iter()
                .find(|i| i.exit_reason().is_actioned())
                .cloned(),
        }
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        let confidence = self
            .latest_actioned
            .as_ref()
            .map(|i| i.confidence_score)
            .unwrap_or(0.0);
        ConfidenceBand::classify(confidence)
    }
}

/// One-sentence explanation of the controller's action for an exit reason.
pub fn action_summary(reason: ExitReason) -> &'static str {
    match reason {
        ExitReason::LoopDetected => "FlowForge stopped the process to prevent runaway cost.",
        ExitReason::WatchdogAlert => {
            "FlowForge flagged risky behavior and kept the process running."
        }
        ExitReason::SafetyLimitExceeded => {
            "FlowForge enforced a safety limit and stopped the process."
        }
        ExitReason::Success | ExitReason::Other => {
            "FlowForge recorded an action for this process."
        }
    }
}

/// Largest combined replay+conflict total across trend points, used to scale
/// trend bars. Zero for an empty trend.
pub fn replay_trend_max(points: &[ReplayHistoryPoint]) -> f64 {
    points
        .iter()
        .map(|p| p.replay_events + p.conflict_events)
        .fold(0.0, f64::max)
}
