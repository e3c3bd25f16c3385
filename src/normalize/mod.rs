//! Payload normalization for untrusted controller responses.
//!
//! The controller's API is versioned independently of this console, so schema
//! drift (extra or missing fields) must never break rendering of the rest of a
//! snapshot. Every field access goes through a capability check before any
//! typed access; a single malformed entry is silently dropped. The only fatal
//! case is a top-level payload that is not an array at all.

use crate::model::{Incident, IncidentChainEvent, RequestTraceEvent, TimelineEvent};
use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level payload shape was invalid (object or scalar where an array was
/// expected). Fatal for that fetch only; the previous cached value is kept.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {context} payload: expected an array")]
pub struct SchemaError {
    pub context: &'static str,
}

impl SchemaError {
    fn new(context: &'static str) -> Self {
        Self { context }
    }
}

fn as_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

/// String field with empty-string fallback for anything non-string.
fn str_or_empty(entry: &Map<String, Value>, key: &str) -> String {
    match entry.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Like [`str_or_empty`] but tries keys in order, taking the first non-empty.
fn str_first_non_empty(entry: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        let v = str_or_empty(entry, key);
        if !v.is_empty() {
            return v;
        }
    }
    String::new()
}

/// Numeric field coerced to 0 when absent, non-numeric, or non-finite.
fn f64_or_zero(entry: &Map<String, Value>, key: &str) -> f64 {
    opt_f64(entry, key).unwrap_or(0.0)
}

/// Optional numeric field; `None` distinguishes "absent" from an explicit 0.
fn opt_f64(entry: &Map<String, Value>, key: &str) -> Option<f64> {
    entry.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn i64_or_zero(entry: &Map<String, Value>, key: &str) -> i64 {
    entry.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn opt_evidence(entry: &Map<String, Value>) -> Option<Map<String, Value>> {
    entry.get("evidence").and_then(Value::as_object).cloned()
}

/// Normalize an incidents payload. Entries that are not objects are skipped;
/// every surviving record has all fields populated (defaults, never nulls).
pub fn parse_incidents(payload: &Value) -> Result<Vec<Incident>, SchemaError> {
    let entries = payload.as_array().ok_or(SchemaError::new("incidents"))?;

    Ok(entries
        .iter()
        .filter_map(as_object)
        .map(|entry| Incident {
            id: i64_or_zero(entry, "id"),
            timestamp: str_or_empty(entry, "timestamp"),
            command: str_or_empty(entry, "command"),
            model_name: str_or_empty(entry, "model_name"),
            exit_reason: str_or_empty(entry, "exit_reason"),
            max_cpu: f64_or_zero(entry, "max_cpu"),
            pattern: str_or_empty(entry, "pattern"),
            token_savings_estimate: f64_or_zero(entry, "token_savings_estimate"),
            reason: str_or_empty(entry, "reason"),
            cpu_score: f64_or_zero(entry, "cpu_score"),
            entropy_score: f64_or_zero(entry, "entropy_score"),
            confidence_score: f64_or_zero(entry, "confidence_score"),
            recovery_status: str_or_empty(entry, "recovery_status"),
            restart_count: f64_or_zero(entry, "restart_count"),
        })
        .collect())
}

/// Normalize a timeline payload. `type` and `timestamp` are mandatory; an
/// event missing either is dropped.
pub fn parse_timeline(payload: &Value) -> Result<Vec<TimelineEvent>, SchemaError> {
    let entries = payload.as_array().ok_or(SchemaError::new("timeline"))?;

    Ok(entries
        .iter()
        .filter_map(as_object)
        .filter_map(|entry| {
            let event_type = str_or_empty(entry, "type");
            let timestamp = str_or_empty(entry, "timestamp");
            if event_type.is_empty() || timestamp.is_empty() {
                return None;
            }
            Some(TimelineEvent {
                event_id: str_or_empty(entry, "event_id"),
                run_id: str_or_empty(entry, "run_id"),
                incident_id: str_or_empty(entry, "incident_id"),
                event_type,
                timestamp,
                title: str_or_empty(entry, "title"),
                summary: str_or_empty(entry, "summary"),
                reason: str_or_empty(entry, "reason"),
                actor: str_or_empty(entry, "actor"),
                pid: opt_f64(entry, "pid"),
                cpu_score: opt_f64(entry, "cpu_score"),
                entropy_score: opt_f64(entry, "entropy_score"),
                confidence_score: opt_f64(entry, "confidence_score"),
                evidence: opt_evidence(entry),
            })
        })
        .collect())
}

/// Normalize an incident-chain payload. Mandatory: `incident_id`, `event_type`
/// (falling back to `type`) and `created_at` (falling back to `timestamp`).
/// Compatibility aliases are filled from the canonical fields both ways.
pub fn parse_incident_chain(payload: &Value) -> Result<Vec<IncidentChainEvent>, SchemaError> {
    let entries = payload.as_array().ok_or(SchemaError::new("incident chain"))?;

    Ok(entries
        .iter()
        .filter_map(as_object)
        .filter_map(|entry| {
            let incident_id = str_or_empty(entry, "incident_id");
            let event_type = str_first_non_empty(entry, &["event_type", "type"]);
            let created_at = str_first_non_empty(entry, &["created_at", "timestamp"]);
            if incident_id.is_empty() || event_type.is_empty() || created_at.is_empty() {
                return None;
            }

            let timestamp = {
                let raw = str_or_empty(entry, "timestamp");
                if raw.is_empty() { created_at.clone() } else { raw }
            };
            let compat_type = {
                let raw = str_or_empty(entry, "type");
                if raw.is_empty() { event_type.clone() } else { raw }
            };

            Some(IncidentChainEvent {
                id: i64_or_zero(entry, "id"),
                event_id: str_or_empty(entry, "event_id"),
                run_id: str_or_empty(entry, "run_id"),
                incident_id,
                event_type,
                actor: str_or_empty(entry, "actor"),
                reason_text: str_first_non_empty(entry, &["reason_text", "reason"]),
                created_at,
                timestamp,
                compat_type,
                title: str_or_empty(entry, "title"),
                summary: str_or_empty(entry, "summary"),
                reason: str_first_non_empty(entry, &["reason", "reason_text"]),
                pid: f64_or_zero(entry, "pid"),
                cpu_score: f64_or_zero(entry, "cpu_score"),
                entropy_score: f64_or_zero(entry, "entropy_score"),
                confidence_score: f64_or_zero(entry, "confidence_score"),
                evidence: opt_evidence(entry),
            })
        })
        .collect())
}

/// Normalize a trace event list. Trace events are display-only: being a keyed
/// mapping is the only requirement, every field tolerates absence.
pub fn parse_trace_events(payload: &Value) -> Vec<RequestTraceEvent> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(as_object)
        .map(|entry| RequestTraceEvent {
            event_id: str_or_empty(entry, "event_id"),
            created_at: str_or_empty(entry, "created_at"),
            event_type: str_or_empty(entry, "event_type"),
            title: str_or_empty(entry, "title"),
            actor: str_or_empty(entry, "actor"),
            incident_id: str_or_empty(entry, "incident_id"),
            reason_text: str_or_empty(entry, "reason_text"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incidents_top_level_non_array_is_fatal() {
        assert!(parse_incidents(&json!({"items": []})).is_err());
        assert!(parse_incidents(&json!(42)).is_err());
        assert!(parse_incidents(&json!(null)).is_err());
    }

    #[test]
    fn incidents_skip_non_object_entries() {
        let payload = json!([{"id": 1}, "junk", 7, null, {"id": 2}]);
        let incidents = parse_incidents(&payload).unwrap();
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].id, 1);
        assert_eq!(incidents[1].id, 2);
    }

    #[test]
    fn incidents_coerce_bad_field_types_to_defaults() {
        let payload = json!([{
            "id": 3,
            "command": 99,
            "max_cpu": "hot",
            "token_savings_estimate": 1.25,
            "reason": null
        }]);
        let incidents = parse_incidents(&payload).unwrap();
        assert_eq!(incidents[0].command, "");
        assert_eq!(incidents[0].max_cpu, 0.0);
        assert_eq!(incidents[0].token_savings_estimate, 1.25);
        assert_eq!(incidents[0].reason, "");
    }

    #[test]
    fn timeline_drops_events_missing_mandatory_fields() {
        let payload = json!([
            {"type": "run_started", "timestamp": "2024-01-01 10:00:00"},
            {"type": "", "timestamp": "2024-01-01 10:00:01"},
            {"timestamp": "2024-01-01 10:00:02"},
            {"type": "run_stopped"}
        ]);
        let events = parse_timeline(&payload).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "run_started");
    }

    #[test]
    fn timeline_optional_numerics_distinguish_absent_from_zero() {
        let payload = json!([
            {"type": "t", "timestamp": "2024-01-01T00:00:00", "cpu_score": 0.0},
            {"type": "t", "timestamp": "2024-01-01T00:00:01"}
        ]);
        let events = parse_timeline(&payload).unwrap();
        assert_eq!(events[0].cpu_score, Some(0.0));
        assert_eq!(events[1].cpu_score, None);
    }

    #[test]
    fn timeline_evidence_passes_through_opaque() {
        let payload = json!([{
            "type": "t",
            "timestamp": "2024-01-01T00:00:00",
            "evidence": {"nested": {"deep": [1, 2, 3]}, "note": "raw"}
        }]);
        let events = parse_timeline(&payload).unwrap();
        let evidence = events[0].evidence.as_ref().unwrap();
        assert_eq!(evidence["nested"]["deep"][2], json!(3));
    }

    #[test]
    fn chain_falls_back_to_compat_aliases() {
        let payload = json!([{
            "incident_id": "inc-1",
            "type": "process_killed",
            "timestamp": "2024-01-01 10:00:00",
            "reason": "loop detected"
        }]);
        let events = parse_incident_chain(&payload).unwrap();
        assert_eq!(events[0].event_type, "process_killed");
        assert_eq!(events[0].created_at, "2024-01-01 10:00:00");
        assert_eq!(events[0].reason_text, "loop detected");
        assert_eq!(events[0].compat_type, "process_killed");
    }

    #[test]
    fn chain_canonical_fields_win_over_aliases() {
        let payload = json!([{
            "incident_id": "inc-1",
            "event_type": "canonical",
            "type": "alias",
            "created_at": "2024-01-01T10:00:00",
            "timestamp": "2024-01-01T09:59:59",
            "reason_text": "canonical reason",
            "reason": "alias reason"
        }]);
        let events = parse_incident_chain(&payload).unwrap();
        assert_eq!(events[0].event_type, "canonical");
        assert_eq!(events[0].compat_type, "alias");
        assert_eq!(events[0].created_at, "2024-01-01T10:00:00");
        assert_eq!(events[0].timestamp, "2024-01-01T09:59:59");
        assert_eq!(events[0].reason_text, "canonical reason");
        assert_eq!(events[0].reason, "alias reason");
    }

    #[test]
    fn chain_requires_incident_id() {
        let payload = json!([{"event_type": "t", "created_at": "2024-01-01T10:00:00"}]);
        assert!(parse_incident_chain(&payload).unwrap().is_empty());
    }

    #[test]
    fn trace_events_tolerate_fully_empty_objects() {
        let payload = json!([{}, {"title": "only title"}, "dropped"]);
        let events = parse_trace_events(&payload);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RequestTraceEvent::default());
        assert_eq!(events[1].title, "only title");
    }

    #[test]
    fn normalize_is_idempotent_over_reserialization() {
        let payload = json!([
            {"id": 1, "command": "python train.py", "max_cpu": 97.5, "bogus": true},
            {"id": 2, "exit_reason": "LOOP_DETECTED"}
        ]);
        let first = parse_incidents(&payload).unwrap();
        let reserialized = serde_json::to_value(&first).unwrap();
        let second = parse_incidents(&reserialized).unwrap();
        assert_eq!(first, second);
    }
}
