//! Request-trace lookup records.

use serde::{Deserialize, Serialize};

/// How many trace events the presentation layer shows before indicating that
/// more exist. Display policy only; the correlator returns everything the
/// server sent (up to its own limit).
pub const TRACE_DISPLAY_LIMIT: usize = 6;

/// Server-side result cap requested on every trace lookup.
pub const TRACE_RESULT_LIMIT: u32 = 200;

/// One event recorded under a request id. Display-only: unlike timeline
/// events, every field tolerates being empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestTraceEvent {
    pub event_id: String,
    pub created_at: String,
    pub event_type: String,
    pub title: String,
    pub actor: String,
    pub incident_id: String,
    pub reason_text: String,
}

/// Normalized trace lookup response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestTraceResponse {
    /// Server-echoed request id when present, else the query as typed
    pub request_id: String,
    pub count: u64,
    pub events: Vec<RequestTraceEvent>,
}
