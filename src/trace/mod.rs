//! Request-trace correlation.
//!
//! On-demand join from an opaque request identifier to every event recorded
//! under it. Invoked directly by the presentation layer, independent of the
//! polling loop.

use crate::client::{ApiClient, ClientError};
use crate::model::{RequestTraceResponse, TRACE_RESULT_LIMIT};
use crate::normalize;
use serde_json::Value;

/// Look up every event correlated to `query`.
///
/// A blank query fails locally with a validation error before any network
/// call. On success the response echoes the server's canonical request id
/// when present, else the query as typed; the count falls back to the number
/// of validated events.
pub async fn lookup(client: &ApiClient, query: &str) -> Result<RequestTraceResponse, ClientError> {
    let request_id = query.trim();
    if request_id.is_empty() {
        return Err(ClientError::Validation(
            "Enter a request_id to query correlated events.".to_string(),
        ));
    }

    let payload = client
        .fetch_request_trace_raw(request_id, TRACE_RESULT_LIMIT)
        .await?;

    Ok(normalize_response(&payload, request_id))
}

/// Normalize a raw trace payload. Tolerates any shape: a non-object payload
/// yields an empty result carrying the queried id.
pub fn normalize_response(payload: &Value, queried_id: &str) -> RequestTraceResponse {
    let echoed = payload
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let events = payload
        .get("events")
        .map(normalize::parse_trace_events)
        .unwrap_or_default();

    let count = payload
        .get("count")
        .and_then(Value::as_u64)
        .unwrap_or(events.len() as u64);

    RequestTraceResponse {
        request_id: echoed.unwrap_or(queried_id).to_string(),
        count,
        events,
    }
}
