//! HTTP client for the controller API.
//!
//! One thin typed method per endpoint; all responses pass through the payload
//! normalizer or a tolerant serde model before anyone else sees them. Mutating
//! actions attach the bearer token when one is configured.

mod error;

pub use error::{read_api_error_message, read_api_request_id, ClientError};

use crate::config::ConsoleConfig;
use crate::exposition;
use crate::model::{
    Incident, IncidentChainEvent, LifecycleSnapshot, ReplayHistory, SloSnapshot, TimelineEvent,
};
use crate::normalize;
use serde_json::Value;
use std::time::Duration;

/// Outcome of a kill action.
#[derive(Debug, Clone, PartialEq)]
pub struct KillOutcome {
    /// Pid the controller acknowledged stopping, when echoed back
    pub pid: Option<i64>,
}

/// Outcome of a restart action.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartOutcome {
    /// Lifecycle string the controller reported after accepting the restart
    pub lifecycle: String,
}

/// Typed access to every controller endpoint the console consumes.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    api_key: Option<String>,
    timeout_seconds: u64,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            api_key: config.api_key.clone(),
            timeout_seconds: config.poll.timeout_seconds,
        })
    }

    /// Client with a caller-supplied reqwest client (for tests).
    pub fn with_client(config: &ConsoleConfig, client: reqwest::Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            api_key: config.api_key.clone(),
            timeout_seconds: config.poll.timeout_seconds,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON endpoint; non-success statuses become [`ClientError::Http`]
    /// with the message extracted per the precedence rule.
    async fn get_json(&self, path_and_query: &str) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            let payload = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(http_error(status.as_u16(), &payload));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))
    }

    pub async fn fetch_incidents(&self) -> Result<Vec<Incident>, ClientError> {
        let payload = self.get_json("/v1/incidents").await?;
        Ok(normalize::parse_incidents(&payload)?)
    }

    pub async fn fetch_timeline(&self) -> Result<Vec<TimelineEvent>, ClientError> {
        let payload = self.get_json("/v1/timeline").await?;
        Ok(normalize::parse_timeline(&payload)?)
    }

    pub async fn fetch_incident_chain(
        &self,
        incident_id: &str,
    ) -> Result<Vec<IncidentChainEvent>, ClientError> {
        let path = format!("/v1/timeline?incident_id={}", urlencode(incident_id));
        let payload = self.get_json(&path).await?;
        Ok(normalize::parse_incident_chain(&payload)?)
    }

    pub async fn fetch_lifecycle(&self) -> Result<LifecycleSnapshot, ClientError> {
        let payload = self.get_json("/v1/worker/lifecycle").await?;
        serde_json::from_value(payload).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Fetch the text exposition endpoint and derive the SLO snapshot.
    pub async fn fetch_slo(&self) -> Result<SloSnapshot, ClientError> {
        let url = format!("{}/v1/metrics", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(status.as_u16(), &Value::Null));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))?;
        Ok(exposition::derive_slo(&exposition::parse_exposition(&raw)))
    }

    pub async fn fetch_replay_history(&self, days: u32) -> Result<ReplayHistory, ClientError> {
        let path = format!("/v1/ops/controlplane/replay/history?days={days}");
        let payload = self.get_json(&path).await?;
        serde_json::from_value(payload).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Raw trace lookup. Input validation and response normalization live in
    /// [`crate::trace`]; this only moves bytes.
    pub async fn fetch_request_trace_raw(
        &self,
        request_id: &str,
        limit: u32,
    ) -> Result<Value, ClientError> {
        let path = format!("/v1/ops/requests/{}?limit={limit}", urlencode(request_id));
        self.get_json(&path).await
    }

    /// POST an action endpoint with the optional bearer token.
    async fn post_action(&self, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))?;

        let status = response.status();
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(http_error(status.as_u16(), &payload));
        }
        Ok(payload)
    }

    /// Ask the controller to stop the currently supervised process.
    pub async fn kill_process(&self) -> Result<KillOutcome, ClientError> {
        let payload = self.post_action("/v1/process/kill", None).await?;
        Ok(KillOutcome {
            pid: payload.get("pid").and_then(Value::as_i64),
        })
    }

    /// Ask the controller to restart the last supervised command.
    pub async fn restart_process(&self, reason: &str) -> Result<RestartOutcome, ClientError> {
        let payload = self
            .post_action(
                "/v1/process/restart",
                Some(serde_json::json!({ "reason": reason })),
            )
            .await?;
        let lifecycle = payload
            .get("lifecycle")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Ok(RestartOutcome { lifecycle })
    }
}

fn http_error(status: u16, payload: &Value) -> ClientError {
    ClientError::Http {
        status,
        message: read_api_error_message(payload, status),
        request_id: read_api_request_id(payload),
        retry_after_seconds: payload
            .get("retry_after_seconds")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite()),
    }
}

/// Percent-encode a path/query component. Identifiers here are opaque server
/// strings, so everything outside the unreserved set is escaped.
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("inc-42"), "inc-42");
        assert_eq!(urlencode("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(urlencode("req_1.2~x"), "req_1.2~x");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = ConsoleConfig {
            base_url: "http://controller:8080/".to_string(),
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://controller:8080");
    }
}
