//! Push-stream subscription.
//!
//! One long-lived SSE subscription to `/v1/stream` delivering [`LiveStats`]
//! payloads. Transport failures reconnect automatically and transparently: no
//! error is surfaced for a transient disconnect, the consumer simply sees a
//! gap between updates.

use crate::model::LiveStats;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Incremental SSE frame decoder. Feed raw bytes, get completed `data:`
/// payloads back. Handles CRLF, multi-chunk events, and comment lines.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    data: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every event payload completed by it.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // Blank line terminates the event
                if !self.data.is_empty() {
                    events.push(std::mem::take(&mut self.data));
                }
            } else if let Some(payload) = line.strip_prefix("data:") {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(payload.strip_prefix(' ').unwrap_or(payload));
            }
            // Other fields (event:, id:, retry:, comments) are ignored; the
            // controller only sends data frames
        }

        events
    }
}

/// Spawn the subscription task. Every decoded [`LiveStats`] is forwarded on
/// the returned channel; undecodable frames are logged and skipped. The task
/// reconnects after `reconnect_delay` on any transport failure and exits only
/// when `cancel` fires.
pub fn spawn(
    client: reqwest::Client,
    base_url: String,
    reconnect_delay: Duration,
    cancel: CancellationToken,
) -> (mpsc::Receiver<LiveStats>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);

    let handle = tokio::spawn(async move {
        let url = format!("{}/v1/stream", base_url.trim_end_matches('/'));
        tracing::info!(url = %url, "Push-stream subscription started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                done = run_subscription(&client, &url, &tx) => {
                    if done {
                        // Receiver dropped; no one is listening anymore
                        break;
                    }
                    tracing::debug!("Push stream disconnected, reconnecting");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(reconnect_delay) => {}
                    }
                }
            }
        }

        tracing::info!("Push-stream subscription stopped");
    });

    (rx, handle)
}

/// One subscription attempt. Returns true when the consumer went away and the
/// task should stop rather than reconnect.
async fn run_subscription(
    client: &reqwest::Client,
    url: &str,
    tx: &mpsc::Sender<LiveStats>,
) -> bool {
    // The subscription is expected to stay open; the generous cap only exists
    // so a silently dead connection eventually cycles through a reconnect
    let response = match client
        .get(url)
        .timeout(Duration::from_secs(24 * 60 * 60))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::debug!(status = %response.status(), "Push stream rejected");
            return false;
        }
        Err(e) => {
            tracing::debug!(error = %e, "Push stream connect failed");
            return false;
        }
    };

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(error = %e, "Push stream read failed");
                return false;
            }
        };

        for payload in decoder.feed(&String::from_utf8_lossy(&chunk)) {
            match serde_json::from_str::<LiveStats>(&payload) {
                Ok(stats) => {
                    if tx.send(stats).await.is_err() {
                        return true;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping undecodable push-stream frame");
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("data: {\"cpu\":1.5}\n\n");
        assert_eq!(events, vec!["{\"cpu\":1.5}"]);
    }

    #[test]
    fn event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed("data: {\"cpu\"").is_empty());
        assert!(decoder.feed(":2.0}\n").is_empty());
        let events = decoder.feed("\n");
        assert_eq!(events, vec!["{\"cpu\":2.0}"]);
    }

    #[test]
    fn crlf_and_comment_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(": keepalive\r\ndata: {\"pid\":7}\r\n\r\n");
        assert_eq!(events, vec!["{\"pid\":7}"]);
    }

    #[test]
    fn multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("data: a\n\ndata: b\n\n");
        assert_eq!(events, vec!["a", "b"]);
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("data: first\ndata: second\n\n");
        assert_eq!(events, vec!["first\nsecond"]);
    }

    #[test]
    fn blank_line_without_data_emits_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed("\n\n\n").is_empty());
    }
}
