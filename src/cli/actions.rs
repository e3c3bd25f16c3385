//! `kill` and `restart` commands.
//!
//! Thin wrappers over the action endpoints. Failures carry the controller's
//! own message plus the retry hint when the restart budget pushed back.

use super::RestartArgs;
use crate::client::{ApiClient, ClientError};

pub async fn handle_kill(client: &ApiClient) -> anyhow::Result<String> {
    match client.kill_process().await {
        Ok(outcome) => Ok(match outcome.pid {
            Some(pid) => format!("Stop requested (pid {pid})"),
            None => "Stop requested".to_string(),
        }),
        Err(error) => Err(action_error(error)),
    }
}

pub async fn handle_restart(args: &RestartArgs, client: &ApiClient) -> anyhow::Result<String> {
    match client.restart_process(&args.reason).await {
        Ok(outcome) if outcome.lifecycle.is_empty() => Ok("Restart requested".to_string()),
        Ok(outcome) => Ok(format!("Restart requested (lifecycle {})", outcome.lifecycle)),
        Err(error) => Err(action_error(error)),
    }
}

/// Fold the retry hint into the message so the operator sees one line.
fn action_error(error: ClientError) -> anyhow::Error {
    let hint = error.retry_hint();
    if hint.is_empty() {
        anyhow::Error::new(error)
    } else {
        anyhow::anyhow!("{error}{hint}")
    }
}
