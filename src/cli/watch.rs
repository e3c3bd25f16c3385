//! `watch` command: follow the controller live.
//!
//! Wires the push-stream subscription into the reconciliation loop and prints
//! a compact status block every time the published snapshot changes. Ctrl-C
//! (or SIGTERM) cancels everything and waits for both tasks to stop.

use super::{output, WatchArgs};
use crate::client::ApiClient;
use crate::config::ConsoleConfig;
use crate::reconcile::{ConsoleSnapshot, Controller, Resource};
use crate::selection::{DeepLink, SelectionState};
use crate::session::{FileSessionStore, SessionState, SessionStore};
use crate::stream;
use colored::Colorize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn run_watch(args: WatchArgs, mut config: ConsoleConfig) -> anyhow::Result<()> {
    let store: Option<Box<dyn SessionStore>> = args
        .session
        .clone()
        .map(|path| Box::new(FileSessionStore::new(path)) as Box<dyn SessionStore>);
    let remembered = match &store {
        Some(store) => store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable session file");
            SessionState::default()
        }),
        None => SessionState::default(),
    };
    if config.api_key.is_none() && !remembered.api_key.is_empty() {
        config.api_key = Some(remembered.api_key.clone());
    }

    let client = ApiClient::new(&config)?;

    // Explicit --incident wins over the deep link's parameter, which wins over
    // the remembered selection
    let deep_link = match &args.console_url {
        Some(url) => Some(DeepLink::parse(url)?),
        None => None,
    };
    let initial = args
        .incident
        .clone()
        .or_else(|| deep_link.as_ref().and_then(DeepLink::incident))
        .or_else(|| {
            (!remembered.selected_incident.is_empty())
                .then(|| remembered.selected_incident.clone())
        });
    let selection = SelectionState::from_deep_link(initial.as_deref());

    let cancel = CancellationToken::new();
    let (live_rx, stream_handle) = stream::spawn(
        reqwest::Client::new(),
        config.base_url.clone(),
        Duration::from_secs(config.poll.stream_reconnect_seconds),
        cancel.clone(),
    );

    let (controller, handle) = Controller::new(client, config.poll.clone(), selection, deep_link);
    let controller_handle = tokio::spawn(controller.run(live_rx, cancel.clone()));

    let mut snapshot_rx = handle.snapshot.clone();
    loop {
        tokio::select! {
            _ = shutdown_signal() => {
                tracing::info!("Shutting down watch");
                break;
            }
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let rendered = render_snapshot(&snapshot_rx.borrow());
                println!("{rendered}");
            }
        }
    }

    cancel.cancel();

    if let Some(store) = &store {
        let state = SessionState {
            api_key: config.api_key.clone().unwrap_or_default(),
            selected_incident: snapshot_rx
                .borrow()
                .selected_incident
                .clone()
                .unwrap_or_default(),
        };
        if let Err(e) = store.save(&state) {
            tracing::warn!(error = %e, "Failed to save session file");
        }
    }

    controller_handle.await?;
    stream_handle.await?;
    Ok(())
}

/// Compact status block for one snapshot.
fn render_snapshot(snapshot: &ConsoleSnapshot) -> String {
    let mut lines = vec![output::format_status_line(
        &snapshot.lifecycle,
        snapshot.live.as_ref(),
    )];

    let verdict = if snapshot.slo.on_track() {
        "on track".green().to_string()
    } else {
        "at risk".red().to_string()
    };
    let mut counts = format!(
        "incidents: {}  timeline: {}  slo: {}",
        snapshot.incidents.len(),
        snapshot.timeline.len(),
        verdict
    );
    if snapshot.errors.any() {
        counts.push_str(&format!("  {}", "degraded".yellow()));
    }
    lines.push(counts);

    if let Some(selected) = &snapshot.selected_incident {
        let mut line = format!("selected: {selected} ({} chain events)", snapshot.chain.len());
        if let Some(share) = &snapshot.share_url {
            line.push_str(&format!("  {share}"));
        }
        lines.push(line);
    }

    for resource in [
        Resource::Incidents,
        Resource::Timeline,
        Resource::Lifecycle,
        Resource::Slo,
        Resource::ReplayHistory,
        Resource::IncidentChain,
    ] {
        if let Some(error) = snapshot.errors.get(resource) {
            lines.push(format!("{} {}: {}", "stale".yellow(), resource.name(), error));
        }
    }

    lines.join("\n")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
