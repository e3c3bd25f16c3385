//! Output formatting helpers for CLI commands

use crate::model::{
    Incident, LifecycleSnapshot, LiveStats, RequestTraceResponse, SloSnapshot,
    TRACE_DISPLAY_LIMIT,
};
use crate::stats::IncidentStats;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Format incidents as a table
pub fn format_incidents_table(incidents: &[Incident]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ID",
        "Timestamp",
        "Command",
        "Exit Reason",
        "Confidence",
        "Savings",
        "Recovery",
    ]);

    for incident in incidents {
        let reason = match incident.exit_reason.as_str() {
            "LOOP_DETECTED" => incident.exit_reason.red().to_string(),
            "WATCHDOG_ALERT" => incident.exit_reason.yellow().to_string(),
            "SAFETY_LIMIT_EXCEEDED" => incident.exit_reason.red().to_string(),
            "SUCCESS" => incident.exit_reason.green().to_string(),
            _ => incident.exit_reason.clone(),
        };

        table.add_row(vec![
            Cell::new(incident.id),
            Cell::new(&incident.timestamp),
            Cell::new(&incident.command),
            Cell::new(reason),
            Cell::new(format!("{:.0}%", incident.confidence_score)),
            Cell::new(format!("{:.2}", incident.token_savings_estimate)),
            Cell::new(&incident.recovery_status),
        ]);
    }

    table.to_string()
}

/// Format incidents as JSON
pub fn format_incidents_json(incidents: &[Incident]) -> String {
    serde_json::to_string_pretty(&json!({ "incidents": incidents })).unwrap_or_default()
}

/// Headline line over an incidents snapshot
pub fn format_incident_stats(stats: &IncidentStats) -> String {
    format!(
        "{} incidents, {} loops prevented, {:.2} est. tokens saved ({})",
        stats.total_incidents,
        stats.loops_prevented,
        stats.total_savings,
        stats.confidence_band().label(),
    )
}

/// Format the SLO snapshot as a table with an on-track verdict
pub fn format_slo_table(slo: &SloSnapshot) -> String {
    let verdict = if slo.on_track() {
        "On track".green().to_string()
    } else {
        "At risk".red().to_string()
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value"]);

    table.add_row(vec![Cell::new("Verdict"), Cell::new(verdict)]);
    table.add_row(vec![
        Cell::new("Stop compliance"),
        Cell::new(format!(
            "{:.1}% (target {:.0}s, last {:.2}s)",
            slo.stop_compliance_ratio * 100.0,
            slo.stop_target_seconds,
            slo.stop_last_seconds
        )),
    ]);
    table.add_row(vec![
        Cell::new("Restart compliance"),
        Cell::new(format!(
            "{:.1}% (target {:.0}s, last {:.2}s)",
            slo.restart_compliance_ratio * 100.0,
            slo.restart_target_seconds,
            slo.restart_last_seconds
        )),
    ]);
    table.add_row(vec![
        Cell::new("Restart budget blocks"),
        Cell::new(slo.restart_budget_blocks),
    ]);
    table.add_row(vec![
        Cell::new("Idempotency conflicts"),
        Cell::new(slo.idempotency_conflicts),
    ]);
    table.add_row(vec![
        Cell::new("Idempotency replays"),
        Cell::new(slo.idempotency_replays),
    ]);
    table.add_row(vec![
        Cell::new("Replay ledger rows"),
        Cell::new(slo.replay_rows),
    ]);
    table.add_row(vec![
        Cell::new("Replay oldest age (s)"),
        Cell::new(slo.replay_oldest_age_seconds),
    ]);

    table.to_string()
}

/// Format the SLO snapshot as JSON, verdict included
pub fn format_slo_json(slo: &SloSnapshot) -> String {
    serde_json::to_string_pretty(&json!({
        "slo": slo,
        "on_track": slo.on_track(),
    }))
    .unwrap_or_default()
}

/// Format a trace lookup result. The table shows at most
/// [`TRACE_DISPLAY_LIMIT`] rows and notes how many more exist.
pub fn format_trace_table(response: &RequestTraceResponse) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Created", "Type", "Title", "Actor", "Incident"]);

    for event in response.events.iter().take(TRACE_DISPLAY_LIMIT) {
        table.add_row(vec![
            Cell::new(&event.created_at),
            Cell::new(&event.event_type),
            Cell::new(&event.title),
            Cell::new(&event.actor),
            Cell::new(&event.incident_id),
        ]);
    }

    let mut out = format!(
        "request_id: {} ({} events)\n{}",
        response.request_id,
        response.count,
        table
    );
    if response.events.len() > TRACE_DISPLAY_LIMIT {
        out.push_str(&format!(
            "\n... and {} more",
            response.events.len() - TRACE_DISPLAY_LIMIT
        ));
    }
    out
}

/// Format a trace lookup result as JSON
pub fn format_trace_json(response: &RequestTraceResponse) -> String {
    serde_json::to_string_pretty(response).unwrap_or_default()
}

/// One status line combining the lifecycle snapshot with the freshest live
/// frame, used by the watch view.
pub fn format_status_line(lifecycle: &LifecycleSnapshot, live: Option<&LiveStats>) -> String {
    let phase = match lifecycle.phase.as_str() {
        "RUNNING" => "RUNNING".green().to_string(),
        "FAILED" => "FAILED".red().to_string(),
        "UNKNOWN" => "UNKNOWN".yellow().to_string(),
        other => other.to_string(),
    };

    match live {
        Some(live) => format!(
            "{} pid={} cpu={:.1}% {}",
            phase,
            live.pid,
            live.cpu,
            live.last_line.trim()
        ),
        None => format!("{} pid={} (no live stream)", phase, lifecycle.pid),
    }
}
