//! Line-oriented metrics exposition parsing and SLO derivation.
//!
//! The parser knows nothing about SLO semantics; it only produces a bare
//! metric-name to last-seen-value mapping. [`derive_slo`] maps the fixed
//! `flowforge_*` series into an [`SloSnapshot`], applying each lookup's
//! documented default when the series is absent.

use crate::model::SloSnapshot;
use std::collections::HashMap;

/// Parse raw exposition text into a name→value mapping.
///
/// One `metric_name{labels} value` or `metric_name value` per line;
/// `#`-prefixed comment lines and blank lines are ignored; the label suffix is
/// stripped at the first `{`. The final whitespace-delimited token must parse
/// as a finite number or the line is skipped. Repeated base names overwrite -
/// only the last occurrence is kept, since the console consumes aggregate
/// series only.
pub fn parse_exposition(raw: &str) -> HashMap<String, f64> {
    let mut out = HashMap::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let Some(metric_token) = tokens.next() else {
            continue;
        };
        let Some(value_token) = tokens.last() else {
            continue;
        };

        let name = match metric_token.find('{') {
            Some(idx) => &metric_token[..idx],
            None => metric_token,
        };

        match value_token.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                out.insert(name.to_string(), value);
            }
            _ => {}
        }
    }

    out
}

fn lookup(metrics: &HashMap<String, f64>, name: &str, default: f64) -> f64 {
    metrics.get(name).copied().unwrap_or(default)
}

/// Map the raw metrics mapping into the lifecycle SLO snapshot.
pub fn derive_slo(metrics: &HashMap<String, f64>) -> SloSnapshot {
    SloSnapshot {
        stop_target_seconds: lookup(metrics, "flowforge_stop_slo_target_seconds", 3.0),
        restart_target_seconds: lookup(metrics, "flowforge_restart_slo_target_seconds", 5.0),
        stop_compliance_ratio: lookup(metrics, "flowforge_stop_slo_compliance_ratio", 0.0),
        restart_compliance_ratio: lookup(metrics, "flowforge_restart_slo_compliance_ratio", 0.0),
        stop_last_seconds: lookup(metrics, "flowforge_stop_latency_last_seconds", 0.0),
        restart_last_seconds: lookup(metrics, "flowforge_restart_latency_last_seconds", 0.0),
        restart_budget_blocks: lookup(metrics, "flowforge_restart_budget_block_total", 0.0),
        idempotency_conflicts: lookup(
            metrics,
            "flowforge_controlplane_idempotency_conflict_total",
            0.0,
        ),
        idempotency_replays: lookup(
            metrics,
            "flowforge_controlplane_idempotent_replay_total",
            0.0,
        ),
        replay_rows: lookup(metrics, "flowforge_controlplane_replay_rows", 0.0),
        replay_oldest_age_seconds: lookup(
            metrics,
            "flowforge_controlplane_replay_oldest_age_seconds",
            0.0,
        ),
        replay_stats_error: lookup(metrics, "flowforge_controlplane_replay_stats_error", 0.0),
    }
}
