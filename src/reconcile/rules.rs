//! Reaction rules evaluated against each push-stream update.
//!
//! Explicit (old, new) → action rules instead of implicit change detection, so
//! ordering and idempotence stay independently testable. Each rule closes the
//! latency gap between "the daemon just acted" and "the operator sees the
//! resulting incident row".

use super::snapshot::Resource;
use crate::model::LiveStats;

const STATUS_RUNNING: &str = "RUNNING";
const STATUS_STOPPED: &str = "STOPPED";
const STATUS_WATCHDOG_ALERT: &str = "WATCHDOG_ALERT";

/// Resources to re-pull out of cycle in response to a live update.
pub fn live_status_reactions(previous: Option<&LiveStats>, next: &LiveStats) -> Vec<Resource> {
    let was_running = previous.map(|p| p.status == STATUS_RUNNING).unwrap_or(false);
    let entered_alert_state =
        was_running && next.status != STATUS_RUNNING && next.status != STATUS_STOPPED;

    if entered_alert_state || next.status == STATUS_WATCHDOG_ALERT {
        vec![Resource::Incidents, Resource::Timeline]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(status: &str) -> LiveStats {
        LiveStats {
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn running_to_loop_detected_triggers_repull() {
        let reactions = live_status_reactions(Some(&live("RUNNING")), &live("LOOP_DETECTED"));
        assert_eq!(reactions, vec![Resource::Incidents, Resource::Timeline]);
    }

    #[test]
    fn stopped_to_stopped_is_quiet() {
        assert!(live_status_reactions(Some(&live("STOPPED")), &live("STOPPED")).is_empty());
    }

    #[test]
    fn running_to_running_or_stopped_is_quiet() {
        assert!(live_status_reactions(Some(&live("RUNNING")), &live("RUNNING")).is_empty());
        assert!(live_status_reactions(Some(&live("RUNNING")), &live("STOPPED")).is_empty());
    }

    #[test]
    fn watchdog_alert_triggers_regardless_of_previous_status() {
        assert!(!live_status_reactions(Some(&live("STOPPED")), &live("WATCHDOG_ALERT")).is_empty());
        assert!(!live_status_reactions(None, &live("WATCHDOG_ALERT")).is_empty());
    }

    #[test]
    fn first_frame_without_previous_is_quiet_unless_watchdog() {
        assert!(live_status_reactions(None, &live("LOOP_DETECTED")).is_empty());
        assert!(live_status_reactions(None, &live("RUNNING")).is_empty());
    }

    #[test]
    fn rules_are_idempotent_over_repeated_frames() {
        // Second identical alert frame: previous is no longer RUNNING, so the
        // transition rule stays quiet
        let first = live_status_reactions(Some(&live("RUNNING")), &live("LOOP_DETECTED"));
        let second = live_status_reactions(Some(&live("LOOP_DETECTED")), &live("LOOP_DETECTED"));
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }
}
