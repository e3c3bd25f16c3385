//! Incident correlation grouping over normalized timeline events.
//!
//! Events carrying a non-empty `incident_id` are bucketed under it; every
//! uncorrelated event gets its own synthetic key, derived from its input
//! index, so uncorrelated events are never merged with each other and no two
//! groups share a key. Within a group events are sorted ascending by parsed
//! timestamp with a stable sort, so ties keep their input order. Group order
//! is first appearance of each key; presentation decides display order.

use crate::model::TimelineEvent;
use chrono::{DateTime, NaiveDateTime, Utc};

/// One correlation bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentGroup {
    /// Either an incident id or a synthetic `uncorrelated-{index}` key
    pub key: String,
    /// True when `key` is a real incident id
    pub correlated: bool,
    /// Chronologically ascending, stable on ties
    pub events: Vec<TimelineEvent>,
}

/// Parse an event timestamp, accepting both encodings the controller's
/// endpoints emit: space-separated and `T`-separated date-times, with optional
/// fractional seconds and optional UTC offset. Both encodings of the same
/// instant compare equal.
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let canonical = if raw.contains('T') {
        raw.to_string()
    } else {
        raw.replacen(' ', "T", 1)
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&canonical) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&canonical, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Partition events into incident groups.
///
/// Every input event lands in exactly one group; concatenating all groups
/// yields a permutation of the input. Events with unparseable timestamps sort
/// before parseable ones and keep their relative input order.
pub fn group_events(events: &[TimelineEvent]) -> Vec<IncidentGroup> {
    let mut groups: Vec<IncidentGroup> = Vec::new();

    for (idx, event) in events.iter().enumerate() {
        if event.incident_id.is_empty() {
            // Keyed by input index, never by event_id: an event_id that
            // happens to look like an index must not collide with another
            // event's synthetic key
            groups.push(IncidentGroup {
                key: format!("uncorrelated-{idx}"),
                correlated: false,
                events: vec![event.clone()],
            });
            continue;
        }

        match groups
            .iter_mut()
            .find(|g| g.correlated && g.key == event.incident_id)
        {
            Some(group) => group.events.push(event.clone()),
            None => groups.push(IncidentGroup {
                key: event.incident_id.clone(),
                correlated: true,
                events: vec![event.clone()],
            }),
        }
    }

    for group in &mut groups {
        group
            .events
            .sort_by_key(|event| parse_event_timestamp(&event.timestamp));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(incident_id: &str, event_id: &str, timestamp: &str) -> TimelineEvent {
        TimelineEvent {
            incident_id: incident_id.to_string(),
            event_id: event_id.to_string(),
            event_type: "test".to_string(),
            timestamp: timestamp.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn both_timestamp_encodings_parse_to_the_same_instant() {
        let spaced = parse_event_timestamp("2024-01-01 10:00:00").unwrap();
        let tee = parse_event_timestamp("2024-01-01T10:00:00").unwrap();
        assert_eq!(spaced, tee);
    }

    #[test]
    fn timestamp_accepts_fractional_seconds_and_offsets() {
        assert!(parse_event_timestamp("2024-01-01 10:00:00.250").is_some());
        assert!(parse_event_timestamp("2024-01-01T10:00:00Z").is_some());
        assert!(parse_event_timestamp("2024-01-01T10:00:00+02:00").is_some());
        assert!(parse_event_timestamp("not a time").is_none());
        assert!(parse_event_timestamp("").is_none());
    }

    #[test]
    fn grouping_is_a_partition() {
        let events = vec![
            event("inc-1", "e1", "2024-01-01 10:00:02"),
            event("", "e2", "2024-01-01 10:00:03"),
            event("inc-1", "e3", "2024-01-01 10:00:01"),
            event("inc-2", "e4", "2024-01-01 10:00:04"),
            event("", "e5", "2024-01-01 10:00:05"),
        ];
        let groups = group_events(&events);

        let total: usize = groups.iter().map(|g| g.events.len()).sum();
        assert_eq!(total, events.len());

        // Uncorrelated events never merge with each other
        let uncorrelated: Vec<_> = groups.iter().filter(|g| !g.correlated).collect();
        assert_eq!(uncorrelated.len(), 2);
        for group in uncorrelated {
            assert_eq!(group.events.len(), 1);
        }

        let inc1 = groups.iter().find(|g| g.key == "inc-1").unwrap();
        assert_eq!(inc1.events.len(), 2);
    }

    #[test]
    fn events_within_group_sorted_ascending() {
        let events = vec![
            event("inc-1", "late", "2024-01-01T10:00:05"),
            event("inc-1", "early", "2024-01-01 10:00:01"),
            event("inc-1", "middle", "2024-01-01T10:00:03"),
        ];
        let groups = group_events(&events);
        let ids: Vec<_> = groups[0].events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn sort_is_stable_on_equal_instants_across_encodings() {
        let events = vec![
            event("inc-1", "first", "2024-01-01 10:00:00"),
            event("inc-1", "second", "2024-01-01T10:00:00"),
            event("inc-1", "third", "2024-01-01 10:00:00"),
        ];
        let groups = group_events(&events);
        let ids: Vec<_> = groups[0].events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn unparseable_timestamps_sort_first_and_stay_stable() {
        let events = vec![
            event("inc-1", "parsed", "2024-01-01T10:00:00"),
            event("inc-1", "junk-a", "whenever"),
            event("inc-1", "junk-b", "later"),
        ];
        let groups = group_events(&events);
        let ids: Vec<_> = groups[0].events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["junk-a", "junk-b", "parsed"]);
    }

    #[test]
    fn synthetic_keys_use_input_index() {
        let events = vec![event("", "evt-9", "2024-01-01T10:00:00")];
        let groups = group_events(&events);
        assert_eq!(groups[0].key, "uncorrelated-0");
        assert!(!groups[0].correlated);
    }

    #[test]
    fn synthetic_keys_distinct_when_event_id_looks_like_an_index() {
        // An event_id of "1" next to an empty event_id at index 1 must still
        // produce two distinct group keys
        let events = vec![
            event("", "1", "2024-01-01T10:00:00"),
            event("", "", "2024-01-01T10:00:01"),
        ];
        let groups = group_events(&events);
        assert_eq!(groups.len(), 2);

        let mut keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 2);
        for group in &groups {
            assert!(!group.correlated);
            assert_eq!(group.events.len(), 1);
        }
    }

    #[test]
    fn group_order_is_first_appearance() {
        let events = vec![
            event("inc-b", "e1", "2024-01-01T10:00:00"),
            event("inc-a", "e2", "2024-01-01T10:00:01"),
            event("inc-b", "e3", "2024-01-01T10:00:02"),
        ];
        let groups = group_events(&events);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["inc-b", "inc-a"]);
    }
}
