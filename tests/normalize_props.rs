//! Property tests for payload normalization and incident grouping.

use flowforge_console::model::TimelineEvent;
use flowforge_console::normalize;
use flowforge_console::timeline::group_events;
use proptest::prelude::*;
use serde_json::{json, Value};

/// Arbitrary JSON values, shallow enough to keep cases fast.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        // Finite floats only; JSON cannot carry NaN anyway
        (-1.0e12..1.0e12f64).prop_map(Value::from),
        "[a-zA-Z0-9 _:-]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::hash_map("[a-z_]{1,10}", inner, 0..6)
                .prop_map(|m| Value::from(serde_json::Map::from_iter(m))),
        ]
    })
}

fn arb_event() -> impl Strategy<Value = TimelineEvent> {
    (
        "[a-z0-9-]{0,8}",
        // Small integers included so event ids can look like input indices
        prop_oneof![Just(String::new()), "[0-9]{1,2}", "[a-z0-9-]{1,8}"],
        "[a-z_]{1,8}",
        prop_oneof![
            Just("2024-03-01 10:00:00".to_string()),
            Just("2024-03-01T10:00:00.5".to_string()),
            Just("not a timestamp".to_string()),
            "[0-9 :-]{0,19}",
        ],
    )
        .prop_map(|(incident_id, event_id, event_type, timestamp)| TimelineEvent {
            incident_id,
            event_id,
            event_type,
            timestamp,
            ..Default::default()
        })
}

proptest! {
    /// Normalizers never panic, whatever the payload shape.
    #[test]
    fn normalizers_total_over_arbitrary_json(payload in arb_json()) {
        let _ = normalize::parse_incidents(&payload);
        let _ = normalize::parse_timeline(&payload);
        let _ = normalize::parse_incident_chain(&payload);
        let _ = normalize::parse_trace_events(&payload);
    }

    /// Normalizing an already-normalized incidents payload is the identity.
    #[test]
    fn incident_normalization_is_idempotent(payload in arb_json()) {
        let wrapped = json!([payload]);
        if let Ok(first) = normalize::parse_incidents(&wrapped) {
            let reserialized = serde_json::to_value(&first).unwrap();
            let second = normalize::parse_incidents(&reserialized).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    /// Grouping partitions its input: every event lands in exactly one group.
    #[test]
    fn grouping_partitions_events(events in prop::collection::vec(arb_event(), 0..20)) {
        let groups = group_events(&events);

        let total: usize = groups.iter().map(|g| g.events.len()).sum();
        prop_assert_eq!(total, events.len());

        let mut keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        prop_assert_eq!(keys.len(), before, "group keys must be unique");
    }

    /// Correlated groups are homogeneous: one incident id per group, matching
    /// the group key.
    #[test]
    fn correlated_groups_are_homogeneous(events in prop::collection::vec(arb_event(), 0..20)) {
        for group in group_events(&events) {
            if group.correlated {
                for event in &group.events {
                    prop_assert_eq!(event.incident_id.as_str(), group.key.as_str());
                }
            } else {
                prop_assert!(group.events.iter().all(|e| e.incident_id.is_empty()));
            }
        }
    }

    /// Within a group, parseable timestamps are non-decreasing and events with
    /// unparseable timestamps sort before them.
    #[test]
    fn group_events_sorted_by_timestamp(events in prop::collection::vec(arb_event(), 0..20)) {
        use flowforge_console::timeline::parse_event_timestamp;

        for group in group_events(&events) {
            let parsed: Vec<_> = group
                .events
                .iter()
                .map(|e| parse_event_timestamp(&e.timestamp))
                .collect();
            for pair in parsed.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
