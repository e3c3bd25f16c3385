//! Live reconciliation controller.
//!
//! Owns all data acquisition: one periodic poll per resource at its own
//! interval, one push-stream subscription, and the invalidation rules that
//! force an out-of-cycle pull when the stream reports a state transition. The
//! snapshot is mutated only here; everyone else reads it through a watch
//! channel.
//!
//! Ordering: every spawned fetch carries a per-resource monotonic sequence
//! number and completions are applied in receipt order; a completion older
//! than the last applied one for its resource is discarded, so a slow response
//! can never overwrite a newer one.

mod rules;
mod snapshot;

pub use rules::live_status_reactions;
pub use snapshot::{ConsoleSnapshot, Resource, ResourceErrors};

use crate::client::{ApiClient, ClientError};
use crate::config::PollConfig;
use crate::model::{
    Incident, IncidentChainEvent, LifecycleSnapshot, LiveStats, ReplayHistory, SloSnapshot,
    TimelineEvent,
};
use crate::selection::{DeepLink, SelectionState};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// External requests into the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Explicit user selection of an incident
    Select(String),
    /// Transition to no selection, tearing down the chain poll
    ClearSelection,
    /// Out-of-cycle re-pull of one resource
    Refresh(Resource),
}

/// A successfully fetched resource value.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Incidents(Vec<Incident>),
    Timeline(Vec<TimelineEvent>),
    Lifecycle(LifecycleSnapshot),
    Slo(SloSnapshot),
    ReplayHistory(ReplayHistory),
    Chain {
        incident_id: String,
        events: Vec<IncidentChainEvent>,
    },
}

/// Completion of one in-flight fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub resource: Resource,
    pub seq: u64,
    pub result: Result<Payload, ClientError>,
}

/// Per-resource monotonic sequence numbers fencing out-of-order completions.
#[derive(Debug, Default)]
struct SeqTracker {
    next: [u64; Resource::COUNT],
    applied: [u64; Resource::COUNT],
}

impl SeqTracker {
    fn begin(&mut self, resource: Resource) -> u64 {
        let slot = &mut self.next[resource.index()];
        *slot += 1;
        *slot
    }

    /// True when this completion is newer than the last applied one.
    fn try_apply(&mut self, resource: Resource, seq: u64) -> bool {
        let slot = &mut self.applied[resource.index()];
        if seq <= *slot {
            return false;
        }
        *slot = seq;
        true
    }
}

/// Internal instruction produced by an apply step and executed by the run
/// loop, which owns the timers.
#[derive(Debug, PartialEq, Eq)]
enum Effect {
    Refresh(Resource),
    /// Selection transitioned; rebuild or tear down the chain timer
    SelectionChanged,
}

/// Reader side handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct Handle {
    pub commands: mpsc::Sender<Command>,
    pub snapshot: watch::Receiver<ConsoleSnapshot>,
}

/// The reconciliation loop. See module docs for the ownership rules.
pub struct Controller {
    client: ApiClient,
    poll: PollConfig,
    snapshot: ConsoleSnapshot,
    selection: SelectionState,
    deep_link: Option<DeepLink>,
    seq: SeqTracker,
    outcome_tx: mpsc::Sender<FetchOutcome>,
    outcome_rx: mpsc::Receiver<FetchOutcome>,
    command_rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<ConsoleSnapshot>,
}

impl Controller {
    pub fn new(
        client: ApiClient,
        poll: PollConfig,
        selection: SelectionState,
        mut deep_link: Option<DeepLink>,
    ) -> (Self, Handle) {
        let (outcome_tx, outcome_rx) = mpsc::channel(64);
        let (command_tx, command_rx) = mpsc::channel(16);

        let mut snapshot = ConsoleSnapshot::default();
        snapshot.selected_incident = selection.selected().map(str::to_string);
        // Mirror any initial selection into the share URL
        if let (Some(id), Some(link)) = (selection.selected(), deep_link.as_mut()) {
            link.set_incident(id);
            snapshot.share_url = Some(link.share_url());
        }

        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot.clone());

        let controller = Self {
            client,
            poll,
            snapshot,
            selection,
            deep_link,
            seq: SeqTracker::default(),
            outcome_tx,
            outcome_rx,
            command_rx,
            snapshot_tx,
        };
        let handle = Handle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (controller, handle)
    }

    /// Run until cancelled. `live_rx` is the push-stream channel from
    /// [`crate::stream::spawn`]; a closed channel simply disables live
    /// updates (the stream task owns reconnection).
    pub async fn run(mut self, mut live_rx: mpsc::Receiver<LiveStats>, cancel: CancellationToken) {
        let mut incidents_iv = poll_interval(self.poll.incidents_interval_seconds);
        let mut timeline_iv = poll_interval(self.poll.timeline_interval_seconds);
        let mut lifecycle_iv = poll_interval(self.poll.lifecycle_interval_seconds);
        let mut metrics_iv = poll_interval(self.poll.metrics_interval_seconds);
        let mut replay_iv = poll_interval(self.poll.replay_interval_seconds);
        // Active only while an incident is selected
        let mut chain_iv: Option<Interval> = self
            .selection
            .selected()
            .is_some()
            .then(|| poll_interval(self.poll.chain_interval_seconds));

        tracing::info!(
            incidents = self.poll.incidents_interval_seconds,
            timeline = self.poll.timeline_interval_seconds,
            lifecycle = self.poll.lifecycle_interval_seconds,
            "Reconciliation loop started"
        );

        loop {
            let effects = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reconciliation loop shutting down");
                    break;
                }
                _ = incidents_iv.tick() => {
                    self.spawn_fetch(Resource::Incidents);
                    Vec::new()
                }
                _ = timeline_iv.tick() => {
                    self.spawn_fetch(Resource::Timeline);
                    Vec::new()
                }
                _ = lifecycle_iv.tick() => {
                    self.spawn_fetch(Resource::Lifecycle);
                    Vec::new()
                }
                _ = metrics_iv.tick() => {
                    self.spawn_fetch(Resource::Slo);
                    Vec::new()
                }
                _ = replay_iv.tick() => {
                    self.spawn_fetch(Resource::ReplayHistory);
                    Vec::new()
                }
                _ = tick_optional(&mut chain_iv) => {
                    self.spawn_fetch(Resource::IncidentChain);
                    Vec::new()
                }
                Some(outcome) = self.outcome_rx.recv() => self.apply_outcome(outcome),
                Some(stats) = live_rx.recv() => self.apply_live(stats),
                Some(command) = self.command_rx.recv() => self.apply_command(command),
            };

            for effect in effects {
                match effect {
                    Effect::Refresh(resource) => self.spawn_fetch(resource),
                    Effect::SelectionChanged => {
                        // Dropping the old interval tears the timer down; a
                        // fresh one ticks immediately, giving the new
                        // selection an eager chain fetch
                        chain_iv = self
                            .selection
                            .selected()
                            .is_some()
                            .then(|| poll_interval(self.poll.chain_interval_seconds));
                    }
                }
            }
        }
    }

    /// Spawn one fetch for `resource`, tagged with its sequence number. The
    /// chain fetch is skipped outright when nothing is selected.
    fn spawn_fetch(&mut self, resource: Resource) {
        let incident_id = match resource {
            Resource::IncidentChain => match self.selection.selected() {
                Some(id) => Some(id.to_string()),
                None => return,
            },
            _ => None,
        };

        let seq = self.seq.begin(resource);
        let client = self.client.clone();
        let tx = self.outcome_tx.clone();
        let days = self.poll.replay_window_days;

        tokio::spawn(async move {
            let result = fetch_resource(&client, resource, incident_id, days).await;
            let _ = tx.send(FetchOutcome { resource, seq, result }).await;
        });
    }

    /// Apply one completion: fence stale sequences, replace the resource's
    /// cached value wholesale on success, or retain it and flag the error.
    fn apply_outcome(&mut self, outcome: FetchOutcome) -> Vec<Effect> {
        if !self.seq.try_apply(outcome.resource, outcome.seq) {
            tracing::debug!(
                resource = outcome.resource.name(),
                seq = outcome.seq,
                "Discarding out-of-order fetch completion"
            );
            return Vec::new();
        }

        let mut effects = Vec::new();
        match outcome.result {
            Ok(payload) => {
                self.snapshot.errors.set(outcome.resource, None);
                match payload {
                    Payload::Incidents(incidents) => self.snapshot.incidents = incidents,
                    Payload::Timeline(timeline) => {
                        self.snapshot.timeline = timeline;
                        if self
                            .selection
                            .apply_timeline(&self.snapshot.timeline)
                            .is_some()
                        {
                            effects.extend(self.sync_selection());
                        }
                    }
                    Payload::Lifecycle(lifecycle) => self.snapshot.lifecycle = lifecycle,
                    Payload::Slo(slo) => self.snapshot.slo = slo,
                    Payload::ReplayHistory(history) => self.snapshot.replay_history = history,
                    Payload::Chain { incident_id, events } => {
                        if self.selection.selected() == Some(incident_id.as_str()) {
                            self.snapshot.chain = events;
                        } else {
                            tracing::debug!(
                                incident_id = %incident_id,
                                "Discarding chain for no-longer-selected incident"
                            );
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(
                    resource = outcome.resource.name(),
                    error = %error,
                    "Fetch failed, retaining cached value"
                );
                self.snapshot.errors.set(outcome.resource, Some(error.to_string()));
            }
        }

        self.publish();
        effects
    }

    /// Apply a push-stream frame and evaluate the reaction rule table against
    /// the previous live status.
    fn apply_live(&mut self, stats: LiveStats) -> Vec<Effect> {
        let reactions = live_status_reactions(self.snapshot.live.as_ref(), &stats);
        if !reactions.is_empty() {
            tracing::debug!(status = %stats.status, "Live transition forcing out-of-cycle re-pull");
        }

        self.snapshot.live = Some(stats);
        self.publish();
        reactions.into_iter().map(Effect::Refresh).collect()
    }

    fn apply_command(&mut self, command: Command) -> Vec<Effect> {
        let effects = match command {
            Command::Select(incident_id) => {
                if self.selection.select(&incident_id).is_some() {
                    self.sync_selection()
                } else {
                    Vec::new()
                }
            }
            Command::ClearSelection => {
                if self.selection.clear() {
                    self.sync_selection()
                } else {
                    Vec::new()
                }
            }
            Command::Refresh(resource) => vec![Effect::Refresh(resource)],
        };
        self.publish();
        effects
    }

    /// Mirror a selection transition into the snapshot and deep link. The old
    /// chain no longer applies and is dropped immediately; the loop rebuilds
    /// or tears down the chain timer on [`Effect::SelectionChanged`].
    fn sync_selection(&mut self) -> Vec<Effect> {
        self.snapshot.selected_incident = self.selection.selected().map(str::to_string);
        self.snapshot.chain.clear();

        match (self.selection.selected(), self.deep_link.as_mut()) {
            (Some(id), Some(link)) => {
                link.set_incident(id);
                self.snapshot.share_url = Some(link.share_url());
            }
            (None, _) => self.snapshot.share_url = None,
            (Some(_), None) => {}
        }

        vec![Effect::SelectionChanged]
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(self.snapshot.clone());
    }
}

fn poll_interval(seconds: u64) -> Interval {
    let mut iv = interval(Duration::from_secs(seconds.max(1)));
    iv.set_missed_tick_behavior(MissedTickBehavior::Skip);
    iv
}

/// Await the inner interval; pends forever while no chain timer is active.
async fn tick_optional(iv: &mut Option<Interval>) {
    match iv.as_mut() {
        Some(iv) => {
            iv.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn fetch_resource(
    client: &ApiClient,
    resource: Resource,
    incident_id: Option<String>,
    replay_window_days: u32,
) -> Result<Payload, ClientError> {
    match resource {
        Resource::Incidents => client.fetch_incidents().await.map(Payload::Incidents),
        Resource::Timeline => client.fetch_timeline().await.map(Payload::Timeline),
        Resource::Lifecycle => client.fetch_lifecycle().await.map(Payload::Lifecycle),
        Resource::Slo => client.fetch_slo().await.map(Payload::Slo),
        Resource::ReplayHistory => client
            .fetch_replay_history(replay_window_days)
            .await
            .map(Payload::ReplayHistory),
        Resource::IncidentChain => {
            let incident_id = incident_id.ok_or_else(|| {
                ClientError::Validation("chain fetch without a selected incident".to_string())
            })?;
            client
                .fetch_incident_chain(&incident_id)
                .await
                .map(|events| Payload::Chain { incident_id, events })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;

    fn controller_with_selection(selection: SelectionState) -> (Controller, Handle) {
        let config = ConsoleConfig::default();
        let client = ApiClient::new(&config).unwrap();
        Controller::new(client, config.poll, selection, None)
    }

    fn controller() -> (Controller, Handle) {
        controller_with_selection(SelectionState::new())
    }

    fn timeline_event(incident_id: &str) -> TimelineEvent {
        TimelineEvent {
            incident_id: incident_id.to_string(),
            event_type: "test".to_string(),
            timestamp: "2024-01-01T00:00:00".to_string(),
            ..Default::default()
        }
    }

    fn outcome(resource: Resource, seq: u64, result: Result<Payload, ClientError>) -> FetchOutcome {
        FetchOutcome { resource, seq, result }
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (mut controller, _handle) = controller();
        let seq1 = controller.seq.begin(Resource::Incidents);
        let seq2 = controller.seq.begin(Resource::Incidents);

        let newer = vec![Incident { id: 2, ..Default::default() }];
        let older = vec![Incident { id: 1, ..Default::default() }];

        controller.apply_outcome(outcome(Resource::Incidents, seq2, Ok(Payload::Incidents(newer))));
        controller.apply_outcome(outcome(Resource::Incidents, seq1, Ok(Payload::Incidents(older))));

        assert_eq!(controller.snapshot.incidents[0].id, 2);
    }

    #[test]
    fn failure_retains_cached_value_and_is_resource_scoped() {
        let (mut controller, _handle) = controller();
        let seq1 = controller.seq.begin(Resource::Incidents);
        controller.apply_outcome(outcome(
            Resource::Incidents,
            seq1,
            Ok(Payload::Incidents(vec![Incident { id: 7, ..Default::default() }])),
        ));

        let seq2 = controller.seq.begin(Resource::Incidents);
        controller.apply_outcome(outcome(
            Resource::Incidents,
            seq2,
            Err(ClientError::Transport("connection refused".to_string())),
        ));

        assert_eq!(controller.snapshot.incidents[0].id, 7);
        assert!(controller.snapshot.errors.get(Resource::Incidents).is_some());
        assert!(controller.snapshot.errors.get(Resource::Timeline).is_none());

        // A later success clears the flag
        let seq3 = controller.seq.begin(Resource::Incidents);
        controller.apply_outcome(outcome(Resource::Incidents, seq3, Ok(Payload::Incidents(Vec::new()))));
        assert!(controller.snapshot.errors.get(Resource::Incidents).is_none());
    }

    #[test]
    fn timeline_refresh_auto_follows_first_correlated_incident() {
        let (mut controller, _handle) = controller();
        let seq = controller.seq.begin(Resource::Timeline);
        let timeline = vec![
            timeline_event(""),
            timeline_event("inc-2"),
            timeline_event("inc-1"),
        ];

        let effects =
            controller.apply_outcome(outcome(Resource::Timeline, seq, Ok(Payload::Timeline(timeline))));

        assert_eq!(controller.snapshot.selected_incident.as_deref(), Some("inc-2"));
        assert!(effects.contains(&Effect::SelectionChanged));
    }

    #[test]
    fn chain_for_stale_selection_is_dropped() {
        let (mut controller, _handle) =
            controller_with_selection(SelectionState::from_deep_link(Some("inc-2")));

        let seq = controller.seq.begin(Resource::IncidentChain);
        let stale = Payload::Chain {
            incident_id: "inc-1".to_string(),
            events: vec![IncidentChainEvent::default()],
        };
        controller.apply_outcome(outcome(Resource::IncidentChain, seq, Ok(stale)));
        assert!(controller.snapshot.chain.is_empty());

        let seq = controller.seq.begin(Resource::IncidentChain);
        let current = Payload::Chain {
            incident_id: "inc-2".to_string(),
            events: vec![IncidentChainEvent::default()],
        };
        controller.apply_outcome(outcome(Resource::IncidentChain, seq, Ok(current)));
        assert_eq!(controller.snapshot.chain.len(), 1);
    }

    #[test]
    fn live_transition_produces_refresh_effects() {
        let (mut controller, _handle) = controller();

        let running = LiveStats { status: "RUNNING".to_string(), ..Default::default() };
        assert!(controller.apply_live(running).is_empty());

        let alert = LiveStats { status: "LOOP_DETECTED".to_string(), ..Default::default() };
        let effects = controller.apply_live(alert);
        assert_eq!(
            effects,
            vec![
                Effect::Refresh(Resource::Incidents),
                Effect::Refresh(Resource::Timeline)
            ]
        );
    }

    #[test]
    fn stopped_to_stopped_produces_no_effects() {
        let (mut controller, _handle) = controller();
        let stopped = LiveStats { status: "STOPPED".to_string(), ..Default::default() };
        assert!(controller.apply_live(stopped.clone()).is_empty());
        assert!(controller.apply_live(stopped).is_empty());
    }

    #[test]
    fn explicit_selection_clears_previous_chain() {
        let (mut controller, _handle) =
            controller_with_selection(SelectionState::from_deep_link(Some("inc-1")));

        let seq = controller.seq.begin(Resource::IncidentChain);
        controller.apply_outcome(outcome(
            Resource::IncidentChain,
            seq,
            Ok(Payload::Chain {
                incident_id: "inc-1".to_string(),
                events: vec![IncidentChainEvent::default()],
            }),
        ));
        assert_eq!(controller.snapshot.chain.len(), 1);

        let effects = controller.apply_command(Command::Select("inc-9".to_string()));
        assert!(effects.contains(&Effect::SelectionChanged));
        assert!(controller.snapshot.chain.is_empty());
        assert_eq!(controller.snapshot.selected_incident.as_deref(), Some("inc-9"));
    }

    #[test]
    fn clear_selection_resets_snapshot_fields() {
        let (mut controller, _handle) =
            controller_with_selection(SelectionState::from_deep_link(Some("inc-1")));

        let effects = controller.apply_command(Command::ClearSelection);
        assert!(effects.contains(&Effect::SelectionChanged));
        assert_eq!(controller.snapshot.selected_incident, None);
        assert_eq!(controller.snapshot.share_url, None);
    }

    #[test]
    fn selection_sync_updates_share_url() {
        let config = ConsoleConfig::default();
        let client = ApiClient::new(&config).unwrap();
        let deep_link = DeepLink::parse("http://localhost:3000/").unwrap();
        let (mut controller, _handle) = Controller::new(
            client,
            config.poll,
            SelectionState::new(),
            Some(deep_link),
        );

        controller.apply_command(Command::Select("inc-4".to_string()));
        let share = controller.snapshot.share_url.as_deref().unwrap();
        assert!(share.contains("incident=inc-4"));
    }

    #[test]
    fn snapshot_published_on_every_apply() {
        let (mut controller, handle) = controller();
        let seq = controller.seq.begin(Resource::Incidents);
        controller.apply_outcome(outcome(
            Resource::Incidents,
            seq,
            Ok(Payload::Incidents(vec![Incident { id: 3, ..Default::default() }])),
        ));
        assert_eq!(handle.snapshot.borrow().incidents[0].id, 3);
    }
}
