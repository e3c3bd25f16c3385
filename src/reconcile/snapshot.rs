//! The in-memory snapshot exposed to the rest of the core.

use crate::model::{
    Incident, IncidentChainEvent, LifecycleSnapshot, LiveStats, ReplayHistory, SloSnapshot,
    TimelineEvent,
};

/// The resources the controller polls. `IncidentChain` is special: its timer
/// runs only while an incident is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Incidents,
    Timeline,
    Lifecycle,
    Slo,
    ReplayHistory,
    IncidentChain,
}

impl Resource {
    pub const COUNT: usize = 6;

    pub(crate) fn index(self) -> usize {
        match self {
            Resource::Incidents => 0,
            Resource::Timeline => 1,
            Resource::Lifecycle => 2,
            Resource::Slo => 3,
            Resource::ReplayHistory => 4,
            Resource::IncidentChain => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::Incidents => "incidents",
            Resource::Timeline => "timeline",
            Resource::Lifecycle => "lifecycle",
            Resource::Slo => "slo",
            Resource::ReplayHistory => "replay_history",
            Resource::IncidentChain => "incident_chain",
        }
    }
}

/// Per-resource error surface. A failed fetch flags only its own resource;
/// the cached value underneath is retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceErrors {
    errors: [Option<String>; Resource::COUNT],
}

impl ResourceErrors {
    pub fn get(&self, resource: Resource) -> Option<&str> {
        self.errors[resource.index()].as_deref()
    }

    pub(crate) fn set(&mut self, resource: Resource, error: Option<String>) {
        self.errors[resource.index()] = error;
    }

    pub fn any(&self) -> bool {
        self.errors.iter().any(Option::is_some)
    }
}

/// Everything the presentation layer reads, rebuilt incrementally by the
/// reconciliation loop and published wholesale after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleSnapshot {
    pub incidents: Vec<Incident>,
    pub timeline: Vec<TimelineEvent>,
    pub lifecycle: LifecycleSnapshot,
    pub slo: SloSnapshot,
    pub replay_history: ReplayHistory,
    /// Chain of the selected incident; empty when nothing is selected
    pub chain: Vec<IncidentChainEvent>,
    /// Latest push-stream payload; `None` until the first frame arrives
    pub live: Option<LiveStats>,
    /// Current selection, mirrored from the selection machine
    pub selected_incident: Option<String>,
    /// Shareable absolute link for the current selection, when a console URL
    /// was configured
    pub share_url: Option<String>,
    pub errors: ResourceErrors,
}
