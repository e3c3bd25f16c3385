//! Selection and deep-link state machine.
//!
//! Tracks which incident is "active", auto-follows the most relevant incident
//! when nothing is selected, and keeps a shareable URL parameter in sync. The
//! machine never mutates the snapshot; it only reads the freshest timeline.

use crate::model::TimelineEvent;
use reqwest::Url;
use thiserror::Error;

/// The console URL handed to [`DeepLink::parse`] was not an absolute URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid console URL: {0}")]
pub struct DeepLinkError(String);

/// Query parameter naming the selected incident in a deep link.
pub const INCIDENT_PARAM: &str = "incident";

/// `NoSelection` / `Selected(id)` as an option over the incident id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state from a deep-link parameter value; blank means no
    /// selection.
    pub fn from_deep_link(param: Option<&str>) -> Self {
        let selected = param
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self { selected }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Explicit user selection; wins immediately and is re-evaluated on the
    /// next timeline refresh.
    ///
    /// Returns the newly selected id when the state actually changed.
    pub fn select(&mut self, incident_id: &str) -> Option<String> {
        let incident_id = incident_id.trim();
        if incident_id.is_empty() || self.selected.as_deref() == Some(incident_id) {
            return None;
        }
        self.selected = Some(incident_id.to_string());
        self.selected.clone()
    }

    /// Transition to `NoSelection`. The caller is responsible for tearing down
    /// the incident-chain poll.
    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Auto-follow rule, evaluated after every timeline refresh.
    ///
    /// When nothing is selected, or the selected id no longer appears in the
    /// refreshed timeline, selects the first event in array order carrying a
    /// non-empty incident id. The tie-break depends on server-side ordering
    /// that is not contractually specified; it is pinned here as a deliberate
    /// policy, to be confirmed against the upstream API contract.
    ///
    /// Returns the newly selected id when a transition occurred.
    pub fn apply_timeline(&mut self, timeline: &[TimelineEvent]) -> Option<String> {
        if timeline.is_empty() {
            return None;
        }

        if let Some(current) = self.selected.as_deref() {
            if timeline.iter().any(|event| event.incident_id == current) {
                return None;
            }
        }

        let next = timeline
            .iter()
            .map(|event| event.incident_id.as_str())
            .find(|id| !id.is_empty())?;

        if self.selected.as_deref() == Some(next) {
            return None;
        }
        self.selected = Some(next.to_string());
        self.selected.clone()
    }
}

/// Shareable deep link over the console's own URL.
#[derive(Debug, Clone)]
pub struct DeepLink {
    url: Url,
}

impl DeepLink {
    pub fn parse(raw: &str) -> Result<Self, DeepLinkError> {
        let url = Url::parse(raw).map_err(|e| DeepLinkError(e.to_string()))?;
        Ok(Self { url })
    }

    /// Current value of the incident parameter, when present and non-blank.
    pub fn incident(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == INCIDENT_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Set the incident parameter, only when it differs from the current value
    /// so redundant navigation history entries are never created. Returns true
    /// when the URL changed.
    pub fn set_incident(&mut self, incident_id: &str) -> bool {
        if self.incident().as_deref() == Some(incident_id) {
            return false;
        }

        let retained: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != INCIDENT_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = self.url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(INCIDENT_PARAM, incident_id);
        drop(pairs);
        true
    }

    /// Absolute shareable link for the current state.
    pub fn share_url(&self) -> String {
        self.url.to_string()
    }
}
