//! Ordered, deduplicated store of selected aggregation configs.
//!
//! Every mutation returns a fresh store; order is insertion order and is
//! what list display and color assignment key off.

use crate::identity::{canonicalize, payload_id};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionStore {
    entries: Vec<SelectedConfig>,
}

impl SelectionStore {
    /// Build a store from persisted entries. Ids are re-derived from the
    /// entry fields, and the first of any duplicate ids wins.
    pub fn from_entries(entries: Vec<SelectedConfig>) -> Self {
        entries
            .into_iter()
            .map(canonicalize)
            .fold(Self::default(), |mut store, entry| {
                if !store.contains(&entry.id) {
                    store.entries.push(entry);
                }
                store
            })
    }

    /// Default selection: the question's own method and bot flag, or
    /// recency-weighted without bots when no question is resolved.
    pub fn initial(question: Option<&Question>) -> Self {
        let payload = match question {
            Some(q) => ConfigPayload::new(q.default_aggregation_method).with_bots(q.include_bots_in_aggregates),
            None => ConfigPayload::new(AggregationMethodKind::RecencyWeighted),
        };
        Self::default().add_configured(&payload)
    }

    pub fn entries(&self) -> &[SelectedConfig] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&SelectedConfig> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).map_or(false, |e| e.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SelectedConfig> {
        self.entries.iter().filter(|e| e.enabled)
    }

    pub fn has_enabled(&self) -> bool {
        self.entries.iter().any(|e| e.enabled)
    }

    /// Flip `enabled` without moving the entry; unknown ids are a no-op
    pub fn toggle_enabled(&self, id: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| {
                if e.id == id {
                    SelectedConfig { enabled: !e.enabled, ..e.clone() }
                } else {
                    e.clone()
                }
            })
            .collect();
        Self { entries }
    }

    /// Append a new enabled entry unless one with the same id exists
    pub fn add_configured(&self, payload: &ConfigPayload) -> Self {
        let id = payload_id(payload);
        if self.contains(&id) {
            return self.clone();
        }

        let mut entries = self.entries.clone();
        entries.push(canonicalize(SelectedConfig {
            id,
            kind: payload.kind,
            include_bots: payload.include_bots,
            joined_before_date: payload.joined_before_date,
            user_ids: payload.user_ids.clone(),
            enabled: true,
        }));
        Self { entries }
    }

    pub fn remove_selected(&self, id: &str) -> Self {
        Self {
            entries: self.entries.iter().filter(|e| e.id != id).cloned().collect(),
        }
    }
}
