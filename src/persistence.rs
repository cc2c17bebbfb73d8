//! Write-through persistence of the explorer selection.
//!
//! Selections are encoded as an address-bar query string so a reload (or a
//! shared link) reconstructs the same store.

use crate::error::{ExplorerError, ExplorerResult};
use crate::selection::SelectionStore;
use crate::types::{SelectedConfig, SubQuestionValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSelection {
    pub post_id: u64,
    pub question_id: Option<u64>,
    pub sub_question: Option<SubQuestionValue>,
    pub configs: Vec<SelectedConfig>,
}

impl PersistedSelection {
    pub fn store(&self) -> SelectionStore {
        SelectionStore::from_entries(self.configs.clone())
    }

    /// Encode as `post_id=..&question_id=..&sub=..&configs=..`
    pub fn to_query_string(&self) -> ExplorerResult<String> {
        let mut pairs = vec![format!("post_id={}", self.post_id)];
        if let Some(qid) = self.question_id {
            pairs.push(format!("question_id={}", qid));
        }
        if let Some(sub) = &self.sub_question {
            let raw = serde_json::to_string(sub)
                .map_err(|e| ExplorerError::MalformedSelection(e.to_string()))?;
            pairs.push(format!("sub={}", urlencoding::encode(&raw)));
        }
        let configs = serde_json::to_string(&self.configs)
            .map_err(|e| ExplorerError::MalformedSelection(e.to_string()))?;
        pairs.push(format!("configs={}", urlencoding::encode(&configs)));
        Ok(pairs.join("&"))
    }

    pub fn from_query_string(query: &str) -> ExplorerResult<Self> {
        let mut params: HashMap<&str, String> = HashMap::new();
        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded = urlencoding::decode(value)
                .map_err(|e| ExplorerError::MalformedSelection(format!("{}: {}", key, e)))?;
            params.insert(key, decoded.into_owned());
        }

        let post_id = params
            .get("post_id")
            .ok_or_else(|| ExplorerError::MalformedSelection("missing post_id".to_string()))?
            .parse::<u64>()
            .map_err(|e| ExplorerError::MalformedSelection(format!("post_id: {}", e)))?;

        let question_id = params
            .get("question_id")
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| ExplorerError::MalformedSelection(format!("question_id: {}", e)))?;

        let sub_question = params
            .get("sub")
            .map(|v| serde_json::from_str::<SubQuestionValue>(v))
            .transpose()
            .map_err(|e| ExplorerError::MalformedSelection(format!("sub: {}", e)))?;

        let configs = match params.get("configs") {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| ExplorerError::MalformedSelection(format!("configs: {}", e)))?,
            None => Vec::new(),
        };

        Ok(Self {
            post_id,
            question_id,
            sub_question,
            configs,
        })
    }
}

/// External key-value collaborator holding one selection per post
pub trait SelectionPersistence: Send + Sync {
    fn load(&self, post_id: u64) -> ExplorerResult<Option<PersistedSelection>>;

    fn save(&self, selection: &PersistedSelection) -> ExplorerResult<()>;
}

/// Keeps encoded query strings in memory, one per post
#[derive(Debug, Default)]
pub struct QueryStringPersistence {
    queries: Mutex<HashMap<u64, String>>,
}

impl QueryStringPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current encoded query string for a post, as it would appear in the
    /// address bar
    pub fn query_for(&self, post_id: u64) -> Option<String> {
        self.queries.lock().ok()?.get(&post_id).cloned()
    }
}

impl SelectionPersistence for QueryStringPersistence {
    fn load(&self, post_id: u64) -> ExplorerResult<Option<PersistedSelection>> {
        let queries = self
            .queries
            .lock()
            .map_err(|e| ExplorerError::Persistence(e.to_string()))?;
        let query = queries.get(&post_id).cloned();
        query.map(|q| PersistedSelection::from_query_string(&q)).transpose()
    }

    fn save(&self, selection: &PersistedSelection) -> ExplorerResult<()> {
        let query = selection.to_query_string()?;
        debug!("Persisting selection for post {}: {}", selection.post_id, query);
        self.queries
            .lock()
            .map_err(|e| ExplorerError::Persistence(e.to_string()))?
            .insert(selection.post_id, query);
        Ok(())
    }
}
