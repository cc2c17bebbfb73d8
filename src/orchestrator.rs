//! Fans enabled configs out to the fetcher and classifies each outcome

use crate::catalog::find_option;
use crate::fetchers::AggregationFetcher;
use crate::selection::SelectionStore;
use crate::types::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-config results for one fetch pass, in store order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchBatch {
    pub results: Vec<MethodQueryResult>,
}

impl FetchBatch {
    pub fn is_any_pending(&self) -> bool {
        self.results.iter().any(|r| r.status.is_pending())
    }

    pub fn has_any_error(&self) -> bool {
        self.results.iter().any(|r| r.status.is_error())
    }

    pub fn get(&self, id: &str) -> Option<&MethodQueryResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Display label for a config's series
pub fn method_label(config: &SelectedConfig) -> String {
    find_option(config.kind)
        .map(|o| o.display_label.to_string())
        .unwrap_or_else(|| config.kind.to_string())
}

pub fn pending_result(config: &SelectedConfig) -> MethodQueryResult {
    MethodQueryResult {
        id: config.id.clone(),
        label: method_label(config),
        include_bots: config.include_bots,
        status: FetchStatus::Pending,
    }
}

pub struct FetchOrchestrator {
    fetcher: Arc<dyn AggregationFetcher>,
}

impl FetchOrchestrator {
    pub fn new(fetcher: Arc<dyn AggregationFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch every enabled config concurrently. Disabled configs and kinds
    /// missing from the catalog are never requested; without a question id
    /// every remaining config stays pending.
    pub async fn fetch_all(
        &self,
        post_id: u64,
        question_id: Option<u64>,
        store: &SelectionStore,
    ) -> FetchBatch {
        let enabled: Vec<&SelectedConfig> = store
            .enabled()
            .filter(|c| find_option(c.kind).is_some())
            .collect();

        let Some(question_id) = question_id else {
            debug!("No question resolved for post {}; {} configs pending", post_id, enabled.len());
            return FetchBatch {
                results: enabled.into_iter().map(pending_result).collect(),
            };
        };

        info!(
            "Fetching {} aggregations for post={}, question={} via {}",
            enabled.len(),
            post_id,
            question_id,
            self.fetcher.name()
        );

        let tasks = enabled.iter().map(|config| {
            let fetcher = self.fetcher.as_ref();
            async move {
                let outcome = fetcher.fetch(post_id, question_id, config).await;
                classify(config, outcome)
            }
        });
        let results = futures::future::join_all(tasks).await;

        FetchBatch { results }
    }
}

fn classify(config: &SelectedConfig, outcome: anyhow::Result<Option<AggregationSeries>>) -> MethodQueryResult {
    let status = match outcome {
        Ok(Some(series)) if !series.is_empty() => FetchStatus::Ready { series },
        Ok(_) => FetchStatus::NoData,
        Err(e) => {
            warn!("Aggregation fetch failed for {}: {:?}", config.id, e);
            FetchStatus::Error { message: e.to_string() }
        }
    };
    MethodQueryResult {
        status,
        ..pending_result(config)
    }
}
