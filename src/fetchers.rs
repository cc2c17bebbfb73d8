//! Collaborator traits for post lookup and per-method aggregation fetches

use crate::error::ExplorerError;
use crate::types::*;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Fetches one method's history for one question. `Ok(None)` or an empty
/// series means the upstream had nothing to aggregate.
#[async_trait]
pub trait AggregationFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(
        &self,
        post_id: u64,
        question_id: u64,
        config: &SelectedConfig,
    ) -> Result<Option<AggregationSeries>>;
}

#[async_trait]
pub trait PostSource: Send + Sync {
    async fn get_post(&self, post_id: u64) -> Result<Post>;
}

/// What a scripted fetcher answers for a config id
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Series(AggregationSeries),
    Empty,
    Fail(String),
}

/// In-memory fetcher answering from a fixed table keyed by config id
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    outcomes: HashMap<String, ScriptedOutcome>,
    fallback: Option<AggregationSeries>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, config_id: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(config_id.into(), outcome);
        self
    }

    /// Series returned for ids with no scripted outcome
    pub fn with_fallback(mut self, series: AggregationSeries) -> Self {
        self.fallback = Some(series);
        self
    }
}

#[async_trait]
impl AggregationFetcher for ScriptedFetcher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(
        &self,
        _post_id: u64,
        _question_id: u64,
        config: &SelectedConfig,
    ) -> Result<Option<AggregationSeries>> {
        match self.outcomes.get(&config.id) {
            Some(ScriptedOutcome::Series(series)) => Ok(Some(series.clone())),
            Some(ScriptedOutcome::Empty) => Ok(None),
            Some(ScriptedOutcome::Fail(msg)) => anyhow::bail!("{}", msg),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// In-memory post lookup
#[derive(Debug, Default)]
pub struct StaticPostSource {
    posts: HashMap<u64, Post>,
}

impl StaticPostSource {
    pub fn new(posts: impl IntoIterator<Item = Post>) -> Self {
        Self {
            posts: posts.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl PostSource for StaticPostSource {
    async fn get_post(&self, post_id: u64) -> Result<Post> {
        self.posts
            .get(&post_id)
            .cloned()
            .ok_or_else(|| ExplorerError::PostNotFound(post_id).into())
    }
}
