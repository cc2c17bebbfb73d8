//! Explorer session and engine.
//!
//! `ExplorerSession` owns all mutable state for one explorer panel (the
//! selection, the sub-question choice, fetched results, hover and cursor)
//! and recomputes the view on demand. `ExplorerEngine` wires the session to
//! the post, fetch and persistence collaborators.

use crate::catalog::find_option;
use crate::error::{ExplorerError, ExplorerResult};
use crate::fetchers::{AggregationFetcher, PostSource};
use crate::fusion::merge_aggregations;
use crate::orchestrator::{FetchBatch, FetchOrchestrator};
use crate::persistence::{PersistedSelection, SelectionPersistence};
use crate::presentation::*;
use crate::selection::SelectionStore;
use crate::subquestion::*;
use crate::types::*;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Everything the list and chart renderers need for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorerView {
    pub post_id: u64,
    pub question_id: Option<u64>,
    pub sub_question_options: Vec<SubQuestionOption>,
    pub selected_sub_question: Option<SubQuestionValue>,
    pub needs_sub_selection: bool,
    pub list_items: Vec<ListItem>,
    pub panel: PanelState,
    pub distribution_cards: Vec<DistributionCard>,
    pub effective_timestamp: Option<f64>,
    pub hovered_id: Option<String>,
    pub is_any_pending: bool,
    pub has_any_error: bool,
}

pub struct ExplorerSession {
    post: Post,
    sub_question: Option<SubQuestionValue>,
    store: SelectionStore,
    results: Vec<MethodQueryResult>,
    view: ViewState,
    persistence: Arc<dyn SelectionPersistence>,
}

impl ExplorerSession {
    /// Restore the persisted selection for the post, or seed the default
    pub fn open(post: Post, persistence: Arc<dyn SelectionPersistence>) -> ExplorerResult<Self> {
        let (sub_question, store) = match persistence.load(post.id)? {
            Some(saved) => {
                debug!("Restored {} configs for post {}", saved.configs.len(), post.id);
                let store = saved.store();
                (saved.sub_question, store)
            }
            None => (None, SelectionStore::initial(derive_question(&post, None))),
        };

        let session = Self {
            post,
            sub_question,
            store,
            results: Vec::new(),
            view: ViewState::default(),
            persistence,
        };
        session.persist()?;
        Ok(session)
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn results(&self) -> &[MethodQueryResult] {
        &self.results
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn sub_question(&self) -> Option<&SubQuestionValue> {
        self.sub_question.as_ref()
    }

    pub fn target_question_id(&self) -> Option<u64> {
        derive_question_id(&self.post, self.sub_question.as_ref())
    }

    pub fn target_question(&self) -> Option<&Question> {
        derive_question(&self.post, self.sub_question.as_ref())
    }

    /// Switching sub-question invalidates every fetched result and the cursor
    pub fn select_sub_question(&mut self, value: Option<SubQuestionValue>) -> ExplorerResult<()> {
        if self.sub_question == value {
            return Ok(());
        }
        self.sub_question = value;
        self.results.clear();
        self.view.clear_cursor();
        self.persist()
    }

    pub fn add_configured(&mut self, payload: &ConfigPayload) -> ExplorerResult<()> {
        self.store = self.store.add_configured(payload);
        self.persist()
    }

    pub fn toggle_enabled(&mut self, id: &str) -> ExplorerResult<()> {
        self.store = self.store.toggle_enabled(id);
        self.reconcile();
        self.persist()
    }

    pub fn remove_selected(&mut self, id: &str) -> ExplorerResult<()> {
        self.store = self.store.remove_selected(id);
        self.reconcile();
        if self.view.hovered_id.as_deref() == Some(id) {
            self.view.clear_hovered();
        }
        self.persist()
    }

    /// Replace the whole selection, keeping payload order
    pub fn replace_selection(&mut self, payloads: &[ConfigPayload]) -> ExplorerResult<()> {
        self.store = payloads
            .iter()
            .fold(SelectionStore::default(), |store, p| store.add_configured(p));
        self.reconcile();
        self.persist()
    }

    /// Accept a fetch result if its config is still enabled; anything else
    /// is stale and dropped silently.
    pub fn receive_result(&mut self, result: MethodQueryResult) {
        if !self.store.is_enabled(&result.id) {
            debug!("Discarding stale result for {}", result.id);
            return;
        }
        match self.results.iter_mut().find(|r| r.id == result.id) {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
        let store = &self.store;
        self.results
            .sort_by_key(|r| store.position(&r.id).unwrap_or(usize::MAX));
    }

    pub fn apply_batch(&mut self, batch: FetchBatch) {
        for result in batch.results {
            self.receive_result(result);
        }
    }

    /// Drop held results whose config is no longer enabled
    pub fn reconcile(&mut self) {
        let store = &self.store;
        self.results.retain(|r| store.is_enabled(&r.id));
    }

    pub fn set_hovered(&mut self, id: impl Into<String>) {
        self.view.set_hovered(id);
    }

    pub fn clear_hovered(&mut self) {
        self.view.clear_hovered();
    }

    pub fn set_cursor(&mut self, timestamp: f64) {
        self.view.set_cursor(timestamp);
    }

    pub fn clear_cursor(&mut self) {
        self.view.clear_cursor();
    }

    pub fn is_any_pending(&self) -> bool {
        self.results.iter().any(|r| r.status.is_pending())
    }

    pub fn has_any_error(&self) -> bool {
        self.results.iter().any(|r| r.status.is_error())
    }

    fn persist(&self) -> ExplorerResult<()> {
        self.persistence.save(&PersistedSelection {
            post_id: self.post.id,
            question_id: self.target_question_id(),
            sub_question: self.sub_question.clone(),
            configs: self.store.entries().to_vec(),
        })
    }

    /// Recompute the full view model at wall-clock time `now`
    pub fn render(&self, now: f64, builder: &dyn ChoiceItemBuilder) -> ExplorerView {
        let sub_question_options = parse_sub_question_options(&self.post);
        let question = self.target_question();
        let focus = question.and_then(|q| focused_option(q, self.sub_question.as_ref()));
        let hovered = self.view.hovered_id.as_deref();
        let needs_sub_selection = !sub_question_options.is_empty() && question.is_none();

        let merged = merge_aggregations(question, &self.store, &self.results);
        let choice_items = merged
            .as_ref()
            .map(|m| build_choice_items(m, &self.store, &self.results, hovered, focus, builder))
            .unwrap_or_default();

        let panel = derive_panel_state(PanelInputs {
            store: &self.store,
            results: &self.results,
            merged: merged.as_ref(),
            choice_items,
            needs_sub_selection,
            now,
        });

        let (effective_timestamp, distribution_cards) = match (&panel, &merged) {
            (PanelState::Ready { chart, .. }, Some(m)) => {
                let at = self.view.effective_timestamp(&chart.timestamps);
                (at, build_distribution_cards(m, &chart.choice_items, at, focus))
            }
            _ => (self.view.cursor_timestamp, Vec::new()),
        };

        ExplorerView {
            post_id: self.post.id,
            question_id: self.target_question_id(),
            needs_sub_selection,
            sub_question_options,
            selected_sub_question: self.sub_question.clone(),
            list_items: build_list_items(&self.store, &self.results),
            panel,
            distribution_cards,
            effective_timestamp,
            hovered_id: self.view.hovered_id.clone(),
            is_any_pending: self.is_any_pending(),
            has_any_error: self.has_any_error(),
        }
    }
}

/// One-shot explore request, as posted to the server
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExploreRequest {
    pub post_id: u64,
    #[serde(default)]
    pub sub_question: Option<SubQuestionValue>,
    /// Replaces the persisted selection when present
    #[serde(default)]
    pub configs: Option<Vec<ConfigPayload>>,
    #[serde(default)]
    pub hovered_id: Option<String>,
    #[serde(default)]
    pub cursor_timestamp: Option<f64>,
    #[serde(default)]
    pub now: Option<f64>,
}

/// Main explorer engine (thread-safe via Arc)
pub struct ExplorerEngine {
    posts: Box<dyn PostSource>,
    orchestrator: FetchOrchestrator,
    persistence: Arc<dyn SelectionPersistence>,
    builder: Box<dyn ChoiceItemBuilder>,
    allow_staff_options: bool,
}

pub type SharedExplorerEngine = Arc<ExplorerEngine>;

impl ExplorerEngine {
    pub fn new(
        posts: Box<dyn PostSource>,
        fetcher: Arc<dyn AggregationFetcher>,
        persistence: Arc<dyn SelectionPersistence>,
        allow_staff_options: bool,
    ) -> SharedExplorerEngine {
        Arc::new(Self {
            posts,
            orchestrator: FetchOrchestrator::new(fetcher),
            persistence,
            builder: Box::new(CenterLineBuilder),
            allow_staff_options,
        })
    }

    pub fn builder(&self) -> &dyn ChoiceItemBuilder {
        self.builder.as_ref()
    }

    pub async fn open_session(&self, post_id: u64) -> Result<ExplorerSession> {
        let post = self.posts.get_post(post_id).await?;
        Ok(ExplorerSession::open(post, self.persistence.clone())?)
    }

    /// Fetch every enabled config for the session's current target and
    /// fold the outcomes back in.
    pub async fn refresh(&self, session: &mut ExplorerSession) {
        let snapshot = session.store().clone();
        let batch = self
            .orchestrator
            .fetch_all(session.post().id, session.target_question_id(), &snapshot)
            .await;
        session.apply_batch(batch);
    }

    /// Main entry point: open, apply the request, fetch and render
    pub async fn explore(&self, req: ExploreRequest) -> Result<ExplorerView> {
        info!(
            "Exploring post={}, sub_question={:?}, configs={:?}",
            req.post_id,
            req.sub_question,
            req.configs.as_ref().map(Vec::len)
        );

        let mut session = self.open_session(req.post_id).await?;

        if req.sub_question.is_some() {
            session.select_sub_question(req.sub_question.clone())?;
        }
        match &req.configs {
            Some(payloads) => {
                self.check_staff(payloads.iter().map(|p| p.kind))?;
                session.replace_selection(payloads)?;
            }
            None => self.check_staff(session.store().entries().iter().map(|c| c.kind))?,
        }

        self.refresh(&mut session).await;

        if let Some(id) = &req.hovered_id {
            session.set_hovered(id.clone());
        }
        if let Some(t) = req.cursor_timestamp {
            session.set_cursor(t);
        }

        let view = session.render(req.now.unwrap_or_else(now_secs), self.builder());
        if view.has_any_error {
            warn!("Post {}: some aggregation methods failed", req.post_id);
        }
        Ok(view)
    }

    /// Non-staff callers may neither add nor view staff-only methods
    fn check_staff(&self, mut kinds: impl Iterator<Item = AggregationMethodKind>) -> ExplorerResult<()> {
        if self.allow_staff_options {
            return Ok(());
        }
        match kinds.find(|&kind| find_option(kind).map_or(false, |o| o.is_staff_only)) {
            Some(kind) => Err(ExplorerError::StaffOnly(kind)),
            None => Ok(()),
        }
    }
}

/// Wall-clock time in seconds
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
