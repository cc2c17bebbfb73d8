//! Aggregation explorer engine
//!
//! Compares forecast aggregation methods for one question:
//! - Stable identity and deduplication of selected method configs
//! - Sub-question resolution for group and conditional posts
//! - Concurrent per-method fetches with independent failure
//! - Fusion of ready series into one chart-ready question
//! - List, chart, timestamp-axis and as-of snapshot view models

pub mod types;
pub mod error;
pub mod catalog;
pub mod identity;
pub mod subquestion;
pub mod selection;
pub mod persistence;
pub mod fetchers;
pub mod orchestrator;
pub mod fusion;
pub mod presentation;
pub mod explorer;
pub mod aggregation_client;
pub mod post_client;
pub mod config;
pub mod server;

pub use types::*;
pub use error::{ExplorerError, ExplorerResult};
pub use explorer::{now_secs, ExploreRequest, ExplorerEngine, ExplorerSession, ExplorerView};
pub use fetchers::{AggregationFetcher, PostSource, ScriptedFetcher, ScriptedOutcome, StaticPostSource};
pub use selection::SelectionStore;
pub use persistence::{PersistedSelection, QueryStringPersistence, SelectionPersistence};
pub use aggregation_client::AggregationClient;
pub use post_client::PostClient;
pub use config::ExplorerConfig;
