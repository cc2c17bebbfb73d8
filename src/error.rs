//! Error taxonomy for contract-level faults.
//!
//! Expected explorer states (pending, per-method error, no data, needs
//! selection) are values carried in the view model, not errors.

use crate::types::AggregationMethodKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("invalid cohort date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("post {0} not found")]
    PostNotFound(u64),

    #[error("malformed persisted selection: {0}")]
    MalformedSelection(String),

    #[error("aggregation method '{0}' is staff-only")]
    StaffOnly(AggregationMethodKind),

    #[error("selection store unavailable: {0}")]
    Persistence(String),

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },
}

pub type ExplorerResult<T> = std::result::Result<T, ExplorerError>;
