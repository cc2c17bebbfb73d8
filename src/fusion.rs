//! Merge ready per-method series into one chart-ready question

use crate::selection::SelectionStore;
use crate::types::*;
use tracing::{debug, info};

/// Build the merged question, or `None` when there is nothing to merge
/// into (no question resolved or no config enabled).
///
/// Only results for configs enabled in `store` are consumed; anything else
/// is stale and dropped. Inputs are never mutated.
pub fn merge_aggregations(
    question: Option<&Question>,
    store: &SelectionStore,
    results: &[MethodQueryResult],
) -> Option<MergedAggregationQuestion> {
    let question = question?;
    if !store.has_enabled() {
        return None;
    }

    let mut aggregations = question.aggregations.clone();
    let mut merged = 0usize;
    for result in results {
        if !store.is_enabled(&result.id) {
            debug!("Dropping stale result for {}", result.id);
            continue;
        }
        if let Some(series) = result.status.series() {
            aggregations.insert(result.id.clone(), series.clone());
            merged += 1;
        }
    }

    info!(
        "Merged {} of {} method results into question {}",
        merged,
        results.len(),
        question.id
    );

    Some(MergedAggregationQuestion {
        id: question.id,
        label: question.label.clone(),
        question_type: question.question_type,
        scaling: merged_scaling(question),
        options: question.options.clone(),
        actual_close_time: question.actual_close_time,
        aggregations,
    })
}

/// Binary charts use a fixed 0..1 axis regardless of reported scaling
fn merged_scaling(question: &Question) -> Option<Scaling> {
    match question.question_type {
        QuestionType::Binary => None,
        _ => question.scaling.clone(),
    }
}
