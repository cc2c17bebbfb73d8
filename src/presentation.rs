//! View-model derivation: list items, chart choice items, the shared
//! timestamp axis, the as-of cursor and the panel state.
//!
//! Everything here is a pure recomputation over the current state and is
//! cheap enough to rerun after every transition.

use crate::catalog::find_option;
use crate::identity::{build_base_label, build_chips};
use crate::selection::SelectionStore;
use crate::types::*;
use serde::Serialize;

/// Series colors, assigned by store position
pub const COLOR_PALETTE: [&str; 8] = [
    "#4c78a8", "#f58518", "#54a24b", "#e45756", "#72b7b2", "#b279a2", "#eeca3b", "#9d755d",
];

/// Renderer fallback for entries past the end of the palette
pub const NEUTRAL_GRAY: &str = "#9e9e9e";

pub const FAILED_TO_LOAD: &str = "failed to load data for selected methods";

/// Palette color for a zero-based store position. Positions past the
/// palette get `None`; colors are never reused.
pub fn palette_color(position: usize) -> Option<&'static str> {
    COLOR_PALETTE.get(position).copied()
}

pub fn resolve_color(color: Option<&'static str>) -> &'static str {
    color.unwrap_or(NEUTRAL_GRAY)
}

/// Enabled and present in the catalog; anything else is never charted
fn is_displayable(store: &SelectionStore, id: &str) -> bool {
    store
        .get(id)
        .map_or(false, |c| c.enabled && find_option(c.kind).is_some())
}

/// Color for a config id, by its position in the store
pub fn color_for(store: &SelectionStore, id: &str) -> Option<&'static str> {
    store.position(id).and_then(palette_color)
}

/// Selector panel rows, in store order. Entries whose kind is not in the
/// catalog (stale persisted ids) are skipped but still hold their position.
pub fn build_list_items(store: &SelectionStore, results: &[MethodQueryResult]) -> Vec<ListItem> {
    store
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(position, config)| {
            let option = find_option(config.kind)?;
            let status = results.iter().find(|r| r.id == config.id).map(|r| &r.status);
            Some(ListItem {
                id: config.id.clone(),
                label: build_base_label(option).to_string(),
                chips: build_chips(config),
                enabled: config.enabled,
                active_color: palette_color(position),
                is_loading: status.map_or(false, FetchStatus::is_pending),
                is_error: status.map_or(false, FetchStatus::is_error),
                is_no_data: status.map_or(false, FetchStatus::is_no_data),
            })
        })
        .collect()
}

/// Turns a raw series into chart points
pub trait ChoiceItemBuilder: Send + Sync {
    fn build(
        &self,
        series_key: &str,
        label: &str,
        series: &AggregationSeries,
        question: &MergedAggregationQuestion,
        option_index: usize,
    ) -> ChartChoiceItem;
}

/// Plots each entry's center for the option in focus
#[derive(Debug, Default, Clone, Copy)]
pub struct CenterLineBuilder;

impl ChoiceItemBuilder for CenterLineBuilder {
    fn build(
        &self,
        series_key: &str,
        label: &str,
        series: &AggregationSeries,
        _question: &MergedAggregationQuestion,
        option_index: usize,
    ) -> ChartChoiceItem {
        let (timestamps, values): (Vec<f64>, Vec<f64>) = series
            .history
            .iter()
            .filter_map(|e| e.centers.get(option_index).map(|&c| (e.start_time, c)))
            .unzip();

        ChartChoiceItem {
            series_key: series_key.to_string(),
            label: label.to_string(),
            color: None,
            timestamps,
            values,
            highlighted: false,
            resolution: None,
            displayed_resolution: None,
        }
    }
}

/// Index of the focused multiple-choice option; first option otherwise
pub fn option_index(question: &MergedAggregationQuestion, focus: Option<&str>) -> usize {
    focus
        .and_then(|label| question.options.iter().position(|o| o == label))
        .unwrap_or(0)
}

/// One chart series per fetched, ready, still-enabled method, in fetch
/// result order. Resolution is always cleared and highlight follows the
/// shared hover id.
pub fn build_choice_items(
    merged: &MergedAggregationQuestion,
    store: &SelectionStore,
    results: &[MethodQueryResult],
    hovered_id: Option<&str>,
    focus: Option<&str>,
    builder: &dyn ChoiceItemBuilder,
) -> Vec<ChartChoiceItem> {
    let index = option_index(merged, focus);
    results
        .iter()
        .filter(|r| is_displayable(store, &r.id))
        .filter_map(|r| {
            let series = merged.aggregations.get(&r.id)?;
            let item = builder.build(&r.id, &r.label, series, merged, index);
            Some(ChartChoiceItem {
                color: color_for(store, &r.id),
                highlighted: hovered_id == Some(r.id.as_str()),
                resolution: None,
                displayed_resolution: None,
                ..item
            })
        })
        .collect()
}

/// Sorted, deduplicated union of every item's timestamps plus an anchor:
/// the actual close time capped at `now`, or `now` itself.
pub fn build_timestamp_axis(items: &[ChartChoiceItem], actual_close_time: Option<f64>, now: f64) -> Vec<f64> {
    let anchor = actual_close_time.map_or(now, |close| close.min(now));
    let mut axis: Vec<f64> = items
        .iter()
        .flat_map(|item| item.timestamps.iter().copied())
        .chain(std::iter::once(anchor))
        .collect();
    axis.sort_by(f64::total_cmp);
    axis.dedup();
    axis
}

/// Hover and as-of cursor for one explorer session. Both are
/// last-write-wins and shared by the list and the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub hovered_id: Option<String>,
    pub cursor_timestamp: Option<f64>,
}

impl ViewState {
    pub fn set_hovered(&mut self, id: impl Into<String>) {
        self.hovered_id = Some(id.into());
    }

    pub fn clear_hovered(&mut self) {
        self.hovered_id = None;
    }

    pub fn set_cursor(&mut self, timestamp: f64) {
        self.cursor_timestamp = Some(timestamp);
    }

    pub fn clear_cursor(&mut self) {
        self.cursor_timestamp = None;
    }

    /// Cursor if scrubbed, else the latest axis point
    pub fn effective_timestamp(&self, axis: &[f64]) -> Option<f64> {
        self.cursor_timestamp.or_else(|| axis.last().copied())
    }
}

/// Entry in force at `t`: the latest one starting at or before `t` whose
/// end (if any) is after `t`.
pub fn snapshot_at(series: &AggregationSeries, t: f64) -> Option<&AggregateEntry> {
    series
        .history
        .iter()
        .filter(|e| e.start_time <= t)
        .max_by(|a, b| a.start_time.total_cmp(&b.start_time))
        .filter(|e| e.end_time.map_or(true, |end| t < end))
}

/// Distribution cards at the effective timestamp, one per chart series
pub fn build_distribution_cards(
    merged: &MergedAggregationQuestion,
    items: &[ChartChoiceItem],
    at: Option<f64>,
    focus: Option<&str>,
) -> Vec<DistributionCard> {
    let Some(at) = at else {
        return Vec::new();
    };
    let index = option_index(merged, focus);

    items
        .iter()
        .filter_map(|item| {
            let series = merged.aggregations.get(&item.series_key)?;
            let entry = snapshot_at(series, at)?;
            let pick = |v: &Option<Vec<f64>>| v.as_ref().and_then(|v| v.get(index).copied());
            Some(DistributionCard {
                series_key: item.series_key.clone(),
                label: item.label.clone(),
                color: item.color,
                start_time: entry.start_time,
                forecaster_count: entry.forecaster_count,
                center: entry.centers.get(index).copied(),
                interval_lower: pick(&entry.interval_lower_bounds),
                interval_upper: pick(&entry.interval_upper_bounds),
            })
        })
        .collect()
}

/// "Some methods failed: X, Y" over enabled configs, in store order
pub fn failure_notice(store: &SelectionStore, results: &[MethodQueryResult]) -> Option<String> {
    let failed: Vec<&str> = store
        .enabled()
        .filter(|config| find_option(config.kind).is_some())
        .filter_map(|config| results.iter().find(|r| r.id == config.id))
        .filter(|r| r.status.is_error())
        .map(|r| r.label.as_str())
        .collect();

    if failed.is_empty() {
        None
    } else {
        Some(format!("Some methods failed: {}", failed.join(", ")))
    }
}

/// Inputs to the panel-level decision
pub struct PanelInputs<'a> {
    pub store: &'a SelectionStore,
    pub results: &'a [MethodQueryResult],
    pub merged: Option<&'a MergedAggregationQuestion>,
    pub choice_items: Vec<ChartChoiceItem>,
    pub needs_sub_selection: bool,
    pub now: f64,
}

/// First match wins: nothing selected, sub-question missing, loading,
/// failed, ready. The chart counts as resolved once at least one enabled
/// method produced a series.
pub fn derive_panel_state(inputs: PanelInputs<'_>) -> PanelState {
    let PanelInputs { store, results, merged, choice_items, needs_sub_selection, now } = inputs;

    if !store.has_enabled() {
        return PanelState::SelectAtLeastOne;
    }
    if needs_sub_selection {
        return PanelState::NeedsSelection;
    }

    let live: Vec<&MethodQueryResult> = results.iter().filter(|r| store.is_enabled(&r.id)).collect();
    let any_pending = live.iter().any(|r| r.status.is_pending());

    let merged = match merged {
        Some(m) if !choice_items.is_empty() => m,
        _ if any_pending => return PanelState::Loading,
        _ => {
            return PanelState::Failed {
                message: FAILED_TO_LOAD.to_string(),
            }
        }
    };

    let timestamps = build_timestamp_axis(&choice_items, merged.actual_close_time, now);
    PanelState::Ready {
        chart: ChartModel {
            timestamps,
            actual_close_time: merged.actual_close_time,
            choice_items,
            question_type: merged.question_type,
            scaling: merged.scaling.clone(),
        },
        failure_notice: failure_notice(store, results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(t: f64, center: f64) -> AggregateEntry {
        AggregateEntry {
            start_time: t,
            end_time: None,
            forecaster_count: 4,
            centers: vec![center],
            interval_lower_bounds: Some(vec![center - 0.1]),
            interval_upper_bounds: Some(vec![center + 0.1]),
            means: None,
        }
    }

    fn item(key: &str, timestamps: Vec<f64>) -> ChartChoiceItem {
        ChartChoiceItem {
            series_key: key.to_string(),
            label: key.to_string(),
            color: None,
            values: vec![0.5; timestamps.len()],
            timestamps,
            highlighted: false,
            resolution: None,
            displayed_resolution: None,
        }
    }

    fn merged(aggregations: BTreeMap<String, AggregationSeries>) -> MergedAggregationQuestion {
        MergedAggregationQuestion {
            id: 1,
            label: "q".to_string(),
            question_type: QuestionType::Binary,
            scaling: None,
            options: vec![],
            actual_close_time: None,
            aggregations,
        }
    }

    fn ready(id: &str, series: AggregationSeries) -> MethodQueryResult {
        MethodQueryResult {
            id: id.to_string(),
            label: id.to_string(),
            include_bots: false,
            status: FetchStatus::Ready { series },
        }
    }

    fn status(id: &str, label: &str, status: FetchStatus) -> MethodQueryResult {
        MethodQueryResult {
            id: id.to_string(),
            label: label.to_string(),
            include_bots: false,
            status,
        }
    }

    fn three_store() -> SelectionStore {
        SelectionStore::default()
            .add_configured(&ConfigPayload::new(AggregationMethodKind::RecencyWeighted))
            .add_configured(&ConfigPayload::new(AggregationMethodKind::Unweighted))
            .add_configured(&ConfigPayload::new(AggregationMethodKind::MetaculusPros))
    }

    #[test]
    fn test_axis_only_now_when_empty() {
        assert_eq!(build_timestamp_axis(&[], None, 100.0), vec![100.0]);
    }

    #[test]
    fn test_axis_sorted_dedup_with_now() {
        let items = [item("a", vec![5.0, 1.0, 3.0]), item("b", vec![3.0])];
        assert_eq!(build_timestamp_axis(&items, None, 10.0), vec![1.0, 3.0, 5.0, 10.0]);
    }

    #[test]
    fn test_axis_close_time_capped_at_now() {
        let items = [item("a", vec![1.0])];
        assert_eq!(build_timestamp_axis(&items, Some(4.0), 10.0), vec![1.0, 4.0]);
        assert_eq!(build_timestamp_axis(&items, Some(40.0), 10.0), vec![1.0, 10.0]);
        assert_eq!(build_timestamp_axis(&items, Some(1.0), 10.0), vec![1.0]);
    }

    #[test]
    fn test_effective_timestamp() {
        let mut view = ViewState::default();
        assert_eq!(view.effective_timestamp(&[]), None);
        assert_eq!(view.effective_timestamp(&[1.0, 7.0]), Some(7.0));
        view.set_cursor(3.0);
        assert_eq!(view.effective_timestamp(&[1.0, 7.0]), Some(3.0));
        view.clear_cursor();
        assert_eq!(view.effective_timestamp(&[1.0, 7.0]), Some(7.0));
    }

    #[test]
    fn test_palette_exhaustion_falls_back_to_gray() {
        assert_eq!(palette_color(0), Some(COLOR_PALETTE[0]));
        assert_eq!(palette_color(COLOR_PALETTE.len()), None);
        assert_eq!(resolve_color(palette_color(COLOR_PALETTE.len() + 3)), NEUTRAL_GRAY);

        let store = (1..=10u64).fold(SelectionStore::default(), |s, uid| {
            s.add_configured(&ConfigPayload::new(AggregationMethodKind::RecencyWeighted).with_user_ids([uid]))
        });
        let items = build_list_items(&store, &[]);
        assert_eq!(items.len(), 10);
        assert_eq!(items[7].active_color, Some(COLOR_PALETTE[7]));
        assert_eq!(items[8].active_color, None);
        assert_eq!(items[9].active_color, None);
    }

    #[test]
    fn test_list_items_status_and_order() {
        let store = three_store().toggle_enabled("unweighted:nobots");
        let results = [
            status("metaculus_pros", "Pros", FetchStatus::NoData),
            status("recency_weighted:nobots", "Recency Weighted", FetchStatus::Error { message: "x".to_string() }),
        ];
        let items = build_list_items(&store, &results);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["recency_weighted:nobots", "unweighted:nobots", "metaculus_pros"]);

        assert!(items[0].is_error && !items[0].is_loading);
        assert!(!items[1].enabled);
        assert!(!items[1].is_loading && !items[1].is_error && !items[1].is_no_data);
        assert!(items[2].is_no_data);
        assert_eq!(items[1].active_color, Some(COLOR_PALETTE[1]));
        assert_eq!(items[0].label, "Recency Weighted");
    }

    #[test]
    fn test_unknown_kind_skipped_keeps_colors() {
        let store = three_store();
        let mut entries = store.entries().to_vec();
        entries.insert(
            0,
            SelectedConfig {
                id: "retired".to_string(),
                kind: AggregationMethodKind::Unknown,
                include_bots: false,
                joined_before_date: None,
                user_ids: vec![],
                enabled: true,
            },
        );
        let items = build_list_items(&SelectionStore::from_entries(entries), &[]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].active_color, Some(COLOR_PALETTE[1]));
    }

    #[test]
    fn test_unknown_kind_not_charted_or_reported() {
        let mut entries = three_store().entries().to_vec();
        entries.push(SelectedConfig {
            id: "retired".to_string(),
            kind: AggregationMethodKind::Unknown,
            include_bots: false,
            joined_before_date: None,
            user_ids: vec![],
            enabled: true,
        });
        let store = SelectionStore::from_entries(entries);
        let series = AggregationSeries::new(vec![entry(1.0, 0.3)]);
        let results = [
            ready("recency_weighted:nobots", series.clone()),
            ready("retired", series.clone()),
            status("retired", "unknown", FetchStatus::Error { message: "x".to_string() }),
        ];
        let m = merged(BTreeMap::from([
            ("recency_weighted:nobots".to_string(), series.clone()),
            ("retired".to_string(), series),
        ]));

        let items = build_choice_items(&m, &store, &results, None, None, &CenterLineBuilder);
        let keys: Vec<_> = items.iter().map(|i| i.series_key.as_str()).collect();
        assert_eq!(keys, vec!["recency_weighted:nobots"]);
        assert_eq!(failure_notice(&store, &results[2..]), None);
    }

    #[test]
    fn test_hover_highlights_exactly_one() {
        let store = three_store();
        let ids: Vec<String> = store.entries().iter().map(|e| e.id.clone()).collect();
        let series = AggregationSeries::new(vec![entry(1.0, 0.3)]);
        let results: Vec<_> = ids.iter().map(|id| ready(id, series.clone())).collect();
        let m = merged(ids.iter().map(|id| (id.clone(), series.clone())).collect());

        let items = build_choice_items(&m, &store, &results, Some("unweighted:nobots"), None, &CenterLineBuilder);
        assert_eq!(items.len(), 3);
        let highlighted: Vec<_> = items.iter().filter(|i| i.highlighted).map(|i| i.series_key.as_str()).collect();
        assert_eq!(highlighted, vec!["unweighted:nobots"]);
        assert!(items.iter().all(|i| i.resolution.is_none() && i.displayed_resolution.is_none()));
        assert_eq!(items[2].color, Some(COLOR_PALETTE[2]));

        let none = build_choice_items(&m, &store, &results, None, None, &CenterLineBuilder);
        assert!(none.iter().all(|i| !i.highlighted));
    }

    #[test]
    fn test_multiple_choice_focus() {
        let series = AggregationSeries::new(vec![AggregateEntry {
            centers: vec![0.2, 0.8],
            ..entry(1.0, 0.0)
        }]);
        let mut m = merged(BTreeMap::from([("recency_weighted:nobots".to_string(), series.clone())]));
        m.question_type = QuestionType::MultipleChoice;
        m.options = vec!["Red".to_string(), "Blue".to_string()];
        let store = three_store();
        let results = [ready("recency_weighted:nobots", series)];

        let blue = build_choice_items(&m, &store, &results, None, Some("Blue"), &CenterLineBuilder);
        assert_eq!(blue[0].values, vec![0.8]);
        let default = build_choice_items(&m, &store, &results, None, None, &CenterLineBuilder);
        assert_eq!(default[0].values, vec![0.2]);
    }

    #[test]
    fn test_snapshot_at() {
        let series = AggregationSeries::new(vec![
            entry(1.0, 0.1),
            AggregateEntry { end_time: Some(5.0), ..entry(3.0, 0.3) },
        ]);
        assert!(snapshot_at(&series, 0.5).is_none());
        assert_eq!(snapshot_at(&series, 2.0).unwrap().centers, vec![0.1]);
        assert_eq!(snapshot_at(&series, 4.0).unwrap().centers, vec![0.3]);
        assert!(snapshot_at(&series, 6.0).is_none());
    }

    #[test]
    fn test_distribution_cards() {
        let series = AggregationSeries::new(vec![entry(1.0, 0.1), entry(3.0, 0.3)]);
        let m = merged(BTreeMap::from([("a".to_string(), series)]));
        let items = [ChartChoiceItem { color: Some(COLOR_PALETTE[0]), ..item("a", vec![1.0, 3.0]) }];

        let cards = build_distribution_cards(&m, &items, Some(2.0), None);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].center, Some(0.1));
        assert_eq!(cards[0].color, Some(COLOR_PALETTE[0]));
        assert_eq!(cards[0].forecaster_count, 4);
        assert!(build_distribution_cards(&m, &items, None, None).is_empty());
    }

    #[test]
    fn test_panel_precedence() {
        let empty = SelectionStore::default();
        let stale_error = [status("gone", "Gone", FetchStatus::Error { message: "x".to_string() })];
        assert_eq!(
            derive_panel_state(PanelInputs {
                store: &empty,
                results: &stale_error,
                merged: None,
                choice_items: vec![],
                needs_sub_selection: false,
                now: 1.0,
            }),
            PanelState::SelectAtLeastOne
        );

        let store = three_store();
        let pending: Vec<_> = store
            .entries()
            .iter()
            .map(|e| status(&e.id, &e.id, FetchStatus::Pending))
            .collect();
        assert_eq!(
            derive_panel_state(PanelInputs {
                store: &store,
                results: &pending,
                merged: None,
                choice_items: vec![],
                needs_sub_selection: false,
                now: 1.0,
            }),
            PanelState::Loading
        );
        assert_eq!(
            derive_panel_state(PanelInputs {
                store: &store,
                results: &pending,
                merged: None,
                choice_items: vec![],
                needs_sub_selection: true,
                now: 1.0,
            }),
            PanelState::NeedsSelection
        );

        let failed: Vec<_> = store
            .entries()
            .iter()
            .map(|e| status(&e.id, &e.id, FetchStatus::Error { message: "x".to_string() }))
            .collect();
        let m = merged(BTreeMap::new());
        assert_eq!(
            derive_panel_state(PanelInputs {
                store: &store,
                results: &failed,
                merged: Some(&m),
                choice_items: vec![],
                needs_sub_selection: false,
                now: 1.0,
            }),
            PanelState::Failed { message: FAILED_TO_LOAD.to_string() }
        );
    }

    #[test]
    fn test_panel_ready_with_notice() {
        let store = three_store();
        let series = AggregationSeries::new(vec![entry(1.0, 0.5)]);
        let results = [
            ready("recency_weighted:nobots", series.clone()),
            status("unweighted:nobots", "Unweighted", FetchStatus::Error { message: "x".to_string() }),
            status("metaculus_pros", "Pros", FetchStatus::Error { message: "y".to_string() }),
        ];
        let m = merged(BTreeMap::from([("recency_weighted:nobots".to_string(), series)]));
        let items = build_choice_items(&m, &store, &results, None, None, &CenterLineBuilder);

        match derive_panel_state(PanelInputs {
            store: &store,
            results: &results,
            merged: Some(&m),
            choice_items: items,
            needs_sub_selection: false,
            now: 9.0,
        }) {
            PanelState::Ready { chart, failure_notice } => {
                assert_eq!(chart.timestamps, vec![1.0, 9.0]);
                assert_eq!(chart.choice_items.len(), 1);
                assert_eq!(failure_notice.as_deref(), Some("Some methods failed: Unweighted, Pros"));
            }
            other => panic!("expected ready panel, got {:?}", other),
        }
    }
}
