//! Static catalog of aggregation methods the explorer can select

use crate::types::{AggregationMethodKind, AggregationOption};

const fn option(
    kind: AggregationMethodKind,
    display_label: &'static str,
    is_staff_only: bool,
    supports_bot_toggle: bool,
    supports_user_ids: bool,
) -> AggregationOption {
    AggregationOption {
        kind,
        display_label,
        is_staff_only,
        supports_bot_toggle,
        supports_user_ids,
        supports_joined_before: matches!(kind, AggregationMethodKind::JoinedBeforeDate),
    }
}

/// One entry per known kind, in menu order
pub static AGGREGATION_OPTIONS: [AggregationOption; 9] = [
    option(AggregationMethodKind::RecencyWeighted, "Recency Weighted", false, true, true),
    option(AggregationMethodKind::Unweighted, "Unweighted", false, true, true),
    option(AggregationMethodKind::SingleAggregation, "Single Aggregation", true, true, true),
    option(AggregationMethodKind::MetaculusPrediction, "Metaculus Prediction", true, false, false),
    option(AggregationMethodKind::MetaculusPros, "Pros", false, false, false),
    option(AggregationMethodKind::Medalists, "Medalists", true, true, false),
    option(AggregationMethodKind::SilverMedalists, "Silver Medalists", true, true, false),
    option(AggregationMethodKind::GoldMedalists, "Gold Medalists", true, true, false),
    option(AggregationMethodKind::JoinedBeforeDate, "Joined Before Date", true, true, false),
];

/// Look up the catalog entry for a kind. `Unknown` never resolves.
pub fn find_option(kind: AggregationMethodKind) -> Option<&'static AggregationOption> {
    AGGREGATION_OPTIONS.iter().find(|o| o.kind == kind)
}

/// Options visible to a caller; staff-only entries need `staff = true`.
pub fn available_options(staff: bool) -> impl Iterator<Item = &'static AggregationOption> {
    AGGREGATION_OPTIONS
        .iter()
        .filter(move |o| staff || !o.is_staff_only)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_entry_per_kind() {
        let mut kinds: Vec<_> = AGGREGATION_OPTIONS.iter().map(|o| o.kind).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), AGGREGATION_OPTIONS.len());
        assert!(find_option(AggregationMethodKind::Unknown).is_none());
    }

    #[test]
    fn test_staff_gating() {
        let public: Vec<_> = available_options(false).map(|o| o.kind).collect();
        assert!(public.contains(&AggregationMethodKind::RecencyWeighted));
        assert!(!public.contains(&AggregationMethodKind::GoldMedalists));
        assert_eq!(available_options(true).count(), AGGREGATION_OPTIONS.len());
    }

    #[test]
    fn test_only_cohort_kind_takes_date() {
        for opt in &AGGREGATION_OPTIONS {
            assert_eq!(
                opt.supports_joined_before,
                opt.kind == AggregationMethodKind::JoinedBeforeDate
            );
        }
    }
}
