//! Stable identity and badges for selected aggregation configs

use crate::catalog::find_option;
use crate::error::{ExplorerError, ExplorerResult};
use crate::types::*;
use chrono::NaiveDate;

const FIELD_SEP: char = ':';

/// Derive the id for a config. Fields the kind's catalog entry does not
/// accept are left out, and user ids are deduplicated and sorted so any
/// input order maps to the same key.
pub fn build_config_id(
    kind: AggregationMethodKind,
    include_bots: bool,
    joined_before_date: Option<NaiveDate>,
    user_ids: &[u64],
) -> String {
    let mut id = kind.as_str().to_string();
    let Some(opt) = find_option(kind) else {
        return id;
    };

    if opt.supports_bot_toggle {
        id.push(FIELD_SEP);
        id.push_str(if include_bots { "bots" } else { "nobots" });
    }

    if opt.supports_joined_before {
        if let Some(date) = joined_before_date {
            id.push(FIELD_SEP);
            id.push_str(&format!("joined<{}", date.format("%Y-%m-%d")));
        }
    }

    if opt.supports_user_ids {
        let users = normalize_user_ids(user_ids);
        if !users.is_empty() {
            let joined: Vec<String> = users.iter().map(u64::to_string).collect();
            id.push(FIELD_SEP);
            id.push_str("users=");
            id.push_str(&joined.join(","));
        }
    }

    id
}

/// Id for a payload, using the same gating as `build_config_id`
pub fn payload_id(payload: &ConfigPayload) -> String {
    build_config_id(
        payload.kind,
        payload.include_bots,
        payload.joined_before_date,
        &payload.user_ids,
    )
}

/// Clear the fields the kind's catalog entry does not accept, normalize
/// user ids and re-derive the id. Unknown kinds keep their stored id so
/// stale entries stay distinguishable.
pub fn canonicalize(config: SelectedConfig) -> SelectedConfig {
    let Some(opt) = find_option(config.kind) else {
        return config;
    };
    let include_bots = opt.supports_bot_toggle && config.include_bots;
    let joined_before_date = config.joined_before_date.filter(|_| opt.supports_joined_before);
    let user_ids = if opt.supports_user_ids {
        normalize_user_ids(&config.user_ids)
    } else {
        Vec::new()
    };

    SelectedConfig {
        id: build_config_id(config.kind, include_bots, joined_before_date, &user_ids),
        kind: config.kind,
        include_bots,
        joined_before_date,
        user_ids,
        enabled: config.enabled,
    }
}

/// Drop zeros and duplicates, sort ascending
pub fn normalize_user_ids(user_ids: &[u64]) -> Vec<u64> {
    let mut users: Vec<u64> = user_ids.iter().copied().filter(|&id| id > 0).collect();
    users.sort_unstable();
    users.dedup();
    users
}

/// Short badges shown next to a selection entry
pub fn build_chips(config: &SelectedConfig) -> Vec<String> {
    let mut chips = Vec::new();
    let Some(opt) = find_option(config.kind) else {
        return chips;
    };

    if config.include_bots && opt.supports_bot_toggle {
        chips.push("bots included".to_string());
    }
    if let Some(date) = config.joined_before_date.filter(|_| opt.supports_joined_before) {
        chips.push(format!("joined before {}", date.format("%Y-%m-%d")));
    }
    let users = if opt.supports_user_ids { config.user_ids.len() } else { 0 };
    match users {
        0 => {}
        1 => chips.push("1 user".to_string()),
        n => chips.push(format!("{} users", n)),
    }

    chips
}

pub fn build_base_label(option: &AggregationOption) -> &'static str {
    option.display_label
}

/// Parse a cohort cutoff typed by the user
pub fn parse_joined_before(raw: &str) -> ExplorerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ExplorerError::InvalidDate(raw.to_string()))
}
