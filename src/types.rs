//! Core type definitions for the aggregation explorer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What an aggregation computes. Closed set; unrecognised persisted tags
/// land on `Unknown` so stale selections can be skipped instead of rejected.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethodKind {
    RecencyWeighted,
    Unweighted,
    SingleAggregation,
    MetaculusPrediction,
    MetaculusPros,
    Medalists,
    SilverMedalists,
    GoldMedalists,
    JoinedBeforeDate,
    #[serde(other)]
    Unknown,
}

impl AggregationMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecencyWeighted => "recency_weighted",
            Self::Unweighted => "unweighted",
            Self::SingleAggregation => "single_aggregation",
            Self::MetaculusPrediction => "metaculus_prediction",
            Self::MetaculusPros => "metaculus_pros",
            Self::Medalists => "medalists",
            Self::SilverMedalists => "silver_medalists",
            Self::GoldMedalists => "gold_medalists",
            Self::JoinedBeforeDate => "joined_before_date",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AggregationMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static catalog entry describing which parameters a kind accepts
#[derive(Debug, Clone, Serialize)]
pub struct AggregationOption {
    pub kind: AggregationMethodKind,
    pub display_label: &'static str,
    pub is_staff_only: bool,
    pub supports_bot_toggle: bool,
    pub supports_user_ids: bool,
    pub supports_joined_before: bool,
}

/// Parameters for a new selection entry, before an id is derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPayload {
    pub kind: AggregationMethodKind,
    #[serde(default)]
    pub include_bots: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_before_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<u64>,
}

impl ConfigPayload {
    pub fn new(kind: AggregationMethodKind) -> Self {
        Self {
            kind,
            include_bots: false,
            joined_before_date: None,
            user_ids: Vec::new(),
        }
    }

    pub fn with_bots(mut self, include_bots: bool) -> Self {
        self.include_bots = include_bots;
        self
    }

    pub fn joined_before(mut self, date: NaiveDate) -> Self {
        self.joined_before_date = Some(date);
        self
    }

    pub fn with_user_ids(mut self, user_ids: impl IntoIterator<Item = u64>) -> Self {
        self.user_ids = user_ids.into_iter().collect();
        self
    }
}

/// A user-chosen instance of a catalog option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedConfig {
    pub id: String,
    pub kind: AggregationMethodKind,
    #[serde(default)]
    pub include_bots: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_before_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// One point of an aggregation history. For binary questions `centers`
/// has one value; for multiple-choice one value per option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub forecaster_count: u32,
    #[serde(default)]
    pub centers: Vec<f64>,
    #[serde(default)]
    pub interval_lower_bounds: Option<Vec<f64>>,
    #[serde(default)]
    pub interval_upper_bounds: Option<Vec<f64>>,
    #[serde(default)]
    pub means: Option<Vec<f64>>,
}

/// Time-indexed aggregation history for one method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationSeries {
    #[serde(default)]
    pub history: Vec<AggregateEntry>,
}

impl AggregationSeries {
    pub fn new(history: Vec<AggregateEntry>) -> Self {
        Self { history }
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.history.iter().map(|e| e.start_time).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Binary,
    Numeric,
    Date,
    MultipleChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    #[serde(default)]
    pub zero_point: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub scaling: Option<Scaling>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub actual_close_time: Option<f64>,
    #[serde(default = "default_method")]
    pub default_aggregation_method: AggregationMethodKind,
    #[serde(default)]
    pub include_bots_in_aggregates: bool,
    #[serde(default)]
    pub aggregations: BTreeMap<String, AggregationSeries>,
}

fn default_method() -> AggregationMethodKind {
    AggregationMethodKind::RecencyWeighted
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalPair {
    pub question_yes: Question,
    pub question_no: Question,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOfQuestions {
    pub questions: Vec<Question>,
}

/// Exclusive post shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostContent {
    Question(Question),
    GroupOfQuestions(GroupOfQuestions),
    Conditional(ConditionalPair),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub content: PostContent,
}

/// Value half of a sub-question option: a member question id, or an
/// answer label for flat multiple-choice questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubQuestionValue {
    Id(u64),
    Label(String),
}

impl SubQuestionValue {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Label(label) => Some(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestionOption {
    pub value: SubQuestionValue,
    pub label: String,
}

/// Outcome of one method's fetch. The series exists only when ready.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Pending,
    Error { message: String },
    NoData,
    Ready { series: AggregationSeries },
}

impl FetchStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    pub fn series(&self) -> Option<&AggregationSeries> {
        match self {
            Self::Ready { series } => Some(series),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodQueryResult {
    pub id: String,
    pub label: String,
    pub include_bots: bool,
    #[serde(flatten)]
    pub status: FetchStatus,
}

/// Fusion output: the target question's shape with aggregations keyed by
/// config id alongside the question's own method-keyed entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedAggregationQuestion {
    pub id: u64,
    pub label: String,
    pub question_type: QuestionType,
    pub scaling: Option<Scaling>,
    pub options: Vec<String>,
    pub actual_close_time: Option<f64>,
    pub aggregations: BTreeMap<String, AggregationSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartChoiceItem {
    pub series_key: String,
    pub label: String,
    pub color: Option<&'static str>,
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
    pub highlighted: bool,
    pub resolution: Option<String>,
    pub displayed_resolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub id: String,
    pub label: String,
    pub chips: Vec<String>,
    pub enabled: bool,
    pub active_color: Option<&'static str>,
    pub is_loading: bool,
    pub is_error: bool,
    pub is_no_data: bool,
}

/// Point-in-time view of one method's distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionCard {
    pub series_key: String,
    pub label: String,
    pub color: Option<&'static str>,
    pub start_time: f64,
    pub forecaster_count: u32,
    pub center: Option<f64>,
    pub interval_lower: Option<f64>,
    pub interval_upper: Option<f64>,
}

/// Everything the chart renderer consumes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartModel {
    pub timestamps: Vec<f64>,
    pub actual_close_time: Option<f64>,
    pub choice_items: Vec<ChartChoiceItem>,
    pub question_type: QuestionType,
    pub scaling: Option<Scaling>,
}

/// Panel-level outcome, first matching state wins
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelState {
    SelectAtLeastOne,
    NeedsSelection,
    Loading,
    Failed { message: String },
    Ready {
        chart: ChartModel,
        failure_notice: Option<String>,
    },
}
