//! HTTP client for looking up posts by id
use crate::error::ExplorerError;
use crate::fetchers::PostSource;
use crate::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PostClient {
    base_url: String,
    client: reqwest::Client,
}

/// Question as the posts API returns it
#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: u64,
    #[serde(default)]
    label: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    #[serde(default)]
    scaling: Option<Scaling>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    actual_close_time: Option<DateTime<Utc>>,
    #[serde(default)]
    default_aggregation_method: Option<AggregationMethodKind>,
    #[serde(default)]
    include_bots_in_aggregates: bool,
}

impl From<RawQuestion> for Question {
    fn from(raw: RawQuestion) -> Self {
        Question {
            id: raw.id,
            label: raw.label,
            question_type: raw.question_type,
            scaling: raw.scaling,
            options: raw.options,
            actual_close_time: raw.actual_close_time.map(|t| t.timestamp() as f64),
            default_aggregation_method: raw
                .default_aggregation_method
                .unwrap_or(AggregationMethodKind::RecencyWeighted),
            include_bots_in_aggregates: raw.include_bots_in_aggregates,
            aggregations: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawConditional {
    question_yes: RawQuestion,
    question_no: RawQuestion,
}

/// Post payload: exactly one of the three shape fields is expected
#[derive(Debug, Deserialize)]
struct RawPost {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    question: Option<RawQuestion>,
    #[serde(default)]
    group_of_questions: Option<RawGroup>,
    #[serde(default)]
    conditional: Option<RawConditional>,
}

impl RawPost {
    fn into_post(self) -> Result<Post> {
        let content = match (self.question, self.group_of_questions, self.conditional) {
            (Some(q), None, None) => PostContent::Question(q.into()),
            (None, Some(group), None) => PostContent::GroupOfQuestions(GroupOfQuestions {
                questions: group.questions.into_iter().map(Question::from).collect(),
            }),
            (None, None, Some(pair)) => PostContent::Conditional(ConditionalPair {
                question_yes: pair.question_yes.into(),
                question_no: pair.question_no.into(),
            }),
            _ => anyhow::bail!("post {} has no single question shape", self.id),
        };
        Ok(Post {
            id: self.id,
            title: self.title,
            content,
        })
    }
}

impl PostClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PostSource for PostClient {
    async fn get_post(&self, post_id: u64) -> Result<Post> {
        let url = format!("{}/posts/{}/", self.base_url, post_id);
        debug!("Fetching post from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to call posts API")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ExplorerError::PostNotFound(post_id).into());
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExplorerError::Upstream {
                service: "posts API",
                status,
                body,
            }
            .into());
        }

        let raw: RawPost = response
            .json()
            .await
            .context("Failed to parse posts API response")?;
        raw.into_post()
    }
}
