//! HTTP-based aggregation fetcher backed by the aggregation explorer API

use crate::fetchers::AggregationFetcher;
use crate::types::{AggregationSeries, SelectedConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Response body: one history per requested method name
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    aggregations: HashMap<String, AggregationSeries>,
}

pub struct AggregationClient {
    service_url: String,
    client: reqwest::Client,
}

impl AggregationClient {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Query parameters describing one config
    fn query_params(post_id: u64, question_id: u64, config: &SelectedConfig) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("post_id", post_id.to_string()),
            ("question_id", question_id.to_string()),
            ("aggregation_methods", config.kind.to_string()),
            ("include_bots", config.include_bots.to_string()),
        ];
        if let Some(date) = config.joined_before_date {
            params.push(("joined_before", date.format("%Y-%m-%d").to_string()));
        }
        if !config.user_ids.is_empty() {
            let ids: Vec<String> = config.user_ids.iter().map(u64::to_string).collect();
            params.push(("user_ids", ids.join(",")));
        }
        params
    }

    fn build_url(&self, params: &[(&'static str, String)]) -> String {
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        format!("{}/aggregation_explorer/?{}", self.service_url, query.join("&"))
    }
}

#[async_trait]
impl AggregationFetcher for AggregationClient {
    fn name(&self) -> &'static str {
        "http_aggregation"
    }

    async fn fetch(
        &self,
        post_id: u64,
        question_id: u64,
        config: &SelectedConfig,
    ) -> Result<Option<AggregationSeries>> {
        let url = self.build_url(&Self::query_params(post_id, question_id, config));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to call aggregation service")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Aggregation service error ({}): {}", status, error_text);
        }

        let mut body: ExplorerResponse = response
            .json()
            .await
            .context("Failed to parse aggregation service response")?;

        let series = body.aggregations.remove(config.kind.as_str());
        tracing::debug!(
            "Aggregation {} for question {}: {} entries",
            config.id,
            question_id,
            series.as_ref().map_or(0, |s| s.history.len())
        );

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::parse_joined_before;
    use crate::types::AggregationMethodKind;

    fn config() -> SelectedConfig {
        SelectedConfig {
            id: "joined_before_date:bots:joined<2024-01-01".to_string(),
            kind: AggregationMethodKind::JoinedBeforeDate,
            include_bots: true,
            joined_before_date: Some(parse_joined_before("2024-01-01").unwrap()),
            user_ids: vec![],
            enabled: true,
        }
    }

    #[test]
    fn test_build_url() {
        let client = AggregationClient::new("http://api");
        let url = client.build_url(&AggregationClient::query_params(5, 6, &config()));
        assert_eq!(
            url,
            "http://api/aggregation_explorer/?post_id=5&question_id=6\
             &aggregation_methods=joined_before_date&include_bots=true&joined_before=2024-01-01"
        );
    }

    #[test]
    fn test_user_ids_encoded() {
        let cfg = SelectedConfig {
            kind: AggregationMethodKind::RecencyWeighted,
            joined_before_date: None,
            user_ids: vec![3, 8],
            ..config()
        };
        let params = AggregationClient::query_params(1, 2, &cfg);
        assert!(params.contains(&("user_ids", "3,8".to_string())));
        let url = AggregationClient::new("http://api").build_url(&params);
        assert!(url.ends_with("user_ids=3%2C8"));
    }

    #[test]
    fn test_parse_response() {
        let body: ExplorerResponse = serde_json::from_str(
            r#"{"aggregations": {"unweighted": {"history": [
                {"start_time": 1.0, "centers": [0.4], "forecaster_count": 2}
            ]}}}"#,
        )
        .unwrap();
        assert_eq!(body.aggregations["unweighted"].history.len(), 1);
    }
}
