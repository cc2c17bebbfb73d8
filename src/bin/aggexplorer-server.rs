//! Aggregation explorer HTTP server binary

use aggexplorer::server::{run_server, AppState};
use aggexplorer::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = ExplorerConfig::from_env();
    tracing::info!("Aggregation explorer v{}", env!("CARGO_PKG_VERSION"));

    let use_real = std::env::args().any(|arg| arg == "--use-real");
    let persistence = Arc::new(QueryStringPersistence::new());

    let engine = if use_real {
        tracing::info!("Mode: HTTP collaborators at {}", config.api_base_url);
        ExplorerEngine::new(
            Box::new(PostClient::new(config.api_base_url.clone())),
            Arc::new(AggregationClient::new(config.api_base_url.clone())),
            persistence,
            config.include_staff_options,
        )
    } else {
        tracing::info!("Mode: demo post and scripted aggregations (use --use-real for live data)");
        let (post, fetcher) = demo_fixtures();
        ExplorerEngine::new(
            Box::new(StaticPostSource::new([post])),
            Arc::new(fetcher),
            persistence,
            config.include_staff_options,
        )
    };

    let state = AppState {
        engine,
        include_staff_options: config.include_staff_options,
    };
    run_server(state, config.port).await?;

    Ok(())
}

/// A conditional post whose branches answer every method with a gently
/// drifting binary history.
fn demo_fixtures() -> (Post, ScriptedFetcher) {
    let now = now_secs();
    let day = 86_400.0;

    let branch = |id: u64, label: &str| Question {
        id,
        label: label.to_string(),
        question_type: QuestionType::Binary,
        scaling: None,
        options: vec![],
        actual_close_time: None,
        default_aggregation_method: AggregationMethodKind::RecencyWeighted,
        include_bots_in_aggregates: false,
        aggregations: Default::default(),
    };

    let history = (0..30)
        .map(|i| {
            let center = 0.35 + 0.01 * i as f64;
            AggregateEntry {
                start_time: now - (30 - i) as f64 * day,
                end_time: None,
                forecaster_count: 10 + i,
                centers: vec![center],
                interval_lower_bounds: Some(vec![center - 0.08]),
                interval_upper_bounds: Some(vec![center + 0.08]),
                means: None,
            }
        })
        .collect();

    let post = Post {
        id: 1,
        title: "Demo conditional".to_string(),
        content: PostContent::Conditional(ConditionalPair {
            question_yes: branch(11, "Parent resolves yes"),
            question_no: branch(12, "Parent resolves no"),
        }),
    };

    let fetcher = ScriptedFetcher::new()
        .with("metaculus_pros", ScriptedOutcome::Empty)
        .with_fallback(AggregationSeries::new(history));

    (post, fetcher)
}
