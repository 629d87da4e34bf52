use anyhow::Context;
use recsys_core::format::{load_features, load_preferences};
use recsys_core::{FeatureData, PreferenceData, SimpleFeatureData, SimplePreferenceData};
use rerank_service::services::build_reranker;
use rerank_service::{Config, RerankBatchJob};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;

    info!(
        algorithm = config.rerank.algorithm.as_str(),
        recommendations = %config.batch.recommendations_path.display(),
        "Starting rerank-service batch"
    );

    let preferences: SimplePreferenceData<String, String> =
        load_preferences(&config.batch.preferences_path)
            .context("failed to load preference data")?;
    let features: SimpleFeatureData<String, String> =
        load_features(&config.batch.features_path).context("failed to load feature data")?;

    info!(
        users = preferences.num_users(),
        preferences = preferences.num_preferences(),
        features = features.features().len(),
        "Loaded preference and feature data"
    );

    let feature_data: Arc<dyn FeatureData<String, String>> = Arc::new(features);
    let reranker =
        build_reranker::<String, String, String>(&config.rerank, &preferences, feature_data)?;

    let job = RerankBatchJob::new(
        reranker,
        config.rerank.output_length(),
        config.batch.concurrency(),
    );
    let stats = job
        .run_file(&config.batch.recommendations_path, &config.batch.output_path)
        .await?;

    info!(
        users = stats.users_processed,
        duration_ms = stats.total_duration_ms,
        output = %config.batch.output_path.display(),
        "Rerank batch finished"
    );

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
