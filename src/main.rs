use futures::future::join_all;
use listing_signals::config::{AppConfig, BatchConfig};
use listing_signals::provider::{self, HistoryProvider};
use listing_signals::{AnalysisEngine, BatchSummary, load_config};
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let provider: Arc<dyn HistoryProvider> = match provider::from_config(&config.provider) {
        Ok(p) => Arc::from(p),
        Err(e) => {
            error!("Failed to initialize history provider: {}", e);
            return;
        }
    };

    let engine = AnalysisEngine::new(config.analysis.clone());

    loop {
        info!("Batches to process: {}", config.batches.len());

        let tasks: Vec<_> = config
            .batches
            .iter()
            .map(|batch| process_batch(batch, &engine, provider.as_ref(), config.history_days))
            .collect();
        join_all(tasks).await;

        let Some(interval) = config.check_interval_seconds else {
            break;
        };
        info!("Waiting {}s before the next run...", interval);
        sleep(Duration::from_secs(interval)).await;
    }
}

/// Runs one configured batch and prints its results as JSON.
async fn process_batch(
    batch: &BatchConfig,
    engine: &AnalysisEngine,
    provider: &dyn HistoryProvider,
    history_days: u32,
) {
    info!("Processing batch: {}", batch.name);

    let results = match engine.analyze_batch(provider, &batch.identifiers, history_days).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Batch {} failed: {}", batch.name, e);
            return;
        }
    };

    let summary = BatchSummary::from_results(&results);
    for result in results.iter().filter(|r| !r.is_ok()) {
        warn!(
            "{}: {}",
            result.identifier,
            result.error.as_deref().unwrap_or("analysis failed")
        );
    }

    match serde_json::to_string_pretty(&results) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize results for {}: {}", batch.name, e),
    }

    info!(
        "Finished batch {}: {} ok, {} errors",
        batch.name, summary.ok, summary.errors
    );
}
