//! Offline training job: fetch the universe, fit the forest, save the artifact.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradegenie::config::Config;
use tradegenie::services::{FileModelStore, ModelTrainer};
use tradegenie::sources::AlpacaClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradegenie=info,train=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    if config.alpaca_api_key.is_none() || config.alpaca_api_secret.is_none() {
        warn!("ALPACA_KEY / ALPACA_SECRET not set; market data requests will be rejected");
    }

    let provider = Arc::new(AlpacaClient::new(
        config.alpaca_api_key.clone().unwrap_or_default(),
        config.alpaca_api_secret.clone().unwrap_or_default(),
        &config.alpaca_trading_url,
        &config.alpaca_data_url,
    ));
    let store = FileModelStore::new(&config.model_path);

    let end = Utc::now();
    let start = end - Duration::days(config.training_lookback_days);
    info!(
        "Training on {} symbols, {} days of {} bars",
        config.symbols.len(),
        config.training_lookback_days,
        config.training_interval.as_str()
    );

    let outcome = ModelTrainer::default()
        .train_universe(
            provider.as_ref(),
            &store,
            &config.symbols,
            start,
            end,
            config.training_interval,
        )
        .await?;

    if !outcome.skipped.is_empty() {
        warn!("Skipped symbols: {}", outcome.skipped.join(", "));
    }
    info!(
        "Model saved to {} ({} train / {} test rows)",
        config.model_path, outcome.train_size, outcome.test_size
    );

    Ok(())
}
