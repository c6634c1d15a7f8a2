use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradegenie::api::{self, AppState};
use tradegenie::config::Config;
use tradegenie::services::{
    CsvTradeLog, FileModelStore, NarrativeService, SettingsStore, SignalClassifier, SignalService,
    SignalServiceConfig, TradeExecutor,
};
use tradegenie::sources::{AlpacaClient, NarrativeGenerator, OpenRouterClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradegenie=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!("Starting TradeGenie server on {}:{}", config.host, config.port);

    for name in config.missing_credentials() {
        warn!("{} is not set", name);
    }

    let alpaca = Arc::new(AlpacaClient::new(
        config.alpaca_api_key.clone().unwrap_or_default(),
        config.alpaca_api_secret.clone().unwrap_or_default(),
        &config.alpaca_trading_url,
        &config.alpaca_data_url,
    ));

    // A missing artifact leaves the server up; predictions return 503 until reload.
    let store = Arc::new(FileModelStore::new(&config.model_path));
    let classifier = Arc::new(SignalClassifier::new(store));
    classifier.try_load();

    let signals = SignalService::new(
        alpaca.clone(),
        classifier,
        SignalServiceConfig {
            symbols: config.symbols.clone(),
            lookback_days: config.inference_lookback_days,
            interval: config.inference_interval,
            cache_ttl_secs: config.signal_cache_ttl_secs,
        },
    );

    let openrouter = OpenRouterClient::new(
        config.openrouter_api_key.clone(),
        &config.openrouter_url,
        &config.openrouter_model,
    );
    // Without a key every narrative comes from the templates.
    let generator: Option<Arc<dyn NarrativeGenerator>> = if openrouter.has_api_key() {
        Some(Arc::new(openrouter))
    } else {
        None
    };
    let narrative = Arc::new(NarrativeService::new(generator));

    let trade_log = Arc::new(CsvTradeLog::new(&config.trade_log_path));
    let executor = Arc::new(TradeExecutor::new(alpaca.clone(), trade_log));

    let state = AppState {
        config: config.clone(),
        signals,
        narrative,
        executor,
        broker: alpaca,
        settings: Arc::new(SettingsStore::new(&config.settings_path)),
    };

    let app = api::app(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("TradeGenie server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
