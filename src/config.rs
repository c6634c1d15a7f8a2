use std::env;

use crate::types::BarInterval;

pub const DEFAULT_SYMBOLS: [&str; 10] = [
    "AAPL", "MSFT", "TSLA", "AMZN", "GOOGL", "NVDA", "META", "NFLX", "AMD", "BABA",
];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Alpaca API key.
    pub alpaca_api_key: Option<String>,
    /// Alpaca API secret.
    pub alpaca_api_secret: Option<String>,
    /// Paper trading REST base URL.
    pub alpaca_trading_url: String,
    /// Market data REST base URL.
    pub alpaca_data_url: String,
    /// OpenRouter API key.
    pub openrouter_api_key: Option<String>,
    pub openrouter_url: String,
    pub openrouter_model: String,
    /// Model artifact location.
    pub model_path: String,
    pub trade_log_path: String,
    pub settings_path: String,
    /// Fixed symbol universe.
    pub symbols: Vec<String>,
    pub inference_lookback_days: i64,
    pub inference_interval: BarInterval,
    pub training_lookback_days: i64,
    pub training_interval: BarInterval,
    /// Default high-confidence threshold (percent).
    pub confidence_threshold: f64,
    pub signal_cache_ttl_secs: i64,
    /// Allowed frontend origin.
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            alpaca_api_key: None,
            alpaca_api_secret: None,
            alpaca_trading_url: "https://paper-api.alpaca.markets".to_string(),
            alpaca_data_url: "https://data.alpaca.markets".to_string(),
            openrouter_api_key: None,
            openrouter_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            openrouter_model: "grok-1".to_string(),
            model_path: "model.json".to_string(),
            trade_log_path: "trade_log.csv".to_string(),
            settings_path: "settings.json".to_string(),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            inference_lookback_days: 60,
            inference_interval: BarInterval::FifteenMinutes,
            training_lookback_days: 180,
            training_interval: BarInterval::OneDay,
            confidence_threshold: 70.0,
            signal_cache_ttl_secs: 30,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let symbols = env::var("SYMBOLS")
            .ok()
            .map(|s| parse_symbols(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.symbols);

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            alpaca_api_key: non_empty("ALPACA_KEY"),
            alpaca_api_secret: non_empty("ALPACA_SECRET"),
            alpaca_trading_url: env::var("ALPACA_TRADING_URL")
                .unwrap_or(defaults.alpaca_trading_url),
            alpaca_data_url: env::var("ALPACA_DATA_URL").unwrap_or(defaults.alpaca_data_url),
            openrouter_api_key: non_empty("OPENROUTER_API_KEY"),
            openrouter_url: env::var("OPENROUTER_URL").unwrap_or(defaults.openrouter_url),
            openrouter_model: env::var("OPENROUTER_MODEL").unwrap_or(defaults.openrouter_model),
            model_path: env::var("MODEL_PATH").unwrap_or(defaults.model_path),
            trade_log_path: env::var("TRADE_LOG_PATH").unwrap_or(defaults.trade_log_path),
            settings_path: env::var("SETTINGS_PATH").unwrap_or(defaults.settings_path),
            symbols,
            inference_lookback_days: parsed("INFERENCE_LOOKBACK_DAYS")
                .unwrap_or(defaults.inference_lookback_days),
            inference_interval: env::var("INFERENCE_INTERVAL")
                .ok()
                .and_then(|s| BarInterval::from_str(&s))
                .unwrap_or(defaults.inference_interval),
            training_lookback_days: parsed("TRAINING_LOOKBACK_DAYS")
                .unwrap_or(defaults.training_lookback_days),
            training_interval: env::var("TRAINING_INTERVAL")
                .ok()
                .and_then(|s| BarInterval::from_str(&s))
                .unwrap_or(defaults.training_interval),
            confidence_threshold: parsed("CONFIDENCE_THRESHOLD")
                .unwrap_or(defaults.confidence_threshold),
            signal_cache_ttl_secs: parsed("SIGNAL_CACHE_TTL_SECS")
                .unwrap_or(defaults.signal_cache_ttl_secs),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        }
    }

    /// Names of required credentials that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.alpaca_api_key.is_none() {
            missing.push("ALPACA_KEY");
        }
        if self.alpaca_api_secret.is_none() {
            missing.push("ALPACA_SECRET");
        }
        if self.openrouter_api_key.is_none() {
            missing.push("OPENROUTER_API_KEY");
        }
        missing
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Comma-separated symbol list, upper-cased, blanks dropped.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
