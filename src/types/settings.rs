use serde::{Deserialize, Serialize};

/// User-editable runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub alpaca_api_key: String,
    #[serde(default)]
    pub alpaca_secret_key: String,
    #[serde(default)]
    pub open_router_api_key: String,
    /// Maximum executed trades per day
    pub max_trades_per_day: u32,
    /// Minimum signal confidence (percent) for auto trading
    pub min_confidence: u32,
    pub stop_loss_percent: f64,
    pub enable_notifications: bool,
    pub enable_auto_trading: bool,
    pub paper_trading: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpaca_api_key: String::new(),
            alpaca_secret_key: String::new(),
            open_router_api_key: String::new(),
            max_trades_per_day: 10,
            min_confidence: 70,
            stop_loss_percent: 5.0,
            enable_notifications: true,
            enable_auto_trading: false,
            paper_trading: true,
        }
    }
}

impl Settings {
    /// JSON keys of the secret fields.
    pub const SECRET_KEYS: [&'static str; 3] =
        ["alpacaApiKey", "alpacaSecretKey", "openRouterApiKey"];

    pub fn is_secret_key(key: &str) -> bool {
        Self::SECRET_KEYS.contains(&key)
    }

    /// Copy with every secret masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            alpaca_api_key: mask(&self.alpaca_api_key),
            alpaca_secret_key: mask(&self.alpaca_secret_key),
            open_router_api_key: mask(&self.open_router_api_key),
            ..self.clone()
        }
    }
}

/// Keep at most the last four characters of a secret.
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}
