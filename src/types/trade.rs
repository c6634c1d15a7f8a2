use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SignalKind;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// Paper account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_value: f64,
    pub buying_power: f64,
    pub cash: f64,
    pub total_pl: f64,
    pub day_pl: f64,
    pub status: String,
}

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub pl: f64,
    pub pl_percent: f64,
}

/// Market order request sent to the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: f64,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub client_order_id: String,
}

impl OrderRequest {
    /// Good-till-cancelled market order.
    pub fn market(symbol: &str, qty: f64, side: OrderSide) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            qty,
            side,
            order_type: "market".to_string(),
            time_in_force: "gtc".to_string(),
            client_order_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Brokerage order as reported back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: String,
    pub qty: f64,
    pub filled_qty: f64,
    #[serde(rename = "type")]
    pub order_type: String,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub filled_at: Option<DateTime<Utc>>,
    pub filled_avg_price: Option<f64>,
}

/// One row of the append-only trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub action: OrderSide,
    pub quantity: f64,
    pub price: Option<f64>,
    pub signal_confidence: f64,
}

/// Request to act on a signal.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub signal: SignalKind,
    #[serde(default)]
    pub confidence: f64,
}

/// What the executor did with a signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeOutcome {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}
