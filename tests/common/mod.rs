//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use tradegenie::sources::{BrokerError, Brokerage, PriceProvider, ProviderError};
use tradegenie::types::{
    AccountSummary, BarInterval, Order, OrderRequest, Position, PriceBar, PriceSeries,
};

/// Rising closes with a small pullback every fifth bar.
pub fn uptrend(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + i as f64 - if i % 5 == 0 { 1.5 } else { 0.0 })
        .collect()
}

/// Strictly rising closes, one point per bar.
pub fn linear(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

pub fn series_from(symbol: &str, interval: BarInterval, closes: &[f64]) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + Duration::seconds(interval.seconds() * i as i64),
            open: close,
            high: close + 0.25,
            low: close - 0.25,
            close,
            volume: 10_000.0 + (i % 7) as f64 * 500.0,
        })
        .collect();
    PriceSeries::new(symbol, interval, bars).unwrap()
}

/// Serves a 60-bar uptrend for every symbol except `NODATA`.
pub struct UptrendProvider;

#[async_trait]
impl PriceProvider for UptrendProvider {
    async fn fetch_series(
        &self,
        symbol: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        interval: BarInterval,
    ) -> Result<PriceSeries, ProviderError> {
        if symbol == "NODATA" {
            return Err(ProviderError::NoData(symbol.to_string()));
        }
        Ok(series_from(symbol, interval, &uptrend(60)))
    }
}

/// Paper brokerage holding at most one position.
#[derive(Default)]
pub struct StubBroker {
    pub holding: Mutex<Option<Position>>,
    pub submitted: Mutex<Vec<OrderRequest>>,
}

impl StubBroker {
    pub fn holding(symbol: &str, quantity: f64) -> Self {
        Self {
            holding: Mutex::new(Some(Position {
                symbol: symbol.to_string(),
                quantity,
                entry_price: 180.0,
                current_price: 190.0,
                market_value: quantity * 190.0,
                pl: quantity * 10.0,
                pl_percent: 5.56,
            })),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Brokerage for StubBroker {
    async fn account(&self) -> Result<AccountSummary, BrokerError> {
        Ok(AccountSummary {
            account_value: 100_000.0,
            buying_power: 200_000.0,
            cash: 100_000.0,
            total_pl: 125.5,
            day_pl: 125.5,
            status: "ACTIVE".to_string(),
        })
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        Ok(self.holding.lock().unwrap().iter().cloned().collect())
    }

    async fn position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        Ok(self
            .holding
            .lock()
            .unwrap()
            .clone()
            .filter(|p| p.symbol == symbol))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError> {
        self.submitted.lock().unwrap().push(order.clone());
        let n = self.submitted.lock().unwrap().len();
        Ok(Order {
            id: format!("order-{}", n),
            symbol: order.symbol.clone(),
            side: order.side.as_str().to_string(),
            qty: order.qty,
            filled_qty: 0.0,
            order_type: order.order_type.clone(),
            status: "accepted".to_string(),
            submitted_at: Some(Utc::now()),
            filled_at: None,
            filled_avg_price: None,
        })
    }

    async fn orders(&self, _status: Option<&str>, limit: usize) -> Result<Vec<Order>, BrokerError> {
        let submitted = self.submitted.lock().unwrap();
        Ok(submitted
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, o)| Order {
                id: format!("order-{}", i + 1),
                symbol: o.symbol.clone(),
                side: o.side.as_str().to_string(),
                qty: o.qty,
                filled_qty: 0.0,
                order_type: o.order_type.clone(),
                status: "accepted".to_string(),
                submitted_at: None,
                filled_at: None,
                filled_avg_price: None,
            })
            .collect())
    }
}
