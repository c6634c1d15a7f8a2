//! Downstream consumer that turns a signal into at most one paper order.
//!
//! Buy opens a single share when flat; Sell closes the whole position when
//! one exists. Every other combination is a no-op.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use super::trade_log::{TradeLogError, TradeRecordStore};
use crate::sources::{BrokerError, Brokerage};
use crate::types::{OrderRequest, OrderSide, SignalKind, TradeOutcome, TradeRecord, TradeRequest};

#[derive(Debug, Error)]
pub enum TradeError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Log(#[from] TradeLogError),
}

pub struct TradeExecutor {
    broker: Arc<dyn Brokerage>,
    log: Arc<dyn TradeRecordStore>,
}

impl TradeExecutor {
    pub fn new(broker: Arc<dyn Brokerage>, log: Arc<dyn TradeRecordStore>) -> Self {
        Self { broker, log }
    }

    pub async fn execute(&self, request: &TradeRequest) -> Result<TradeOutcome, TradeError> {
        let symbol = request.symbol.to_uppercase();
        let position = self.broker.position(&symbol).await?;

        let (side, qty) = match (request.signal, &position) {
            (SignalKind::Buy, None) => (OrderSide::Buy, 1.0),
            (SignalKind::Sell, Some(p)) if p.quantity > 0.0 => (OrderSide::Sell, p.quantity),
            _ => {
                return Ok(TradeOutcome {
                    message: format!(
                        "No trade executed for {} (Signal: {})",
                        symbol, request.signal
                    ),
                    order_id: None,
                })
            }
        };

        let order = self
            .broker
            .submit_order(&OrderRequest::market(&symbol, qty, side))
            .await?;

        info!(
            "{} {} x{} submitted (order {}, confidence {}%)",
            side.as_str(),
            symbol,
            qty,
            order.id,
            request.confidence
        );

        let record = TradeRecord {
            timestamp: Utc::now(),
            symbol: symbol.clone(),
            action: side,
            quantity: qty,
            price: order.filled_avg_price,
            signal_confidence: request.confidence,
        };
        // The order is already live; a log failure is reported but does not undo it.
        if let Err(e) = self.log.append(&record) {
            warn!("Failed to record trade for {}: {}", symbol, e);
        }

        let verb = match side {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        };
        Ok(TradeOutcome {
            message: format!("{} order executed for {}", verb, symbol),
            order_id: Some(order.id),
        })
    }

    pub fn recent_trades(&self, limit: usize) -> Result<Vec<TradeRecord>, TradeError> {
        Ok(self.log.recent(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountSummary, Order, Position};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct PaperBroker {
        holding: Option<f64>,
        submitted: Mutex<Vec<OrderRequest>>,
    }

    #[async_trait]
    impl Brokerage for PaperBroker {
        async fn account(&self) -> Result<AccountSummary, BrokerError> {
            Err(BrokerError::Parse("unused".to_string()))
        }

        async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
            Ok(Vec::new())
        }

        async fn position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
            Ok(self.holding.map(|quantity| Position {
                symbol: symbol.to_string(),
                quantity,
                entry_price: 100.0,
                current_price: 110.0,
                market_value: quantity * 110.0,
                pl: quantity * 10.0,
                pl_percent: 10.0,
            }))
        }

        async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError> {
            self.submitted.lock().unwrap().push(order.clone());
            Ok(Order {
                id: "ord-1".to_string(),
                symbol: order.symbol.clone(),
                side: order.side.as_str().to_string(),
                qty: order.qty,
                filled_qty: order.qty,
                order_type: "market".to_string(),
                status: "filled".to_string(),
                submitted_at: None,
                filled_at: None,
                filled_avg_price: Some(110.0),
            })
        }

        async fn orders(
            &self,
            _status: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<Order>, BrokerError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemoryLog {
        records: Mutex<Vec<TradeRecord>>,
    }

    impl TradeRecordStore for MemoryLog {
        fn append(&self, record: &TradeRecord) -> Result<(), TradeLogError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn recent(&self, limit: usize) -> Result<Vec<TradeRecord>, TradeLogError> {
            let records = self.records.lock().unwrap();
            let skip = records.len().saturating_sub(limit);
            Ok(records[skip..].to_vec())
        }
    }

    fn request(symbol: &str, signal: SignalKind) -> TradeRequest {
        TradeRequest {
            symbol: symbol.to_string(),
            signal,
            confidence: 82.5,
        }
    }

    fn executor(holding: Option<f64>) -> (TradeExecutor, Arc<PaperBroker>, Arc<MemoryLog>) {
        let broker = Arc::new(PaperBroker {
            holding,
            ..Default::default()
        });
        let log = Arc::new(MemoryLog::default());
        (
            TradeExecutor::new(broker.clone(), log.clone()),
            broker,
            log,
        )
    }

    #[tokio::test]
    async fn test_buy_when_flat_opens_one_share() {
        let (executor, broker, log) = executor(None);
        let outcome = executor
            .execute(&request("aapl", SignalKind::Buy))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Buy order executed for AAPL");
        assert_eq!(outcome.order_id.as_deref(), Some("ord-1"));

        let submitted = broker.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].qty, 1.0);
        assert_eq!(submitted[0].side, OrderSide::Buy);

        let records = log.recent(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, Some(110.0));
        assert_eq!(records[0].signal_confidence, 82.5);
    }

    #[tokio::test]
    async fn test_sell_closes_whole_position() {
        let (executor, broker, _) = executor(Some(7.0));
        let outcome = executor
            .execute(&request("MSFT", SignalKind::Sell))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Sell order executed for MSFT");
        let submitted = broker.submitted.lock().unwrap();
        assert_eq!(submitted[0].qty, 7.0);
        assert_eq!(submitted[0].side, OrderSide::Sell);
    }

    #[tokio::test]
    async fn test_no_trade_cases() {
        for (holding, signal) in [
            (Some(2.0), SignalKind::Buy),
            (None, SignalKind::Sell),
            (None, SignalKind::Hold),
            (Some(2.0), SignalKind::Hold),
        ] {
            let (executor, broker, log) = executor(holding);
            let outcome = executor.execute(&request("NVDA", signal)).await.unwrap();

            assert_eq!(
                outcome.message,
                format!("No trade executed for NVDA (Signal: {})", signal)
            );
            assert!(outcome.order_id.is_none());
            assert!(broker.submitted.lock().unwrap().is_empty());
            assert!(log.recent(10).unwrap().is_empty());
        }
    }
}
