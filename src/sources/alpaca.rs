//! Alpaca REST client.
//!
//! Covers historical stock bars from the market data API and the paper
//! trading endpoints (account, positions, orders). Alpaca returns most
//! numeric fields as strings; they are parsed into `f64` here so nothing
//! downstream sees the wire format.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{BrokerError, Brokerage, PriceProvider, ProviderError};
use crate::types::{
    AccountSummary, BarInterval, Order, OrderRequest, Position, PriceBar, PriceSeries,
};

/// Max bars per page accepted by the data API.
const PAGE_LIMIT: u32 = 10_000;

/// Bar as returned by `/v2/stocks/{symbol}/bars`.
#[derive(Debug, Deserialize)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
pub struct AlpacaBarsResponse {
    /// `null` when the window holds no bars.
    #[serde(default)]
    pub bars: Option<Vec<AlpacaBar>>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    portfolio_value: String,
    buying_power: String,
    cash: String,
    equity: String,
    last_equity: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    current_price: String,
    market_value: String,
    unrealized_pl: String,
    unrealized_plpc: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    symbol: String,
    side: String,
    qty: Option<String>,
    filled_qty: Option<String>,
    #[serde(rename = "type")]
    order_type: String,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    filled_at: Option<DateTime<Utc>>,
    filled_avg_price: Option<String>,
}

fn parse_num(value: &str, field: &str) -> Result<f64, BrokerError> {
    value
        .parse::<f64>()
        .map_err(|_| BrokerError::Parse(format!("{} is not a number: {:?}", field, value)))
}

fn parse_opt(value: Option<&str>, field: &str) -> Result<Option<f64>, BrokerError> {
    value.map(|v| parse_num(v, field)).transpose()
}

impl AlpacaAccount {
    fn into_summary(self) -> Result<AccountSummary, BrokerError> {
        let equity = parse_num(&self.equity, "equity")?;
        let last_equity = parse_num(&self.last_equity, "last_equity")?;
        Ok(AccountSummary {
            account_value: parse_num(&self.portfolio_value, "portfolio_value")?,
            buying_power: parse_num(&self.buying_power, "buying_power")?,
            cash: parse_num(&self.cash, "cash")?,
            total_pl: equity - last_equity,
            day_pl: equity - last_equity,
            status: self.status,
        })
    }
}

impl AlpacaPosition {
    fn into_position(self) -> Result<Position, BrokerError> {
        Ok(Position {
            quantity: parse_num(&self.qty, "qty")?,
            entry_price: parse_num(&self.avg_entry_price, "avg_entry_price")?,
            current_price: parse_num(&self.current_price, "current_price")?,
            market_value: parse_num(&self.market_value, "market_value")?,
            pl: parse_num(&self.unrealized_pl, "unrealized_pl")?,
            pl_percent: parse_num(&self.unrealized_plpc, "unrealized_plpc")?,
            symbol: self.symbol,
        })
    }
}

impl AlpacaOrder {
    fn into_order(self) -> Result<Order, BrokerError> {
        Ok(Order {
            qty: parse_opt(self.qty.as_deref(), "qty")?.unwrap_or(0.0),
            filled_qty: parse_opt(self.filled_qty.as_deref(), "filled_qty")?.unwrap_or(0.0),
            filled_avg_price: parse_opt(self.filled_avg_price.as_deref(), "filled_avg_price")?,
            id: self.id,
            symbol: self.symbol,
            side: self.side,
            order_type: self.order_type,
            status: self.status,
            submitted_at: self.submitted_at,
            filled_at: self.filled_at,
        })
    }
}

/// Alpaca client for market data and paper trading.
pub struct AlpacaClient {
    client: Client,
    api_key: String,
    api_secret: String,
    trading_url: String,
    data_url: String,
}

impl AlpacaClient {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        trading_url: impl Into<String>,
        data_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            trading_url: trading_url.into().trim_end_matches('/').to_string(),
            data_url: data_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
    }

    async fn broker_get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, BrokerError> {
        let url = format!("{}{}", self.trading_url, path);
        let response = self
            .authed(self.client.get(&url))
            .query(query)
            .send()
            .await?;
        Ok(response)
    }

    async fn broker_json<T: for<'de> Deserialize<'de>>(
        response: Response,
    ) -> Result<T, BrokerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(BrokerError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))
    }

    /// Fetch one page of bars.
    async fn fetch_page(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: BarInterval,
        page_token: Option<&str>,
    ) -> Result<AlpacaBarsResponse, ProviderError> {
        let url = format!("{}/v2/stocks/{}/bars", self.data_url, symbol);
        let mut query = vec![
            ("timeframe", interval.alpaca_timeframe().to_string()),
            ("start", start.to_rfc3339()),
            ("end", end.to_rfc3339()),
            ("limit", PAGE_LIMIT.to_string()),
            ("adjustment", "raw".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }

        let response = self
            .authed(self.client.get(&url))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<AlpacaBarsResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PriceProvider for AlpacaClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: BarInterval,
    ) -> Result<PriceSeries, ProviderError> {
        let symbol = symbol.to_uppercase();
        let mut bars: Vec<PriceBar> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .fetch_page(&symbol, start, end, interval, page_token.as_deref())
                .await?;

            bars.extend(page.bars.unwrap_or_default().into_iter().map(|b| PriceBar {
                timestamp: b.timestamp,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                volume: b.volume,
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Fetched {} {} bars for {}", bars.len(), interval.as_str(), symbol);

        if bars.is_empty() {
            return Err(ProviderError::NoData(symbol));
        }

        Ok(PriceSeries::new(symbol, interval, bars)?)
    }
}

#[async_trait]
impl Brokerage for AlpacaClient {
    async fn account(&self) -> Result<AccountSummary, BrokerError> {
        let response = self.broker_get("/v2/account", &[]).await?;
        Self::broker_json::<AlpacaAccount>(response)
            .await?
            .into_summary()
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        let response = self.broker_get("/v2/positions", &[]).await?;
        Self::broker_json::<Vec<AlpacaPosition>>(response)
            .await?
            .into_iter()
            .map(AlpacaPosition::into_position)
            .collect()
    }

    async fn position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        let path = format!("/v2/positions/{}", symbol.to_uppercase());
        let response = self.broker_get(&path, &[]).await?;

        // Alpaca answers 404 for a symbol with no open position.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::broker_json::<AlpacaPosition>(response)
            .await?
            .into_position()
            .map(Some)
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<Order, BrokerError> {
        let url = format!("{}/v2/orders", self.trading_url);
        let response = self
            .authed(self.client.post(&url))
            .json(order)
            .send()
            .await?;
        Self::broker_json::<AlpacaOrder>(response)
            .await?
            .into_order()
    }

    async fn orders(&self, status: Option<&str>, limit: usize) -> Result<Vec<Order>, BrokerError> {
        let query = [
            ("status", status.unwrap_or("all").to_string()),
            ("limit", limit.to_string()),
        ];
        let response = self.broker_get("/v2/orders", &query).await?;
        Self::broker_json::<Vec<AlpacaOrder>>(response)
            .await?
            .into_iter()
            .map(AlpacaOrder::into_order)
            .collect()
    }
}
