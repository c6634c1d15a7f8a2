//! Paper trading endpoints.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::{ApiResponse, AppState};
use crate::error::{AppError, Result};
use crate::types::{AccountSummary, Order, Position, TradeOutcome, TradeRecord, TradeRequest};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    /// `open`, `closed` or `all`
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// Create the trade router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/account", get(get_account))
        .route("/positions", get(get_positions))
        .route("/trade", post(execute_trade))
        .route("/trades", get(get_trades))
        .route("/orders", get(get_orders))
}

async fn get_account(State(state): State<AppState>) -> Result<Json<ApiResponse<AccountSummary>>> {
    Ok(Json(ApiResponse::new(state.broker.account().await?)))
}

async fn get_positions(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Position>>>> {
    Ok(Json(ApiResponse::new(state.broker.positions().await?)))
}

async fn execute_trade(
    State(state): State<AppState>,
    Json(request): Json<TradeRequest>,
) -> Result<Json<ApiResponse<TradeOutcome>>> {
    if request.symbol.trim().is_empty() {
        return Err(AppError::BadRequest("symbol must not be empty".to_string()));
    }
    Ok(Json(ApiResponse::new(state.executor.execute(&request).await?)))
}

async fn get_trades(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<TradeRecord>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(ApiResponse::new(state.executor.recent_trades(limit)?)))
}

async fn get_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(s @ ("open" | "closed")) => Some(s),
        Some(other) => {
            return Err(AppError::BadRequest(format!("unknown order status: {}", other)))
        }
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    Ok(Json(ApiResponse::new(state.broker.orders(status, limit).await?)))
}
