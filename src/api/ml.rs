//! Prediction, model and narrative endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiResponse, AppState};
use crate::error::{AppError, Result};
use crate::services::{ModelInfo, NarrativeSource};
use crate::types::Signal;

/// Query parameters for the high-confidence endpoint.
#[derive(Debug, Deserialize)]
pub struct SignalsQuery {
    pub confidence_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub stocks: Vec<String>,
    #[serde(flatten)]
    pub model: ModelInfo,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub symbol: String,
    pub signal: Signal,
    pub suggestion: String,
    pub source: NarrativeSource,
}

#[derive(Debug, Serialize)]
pub struct MarketSummaryResponse {
    pub summary: String,
    pub total_stocks: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub average_confidence: f64,
    pub source: NarrativeSource,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub source: NarrativeSource,
}

/// Create the ML router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predictions", get(get_predictions))
        .route("/predictions/:symbol", get(get_prediction))
        .route("/signals", get(get_high_confidence))
        .route("/model/info", get(get_model_info))
        .route("/model/reload", post(reload_model))
        .route("/suggestions/:symbol", get(get_suggestion))
        .route("/market-summary", get(get_market_summary))
        .route("/chat", post(chat))
}

/// Signals for the whole universe.
async fn get_predictions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Signal>>>> {
    Ok(Json(ApiResponse::new(state.signals.signals().await?)))
}

async fn get_prediction(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<Signal>>> {
    let signal = state.signals.signal_for(&symbol).await?;
    Ok(Json(ApiResponse::new(signal)))
}

async fn get_high_confidence(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<ApiResponse<Vec<Signal>>>> {
    let threshold = query
        .confidence_threshold
        .unwrap_or(state.config.confidence_threshold);
    if !(0.0..=100.0).contains(&threshold) {
        return Err(AppError::BadRequest(format!(
            "confidence_threshold must be between 0 and 100, got {}",
            threshold
        )));
    }

    Ok(Json(ApiResponse::new(
        state.signals.high_confidence(threshold).await?,
    )))
}

async fn get_model_info(State(state): State<AppState>) -> Json<ApiResponse<ModelInfoResponse>> {
    Json(ApiResponse::new(ModelInfoResponse {
        stocks: state.signals.symbols().to_vec(),
        model: state.signals.model_info(),
    }))
}

async fn reload_model(State(state): State<AppState>) -> Result<Json<ApiResponse<ModelInfo>>> {
    let info = state.signals.reload_model()?;
    Ok(Json(ApiResponse::new(info)))
}

async fn get_suggestion(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<SuggestionResponse>>> {
    let signal = state.signals.signal_for(&symbol).await?;
    let narrative = state.narrative.suggestion(&signal).await;

    Ok(Json(ApiResponse::new(SuggestionResponse {
        symbol: signal.symbol.clone(),
        signal,
        suggestion: narrative.text,
        source: narrative.source,
    })))
}

async fn get_market_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MarketSummaryResponse>>> {
    let signals = state.signals.signals().await?;
    let (stats, narrative) = state.narrative.market_summary(&signals).await;

    Ok(Json(ApiResponse::new(MarketSummaryResponse {
        summary: narrative.text,
        total_stocks: stats.total,
        buy_signals: stats.buy,
        sell_signals: stats.sell,
        average_confidence: stats.average_confidence,
        source: narrative.source,
    })))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".to_string()));
    }

    info!("Chat prompt ({} chars)", prompt.len());
    let narrative = state.narrative.chat(prompt).await;
    Ok(Json(ApiResponse::new(ChatResponse {
        response: narrative.text,
        source: narrative.source,
    })))
}
