pub mod health;
pub mod ml;
pub mod settings;
pub mod trade;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::services::{NarrativeService, SettingsStore, SignalService, TradeExecutor};
use crate::sources::Brokerage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub signals: Arc<SignalService>,
    pub narrative: Arc<NarrativeService>,
    pub executor: Arc<TradeExecutor>,
    pub broker: Arc<dyn Brokerage>,
    pub settings: Arc<SettingsStore>,
}

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/ml", ml::router())
        .nest("/api/trade", trade::router())
        .nest("/api/settings", settings::router())
}

/// Full application with CORS and request tracing applied.
pub fn app(state: AppState) -> Router {
    let cors = match HeaderValue::from_str(&state.config.cors_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(
                "Invalid CORS_ORIGIN {:?}, allowing any origin",
                state.config.cors_origin
            );
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .merge(router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
