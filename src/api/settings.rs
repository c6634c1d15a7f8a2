use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::{ApiResponse, AppState};
use crate::error::{AppError, Result};
use crate::types::{mask, Settings};

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
}

/// Create the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings))
        .route("/save", post(save_settings))
        .route("/:key", get(get_setting))
}

/// Stored settings with secrets masked.
async fn get_settings(State(state): State<AppState>) -> Result<Json<ApiResponse<Settings>>> {
    let settings = state.settings.load()?;
    Ok(Json(ApiResponse::new(settings.redacted())))
}

/// One stored value by its JSON key; secrets are masked.
async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let value = state
        .settings
        .get(&key)?
        .ok_or_else(|| AppError::NotFound(format!("unknown setting: {}", key)))?;

    let value = match value {
        Value::String(secret) if Settings::is_secret_key(&key) => Value::String(mask(&secret)),
        other => other,
    };
    Ok(Json(ApiResponse::new(value)))
}

async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<SaveResponse>> {
    info!("Received settings: {:?}", settings.redacted());
    state.settings.save(&settings)?;
    Ok(Json(SaveResponse {
        message: "Settings saved successfully",
    }))
}
