use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{
    FeatureError, ModelError, SettingsError, SignalError, TradeError, TradeLogError,
};
use crate::sources::{BrokerError, ProviderError};

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    TradeLog(#[from] TradeLogError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

fn provider_status(e: &ProviderError) -> StatusCode {
    match e {
        ProviderError::NoData(_) => StatusCode::NOT_FOUND,
        ProviderError::InvalidSeries(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn model_status(e: &ModelError) -> StatusCode {
    match e {
        ModelError::NotLoaded | ModelError::ArtifactMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn feature_status(e: &FeatureError) -> StatusCode {
    match e {
        // Too little history for the latest bar to be classified.
        FeatureError::UndefinedFeature { .. } | FeatureError::EmptySeries => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        FeatureError::StatsMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Signal(SignalError::Provider(e)) => provider_status(e),
            AppError::Signal(SignalError::Feature(e)) => feature_status(e),
            AppError::Signal(SignalError::Model(e)) | AppError::Model(e) => model_status(e),
            AppError::Trade(TradeError::Broker(_)) | AppError::Broker(_) => StatusCode::BAD_GATEWAY,
            AppError::Trade(TradeError::Log(_)) | AppError::TradeLog(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Internal(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!("{} {}", status.as_u16(), message);
        }

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
