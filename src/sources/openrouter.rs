//! OpenRouter chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{MarketStats, NarrativeError, NarrativeGenerator};
use crate::types::Signal;

const REQUEST_TIMEOUT_SECS: u64 = 30;

const ANALYST_PROMPT: &str =
    "You are a professional trading analyst providing brief, technical analysis-based suggestions.";
const MARKET_PROMPT: &str =
    "You are a professional market analyst providing concise market summaries.";
const ASSISTANT_PROMPT: &str = "You are a helpful trading assistant.";

/// Narrative generator backed by an OpenAI-compatible chat endpoint.
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: Option<String>, url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            url: url.into(),
            model: model.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// One system + user exchange; returns the trimmed first choice.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, NarrativeError> {
        let api_key = self.api_key.as_ref().ok_or(NarrativeError::MissingApiKey)?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        });

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(NarrativeError::EmptyResponse)?;

        debug!("LLM returned {} chars", content.len());
        Ok(content.to_string())
    }
}

/// Prompt for a single-signal suggestion.
pub fn suggestion_prompt(signal: &Signal) -> String {
    format!(
        "Based on technical analysis for {}:\n\
         - Trading Signal: {}\n\
         - Confidence: {}%\n\
         - RSI: {:.2}\n\
         - MACD: {:.2}\n\n\
         Generate a brief, professional trading suggestion explaining why this signal was generated.\n\
         Focus on the technical indicators and their implications.\n\
         Keep the response under 50 words.",
        signal.symbol,
        signal.signal,
        signal.confidence,
        signal.rsi.unwrap_or(0.0),
        signal.macd.unwrap_or(0.0)
    )
}

/// Prompt for the batch summary.
pub fn market_prompt(stats: &MarketStats) -> String {
    format!(
        "Based on ML analysis of {} stocks:\n\
         - Buy Signals: {}\n\
         - Sell Signals: {}\n\
         - Average Confidence: {:.2}%\n\n\
         Generate a brief (2-3 sentences) market summary describing the current trading environment.\n\
         Focus on the overall market sentiment and potential opportunities.",
        stats.total, stats.buy, stats.sell, stats.average_confidence
    )
}

#[async_trait]
impl NarrativeGenerator for OpenRouterClient {
    async fn suggestion(&self, signal: &Signal) -> Result<String, NarrativeError> {
        self.complete(ANALYST_PROMPT, &suggestion_prompt(signal)).await
    }

    async fn market_summary(&self, stats: &MarketStats) -> Result<String, NarrativeError> {
        self.complete(MARKET_PROMPT, &market_prompt(stats)).await
    }

    async fn chat(&self, prompt: &str) -> Result<String, NarrativeError> {
        self.complete(ASSISTANT_PROMPT, prompt).await
    }
}
