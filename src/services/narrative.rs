//! Prose around signals.
//!
//! Wraps an optional [`NarrativeGenerator`]. LLM failures degrade to
//! deterministic templated text, so callers always get a narrative and the
//! numeric signal is never held back by the LLM.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::sources::{MarketStats, NarrativeGenerator};
use crate::types::Signal;

/// Where a narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Llm,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

impl Narrative {
    fn llm(text: String) -> Self {
        Self {
            text,
            source: NarrativeSource::Llm,
        }
    }

    fn template(text: String) -> Self {
        Self {
            text,
            source: NarrativeSource::Template,
        }
    }
}

pub fn fallback_suggestion(signal: &Signal) -> String {
    format!(
        "Technical analysis suggests a {} signal for {} with {}% confidence.",
        signal.signal.as_str().to_lowercase(),
        signal.symbol,
        signal.confidence
    )
}

pub fn fallback_market_summary(stats: &MarketStats) -> String {
    format!(
        "Market shows {} buy and {} sell signals with {:.2}% average confidence.",
        stats.buy, stats.sell, stats.average_confidence
    )
}

pub const FALLBACK_CHAT: &str = "Unable to generate a response right now.";

pub struct NarrativeService {
    generator: Option<Arc<dyn NarrativeGenerator>>,
}

impl NarrativeService {
    pub fn new(generator: Option<Arc<dyn NarrativeGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn suggestion(&self, signal: &Signal) -> Narrative {
        if let Some(generator) = &self.generator {
            match generator.suggestion(signal).await {
                Ok(text) => return Narrative::llm(text),
                Err(e) => warn!("Suggestion for {} fell back to template: {}", signal.symbol, e),
            }
        }
        Narrative::template(fallback_suggestion(signal))
    }

    pub async fn market_summary(&self, signals: &[Signal]) -> (MarketStats, Narrative) {
        let stats = MarketStats::from_signals(signals);
        if let Some(generator) = &self.generator {
            match generator.market_summary(&stats).await {
                Ok(text) => return (stats, Narrative::llm(text)),
                Err(e) => warn!("Market summary fell back to template: {}", e),
            }
        }
        (stats, Narrative::template(fallback_market_summary(&stats)))
    }

    pub async fn chat(&self, prompt: &str) -> Narrative {
        if let Some(generator) = &self.generator {
            match generator.chat(prompt).await {
                Ok(text) => return Narrative::llm(text),
                Err(e) => warn!("Chat fell back to template: {}", e),
            }
        }
        Narrative::template(FALLBACK_CHAT.to_string())
    }
}
