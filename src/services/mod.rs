pub mod features;
pub mod indicators;
pub mod labels;
pub mod ml;
pub mod narrative;
pub mod settings_store;
pub mod signal_service;
pub mod trade_executor;
pub mod trade_log;

pub use features::{FeatureError, FeatureVector, NormalizationStats, FEATURE_COLUMNS, FEATURE_COUNT};
pub use indicators::{IndicatorName, IndicatorSet};
pub use labels::{generate_labels, LABEL_HORIZON, LABEL_THRESHOLD};
pub use ml::{
    FileModelStore, ModelError, ModelInfo, ModelStore, ModelTrainer, SignalClassifier,
};
pub use narrative::{Narrative, NarrativeService, NarrativeSource};
pub use settings_store::{SettingsError, SettingsStore};
pub use signal_service::{SignalError, SignalService, SignalServiceConfig};
pub use trade_executor::{TradeError, TradeExecutor};
pub use trade_log::{CsvTradeLog, TradeLogError, TradeRecordStore};
