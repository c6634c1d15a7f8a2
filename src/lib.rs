//! TradeGenie - technical-indicator signal server with a random forest classifier

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

pub use api::AppState;
