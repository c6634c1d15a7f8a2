//! Append-only trade record store.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use csv::{Reader, WriterBuilder};
use thiserror::Error;

use crate::types::TradeRecord;

#[derive(Debug, Error)]
pub enum TradeLogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Where executed trades are recorded.
pub trait TradeRecordStore: Send + Sync {
    fn append(&self, record: &TradeRecord) -> Result<(), TradeLogError>;

    /// Up to `limit` most recent records, oldest first.
    fn recent(&self, limit: usize) -> Result<Vec<TradeRecord>, TradeLogError>;
}

/// CSV file with columns
/// `timestamp,symbol,action,quantity,price,signal_confidence`.
///
/// The header is written only when the file is created; an unfilled order
/// leaves `price` empty.
pub struct CsvTradeLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvTradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeRecordStore for CsvTradeLog {
    fn append(&self, record: &TradeRecord) -> Result<(), TradeLogError> {
        let _guard = self.write_lock.lock();

        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<TradeRecord>, TradeLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_path(&self.path)?;
        let records: Vec<TradeRecord> = reader.deserialize().collect::<Result<_, _>>()?;

        let skip = records.len().saturating_sub(limit);
        Ok(records.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn record(symbol: &str, minute: u32, price: Option<f64>) -> TradeRecord {
        TradeRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 3, 14, minute, 0).unwrap(),
            symbol: symbol.to_string(),
            action: OrderSide::Buy,
            quantity: 1.0,
            price,
            signal_confidence: 81.25,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let log = CsvTradeLog::new(dir.path().join("trades.csv"));
        log.append(&record("AAPL", 0, Some(190.5))).unwrap();
        log.append(&record("MSFT", 1, None)).unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,symbol,action,quantity,price,signal_confidence"
        );
        assert!(lines[1].contains("AAPL,buy,1.0,190.5,81.25"));
        assert!(lines[2].contains("MSFT,buy,1.0,,81.25"));
    }

    #[test]
    fn test_recent_returns_tail() {
        let dir = tempdir().unwrap();
        let log = CsvTradeLog::new(dir.path().join("trades.csv"));
        for (i, symbol) in ["AAPL", "MSFT", "NVDA"].iter().enumerate() {
            log.append(&record(symbol, i as u32, Some(100.0))).unwrap();
        }

        let recent = log.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].symbol, "MSFT");
        assert_eq!(recent[1].symbol, "NVDA");
        assert_eq!(log.recent(50).unwrap().len(), 3);
    }

    #[test]
    fn test_round_trip_preserves_missing_price() {
        let dir = tempdir().unwrap();
        let log = CsvTradeLog::new(dir.path().join("trades.csv"));
        let original = record("AMD", 5, None);
        log.append(&original).unwrap();
        assert_eq!(log.recent(1).unwrap(), vec![original]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = CsvTradeLog::new(dir.path().join("absent.csv"));
        assert!(log.recent(10).unwrap().is_empty());
    }
}
