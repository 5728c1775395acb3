use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    #[error("Invalid close value: {0} (close must be finite and non-zero)")]
    InvalidClose(f64),
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//represents a single price bar of one symbol
//only close is required, the other prices are whatever the source supplied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    //creates a new PriceBar with validation
    //close is the divisor of every pnl computed from this bar, so zero and nan are rejected
    pub fn new(
        symbol: String,
        timestamp: DateTime<Utc>,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: f64,
        volume: Option<f64>,
    ) -> Result<Self, BarError> {
        if !close.is_finite() || close == 0.0 {
            return Err(BarError::InvalidClose(close));
        }

        if let Some(v) = volume {
            if v < 0.0 {
                return Err(BarError::NegativeVolume(v));
            }
        }

        Ok(PriceBar {
            symbol,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    //creates a bar carrying only a close price, unchecked
    #[cfg(test)]
    pub fn from_close(symbol: &str, timestamp: DateTime<Utc>, close: f64) -> Self {
        PriceBar {
            symbol: symbol.to_string(),
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

//sorts bars chronologically, the order every indicator expects
pub fn sort_chronologically(bars: &mut [PriceBar]) {
    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}
