use crate::data::bar::{sort_chronologically, BarError, PriceBar};
use crate::data::columns::{self, MissingColumnError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;

//prefix of externally supplied boolean buy columns
pub const BUY_SIGNAL_PREFIX: &str = "BUY_SIGNAL";

#[derive(Error, Debug, PartialEq)]
pub enum FrameError {
    #[error(transparent)]
    MissingColumn(#[from] MissingColumnError),
    #[error("{symbol}: cannot parse timestamp '{value}' at row {row}")]
    InvalidTimestamp {
        symbol: String,
        row: usize,
        value: String,
    },
    #[error("{symbol}: cannot parse {column} value '{value}' at row {row}")]
    InvalidCell {
        symbol: String,
        column: String,
        row: usize,
        value: String,
    },
    #[error("{symbol}: invalid bar at row {row}: {source}")]
    InvalidBar {
        symbol: String,
        row: usize,
        source: BarError,
    },
    #[error("{symbol}: timestamp '{value}' at row {row} repeats an earlier bar")]
    DuplicateTimestamp {
        symbol: String,
        row: usize,
        value: String,
    },
    #[error("{symbol}: column {column} has {found} cells, expected {expected}")]
    Ragged {
        symbol: String,
        column: String,
        expected: usize,
        found: usize,
    },
}

impl FrameError {
    //true when the frame was skipped because a canonical column is absent
    pub fn is_missing_column(&self) -> bool {
        matches!(self, FrameError::MissingColumn(_))
    }
}

//joins the levels of a hierarchical header into one flat name
//blank levels are dropped and stray underscores trimmed, so ("Close", "AAPL") becomes Close_AAPL
pub fn flatten_header(parts: &[&str]) -> String {
    let kept: Vec<&str> = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    kept.join("_").trim_matches('_').to_string()
}

//upper-cases a header and maps the source's date index names onto DATETIME
pub fn normalize_header(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    match upper.as_str() {
        "DATE" | "INDEX" => "DATETIME".to_string(),
        _ => upper,
    }
}

//loosely-typed table of raw cells for one symbol, as it arrives from ingestion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub symbol: String,
    columns: IndexMap<String, Vec<String>>,
}

impl RawFrame {
    pub fn new(symbol: impl Into<String>) -> Self {
        RawFrame {
            symbol: symbol.into(),
            columns: IndexMap::new(),
        }
    }

    //adds or replaces a column, keeping first-insertion order
    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<String>) {
        self.columns.insert(name.into(), cells);
    }

    //builder-style variant of push_column
    pub fn with_column<S: ToString>(mut self, name: &str, cells: &[S]) -> Self {
        self.push_column(name, cells.iter().map(|c| c.to_string()).collect());
        self
    }

    //column names in source order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    //number of rows (length of the longest column)
    pub fn len(&self) -> usize {
        self.columns.values().map(|c| c.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_rectangular(&self) -> Result<(), FrameError> {
        let expected = self.len();
        for (name, cells) in &self.columns {
            if cells.len() != expected {
                return Err(FrameError::Ragged {
                    symbol: self.symbol.clone(),
                    column: name.clone(),
                    expected,
                    found: cells.len(),
                });
            }
        }
        Ok(())
    }

    //locates an optional canonical column, symbol-suffixed variant first
    fn optional_column(&self, base: &str) -> Option<(&str, &[String])> {
        let suffixed = format!("{}_{}", base, self.symbol);
        self.columns
            .get_key_value(suffixed.as_str())
            .or_else(|| self.columns.get_key_value(base))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    //converts the frame into chronologically sorted typed bars
    //the canonical columns are resolved once here, nothing downstream looks at raw names
    pub fn to_price_bars(&self) -> Result<Vec<PriceBar>, FrameError> {
        let names = self.column_names();
        let resolved = columns::resolve(&names, &self.symbol)?;
        self.check_rectangular()?;

        let close_cells = &self.columns[resolved.close.as_str()];
        let time_cells = &self.columns[resolved.timestamp.as_str()];
        let open = self.optional_column("OPEN");
        let high = self.optional_column("HIGH");
        let low = self.optional_column("LOW");
        let volume = self.optional_column("VOLUME");

        let mut bars = Vec::with_capacity(self.len());
        let mut seen = HashSet::with_capacity(self.len());

        for row in 0..self.len() {
            let raw_time = &time_cells[row];
            let timestamp =
                parse_timestamp(raw_time).ok_or_else(|| FrameError::InvalidTimestamp {
                    symbol: self.symbol.clone(),
                    row: row + 1,
                    value: raw_time.clone(),
                })?;

            //one bar per instant, compared after parsing
            if !seen.insert(timestamp) {
                return Err(FrameError::DuplicateTimestamp {
                    symbol: self.symbol.clone(),
                    row: row + 1,
                    value: raw_time.clone(),
                });
            }

            let close = self
                .parse_number(&resolved.close, row, &close_cells[row])?
                .ok_or_else(|| FrameError::InvalidCell {
                    symbol: self.symbol.clone(),
                    column: resolved.close.clone(),
                    row: row + 1,
                    value: String::new(),
                })?;

            let cell = |col: Option<(&str, &[String])>| -> Result<Option<f64>, FrameError> {
                match col {
                    Some((name, cells)) => self.parse_number(name, row, &cells[row]),
                    None => Ok(None),
                }
            };

            let bar = PriceBar::new(
                self.symbol.clone(),
                timestamp,
                cell(open)?,
                cell(high)?,
                cell(low)?,
                close,
                cell(volume)?,
            )
            .map_err(|source| FrameError::InvalidBar {
                symbol: self.symbol.clone(),
                row: row + 1,
                source,
            })?;

            bars.push(bar);
        }

        sort_chronologically(&mut bars);
        Ok(bars)
    }

    //returns every BUY_SIGNAL* column as (timestamp, flag) pairs
    //used by the loader to turn raw flag columns into explicit signal providers
    pub fn signal_columns(&self) -> Result<Vec<(String, Vec<(DateTime<Utc>, bool)>)>, FrameError> {
        let names = self.column_names();
        let time_name = columns::resolve_timestamp(&names, &self.symbol)?;
        self.check_rectangular()?;
        let time_cells = &self.columns[time_name.as_str()];

        let mut out = Vec::new();
        for (name, cells) in &self.columns {
            if !name.starts_with(BUY_SIGNAL_PREFIX) {
                continue;
            }

            let mut flags = Vec::with_capacity(cells.len());
            for (row, raw) in cells.iter().enumerate() {
                let timestamp =
                    parse_timestamp(&time_cells[row]).ok_or_else(|| FrameError::InvalidTimestamp {
                        symbol: self.symbol.clone(),
                        row: row + 1,
                        value: time_cells[row].clone(),
                    })?;
                let flag = parse_flag(raw).ok_or_else(|| FrameError::InvalidCell {
                    symbol: self.symbol.clone(),
                    column: name.clone(),
                    row: row + 1,
                    value: raw.clone(),
                })?;
                flags.push((timestamp, flag));
            }
            out.push((name.clone(), flags));
        }

        Ok(out)
    }

    fn parse_number(&self, column: &str, row: usize, raw: &str) -> Result<Option<f64>, FrameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<f64>()
            .map(Some)
            .map_err(|_| FrameError::InvalidCell {
                symbol: self.symbol.clone(),
                column: column.to_string(),
                row: row + 1,
                value: raw.to_string(),
            })
    }
}

//parses the timestamp spellings seen in ingested files
//naive values are taken as utc
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

//parses a boolean flag cell, blank counts as false
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "1.0" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "0.0" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}
