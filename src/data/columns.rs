use thiserror::Error;

//number of available column names echoed back when no timestamp column is found
pub const MAX_REPORTED_COLUMNS: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MissingColumnError {
    #[error("No CLOSE-like column found for {symbol} (searched: {})", .candidates.join(", "))]
    Close {
        symbol: String,
        candidates: Vec<String>,
    },
    #[error(
        "No DATETIME-like column found for {symbol} (searched: {}). Available: {available:?} ... (total {total})",
        .candidates.join(", ")
    )]
    Timestamp {
        symbol: String,
        candidates: Vec<String>,
        available: Vec<String>,
        total: usize,
    },
}

//the close and timestamp field names picked for one symbol's frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub close: String,
    pub timestamp: String,
}

//candidate list for the close column, in search order
//entries ending in '*' are prefix matches
fn close_candidates(symbol: &str) -> Vec<String> {
    vec![
        format!("CLOSE_{}", symbol),
        "CLOSE_*".to_string(),
        "CLOSE".to_string(),
        format!("ADJ CLOSE_{}", symbol),
        "ADJ_CLOSE".to_string(),
        "ADJ CLOSE".to_string(),
    ]
}

fn timestamp_candidates() -> Vec<String> {
    vec!["DATETIME".to_string(), "DATETIME*".to_string()]
}

//returns the first column matching the candidate, honoring column order for prefix matches
fn find_candidate<'a>(columns: &[&'a str], candidate: &str) -> Option<&'a str> {
    match candidate.strip_suffix('*') {
        Some(prefix) => columns.iter().copied().find(|c| c.starts_with(prefix)),
        None => columns.iter().copied().find(|c| *c == candidate),
    }
}

//picks the close-price column for a symbol
pub fn resolve_close(columns: &[&str], symbol: &str) -> Result<String, MissingColumnError> {
    let candidates = close_candidates(symbol);

    for candidate in &candidates {
        if let Some(found) = find_candidate(columns, candidate) {
            return Ok(found.to_string());
        }
    }

    Err(MissingColumnError::Close {
        symbol: symbol.to_string(),
        candidates,
    })
}

//picks the timestamp column for a symbol
pub fn resolve_timestamp(columns: &[&str], symbol: &str) -> Result<String, MissingColumnError> {
    let candidates = timestamp_candidates();

    for candidate in &candidates {
        if let Some(found) = find_candidate(columns, candidate) {
            return Ok(found.to_string());
        }
    }

    Err(MissingColumnError::Timestamp {
        symbol: symbol.to_string(),
        candidates,
        available: columns
            .iter()
            .take(MAX_REPORTED_COLUMNS)
            .map(|c| c.to_string())
            .collect(),
        total: columns.len(),
    })
}

//resolves both canonical columns, close first
pub fn resolve(columns: &[&str], symbol: &str) -> Result<ResolvedColumns, MissingColumnError> {
    let close = resolve_close(columns, symbol)?;
    let timestamp = resolve_timestamp(columns, symbol)?;
    Ok(ResolvedColumns { close, timestamp })
}
