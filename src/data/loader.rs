use crate::data::frame::{flatten_header, normalize_header, RawFrame};
use crate::strategy::ExternalSignal;
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use std::path::Path;
use tracing::{info, warn};

//column that splits a long file into one frame per symbol
pub const SYMBOL_COLUMN: &str = "SYMBOL";

//frames plus the external buy flags found in them
#[derive(Debug, Default)]
pub struct LoadedData {
    pub frames: Vec<RawFrame>,
    pub signals: Vec<ExternalSignal>,
}

//builds the flat, normalized header from the first header_rows records
fn build_header(records: &[StringRecord]) -> Vec<String> {
    let width = records.iter().map(|r| r.len()).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            let parts: Vec<&str> = records.iter().map(|r| r.get(col).unwrap_or("")).collect();
            normalize_header(&flatten_header(&parts))
        })
        .collect()
}

//loads one csv file into raw frames
//files with a SYMBOL column yield one frame per symbol in first-seen order,
//otherwise the whole file is one frame named after the file stem
pub fn load_csv<P: AsRef<Path>>(path: P, header_rows: usize) -> Result<Vec<RawFrame>> {
    let path = path.as_ref();
    if header_rows == 0 {
        bail!("header_rows must be at least 1 for {:?}", path);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to parse CSV record at line {}", index + 1))?;
        records.push(record);
    }

    if records.len() < header_rows {
        bail!("CSV file {:?} has fewer than {} header rows", path, header_rows);
    }

    let (header_records, body) = records.split_at(header_rows);
    let header = build_header(header_records);

    //keep the first occurrence of a repeated column name
    let mut positions: IndexMap<String, usize> = IndexMap::new();
    for (i, name) in header.iter().enumerate() {
        if name.is_empty() {
            continue;
        }
        if positions.contains_key(name) {
            warn!(file = ?path, column = %name, "duplicate column ignored");
            continue;
        }
        positions.insert(name.clone(), i);
    }

    let symbol_pos = positions.get(SYMBOL_COLUMN).copied();
    let default_symbol = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    //symbol -> column -> cells
    let mut grouped: IndexMap<String, IndexMap<String, Vec<String>>> = IndexMap::new();
    for record in body {
        //trailing blank lines come through as single empty fields
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let symbol = match symbol_pos {
            Some(pos) => record.get(pos).unwrap_or("").trim().to_string(),
            None => default_symbol.clone(),
        };

        let columns = grouped.entry(symbol).or_insert_with(|| {
            positions
                .keys()
                .map(|name| (name.clone(), Vec::new()))
                .collect()
        });

        for (name, &pos) in &positions {
            let cell = record.get(pos).unwrap_or("").to_string();
            if let Some(cells) = columns.get_mut(name) {
                cells.push(cell);
            }
        }
    }

    let frames = grouped
        .into_iter()
        .map(|(symbol, columns)| {
            let mut frame = RawFrame::new(symbol);
            for (name, cells) in columns {
                frame.push_column(name, cells);
            }
            frame
        })
        .collect();

    Ok(frames)
}

//filters frames by symbol, an empty filter keeps everything
pub fn filter_by_symbol(frames: Vec<RawFrame>, symbols: &[String]) -> Vec<RawFrame> {
    if symbols.is_empty() {
        return frames;
    }

    for wanted in symbols {
        if !frames.iter().any(|f| &f.symbol == wanted) {
            warn!(symbol = %wanted, "no data found for symbol");
        }
    }

    frames
        .into_iter()
        .filter(|f| symbols.contains(&f.symbol))
        .collect()
}

//turns every BUY_SIGNAL* column into a named external signal
//frames whose flags cannot be read contribute nothing, the pipeline reports them
pub fn collect_signals(frames: &[RawFrame]) -> Vec<ExternalSignal> {
    let mut signals: IndexMap<String, ExternalSignal> = IndexMap::new();

    for frame in frames {
        let columns = match frame.signal_columns() {
            Ok(columns) => columns,
            Err(err) => {
                warn!(symbol = %frame.symbol, error = %err, "ignoring signal columns");
                continue;
            }
        };

        for (name, flags) in columns {
            let signal = signals
                .entry(name.clone())
                .or_insert_with(|| ExternalSignal::new(name));
            for (timestamp, flag) in flags {
                if flag {
                    signal.flag(&frame.symbol, timestamp);
                }
            }
        }
    }

    signals.into_values().collect()
}

//loads every file, drops repeated symbols and applies the symbol filter
pub fn load_all<P: AsRef<Path>>(
    paths: &[P],
    header_rows: usize,
    symbols: &[String],
) -> Result<LoadedData> {
    let mut frames: Vec<RawFrame> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let loaded = load_csv(path, header_rows)?;
        info!(file = ?path, frames = loaded.len(), "loaded bars");

        for frame in loaded {
            if frames.iter().any(|f| f.symbol == frame.symbol) {
                warn!(symbol = %frame.symbol, file = ?path, "symbol already loaded, later copy ignored");
                continue;
            }
            frames.push(frame);
        }
    }

    let frames = filter_by_symbol(frames, symbols);
    let signals = collect_signals(&frames);

    Ok(LoadedData { frames, signals })
}
