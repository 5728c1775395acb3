//tabular hand-off of run results as csv files

use crate::engine::{PipelineOutput, Trade};
use crate::metrics::SummaryRecord;
use crate::strategy::IndicatorRow;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::WriterBuilder;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

pub const INDICATORS_FILE: &str = "indicators.csv";
pub const TRADES_FILE: &str = "trade_log.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

const INDICATOR_HEADERS: [&str; 12] = [
    "DATETIME",
    "SYMBOL",
    "OPEN",
    "HIGH",
    "LOW",
    "CLOSE",
    "VOLUME",
    "RSI",
    "DMA_S",
    "DMA_L",
    "DMA_CROSS_UP",
    "BUY_SIGNAL",
];

const TRADE_HEADERS: [&str; 6] = [
    "symbol",
    "entry_timestamp",
    "entry_price",
    "exit_timestamp",
    "exit_price",
    "pnl_pct",
];

const SUMMARY_HEADERS: [&str; 5] = [
    "trade_count",
    "win_count",
    "win_ratio",
    "avg_pnl_pct",
    "total_pnl_pct",
];

//same spelling serde gives the trade ledger, e.g. 2024-01-01T00:00:00Z
fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

//writes the indicator-augmented bars, one column per auxiliary signal after the fixed ones
pub fn write_indicators_csv(rows: &[IndicatorRow], path: &Path) -> Result<()> {
    let aux_fields: IndexSet<&str> = rows
        .iter()
        .flat_map(|r| r.aux_signals.keys().map(|k| k.as_str()))
        .collect();

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    let mut header: Vec<&str> = INDICATOR_HEADERS.to_vec();
    header.extend(aux_fields.iter().copied());
    writer.write_record(&header)?;

    for row in rows {
        let bar = &row.bar;
        let mut record = vec![
            timestamp(&bar.timestamp),
            bar.symbol.clone(),
            opt(bar.open),
            opt(bar.high),
            opt(bar.low),
            bar.close.to_string(),
            opt(bar.volume),
            opt(row.rsi),
            row.dma_s.to_string(),
            row.dma_l.to_string(),
            row.dma_cross_up.to_string(),
            row.buy_signal.to_string(),
        ];
        for field in &aux_fields {
            let flag = row.aux_signals.get(*field).copied().unwrap_or(false);
            record.push(flag.to_string());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

//writes the trade ledger, the header is present even when there are no trades
pub fn write_trades_csv(trades: &[Trade], path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    writer.write_record(TRADE_HEADERS)?;
    for trade in trades {
        writer.serialize(trade)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(summary: &SummaryRecord, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    writer.write_record(SUMMARY_HEADERS)?;
    writer.serialize(summary)?;

    writer.flush()?;
    Ok(())
}

//files written by write_reports
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub indicators: Option<PathBuf>,
    pub trades: PathBuf,
    pub summary: PathBuf,
}

//writes every report of a run into dir, creating it when missing
pub fn write_reports(output: &PipelineOutput, dir: &Path, with_indicators: bool) -> Result<ReportPaths> {
    std::fs::create_dir_all(dir).context(format!("Failed to create reports dir {:?}", dir))?;

    let indicators = if with_indicators {
        let path = dir.join(INDICATORS_FILE);
        write_indicators_csv(&output.rows, &path)?;
        Some(path)
    } else {
        None
    };

    let trades = dir.join(TRADES_FILE);
    write_trades_csv(&output.trades, &trades)?;

    let summary = dir.join(SUMMARY_FILE);
    write_summary_csv(&output.summary, &summary)?;

    Ok(ReportPaths {
        indicators,
        trades,
        summary,
    })
}
