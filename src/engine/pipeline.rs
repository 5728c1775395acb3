use crate::config::StrategyParams;
use crate::data::{PriceBar, RawFrame};
use crate::engine::backtest::{backtest_long_only, Trade};
use crate::metrics::SummaryRecord;
use crate::strategy::{compute_indicators, IndicatorRow, SignalGenerator, SignalProvider};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, info_span, warn};

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

//indicator rows and trades produced for one symbol
#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub rows: Vec<IndicatorRow>,
    pub trades: Vec<Trade>,
}

//a symbol left out of the run and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

//everything one run hands to the reporting side
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    //indicator rows of all symbols, ordered by symbol then timestamp
    pub rows: Vec<IndicatorRow>,

    //complete ledger, ordered by symbol then entry time
    pub trades: Vec<Trade>,

    pub summary: SummaryRecord,
    pub skipped: Vec<SkippedSymbol>,
}

impl PipelineOutput {
    pub fn symbol_count(&self) -> usize {
        let mut symbols: Vec<&str> = self.rows.iter().map(|r| r.bar.symbol.as_str()).collect();
        symbols.dedup();
        symbols.len()
    }
}

//resolve -> indicators -> signals -> backtest per symbol, then one summary
pub struct Pipeline {
    params: StrategyParams,
    signals: SignalGenerator,
}

impl Pipeline {
    pub fn new(params: StrategyParams) -> Self {
        let signals = SignalGenerator::new(params.rsi_buy_threshold);
        Pipeline { params, signals }
    }

    //adds an auxiliary buy signal, or-ed into every symbol's decision
    pub fn with_provider(mut self, provider: Box<dyn SignalProvider>) -> Self {
        self.signals.add_provider(provider);
        self
    }

    //runs one symbol's chronologically sorted bars
    pub fn run_symbol(&self, symbol: &str, bars: &[PriceBar]) -> SymbolReport {
        let mut rows = compute_indicators(bars, &self.params);
        self.signals.apply(symbol, &mut rows);
        let trades = backtest_long_only(&rows);

        debug!(
            symbol,
            bars = rows.len(),
            signals = rows.iter().filter(|r| r.buy_signal).count(),
            trades = trades.len(),
            "symbol processed"
        );

        SymbolReport {
            symbol: symbol.to_string(),
            rows,
            trades,
        }
    }

    //runs every frame, a frame that cannot be resolved is skipped on its own
    pub fn run(&self, frames: &[RawFrame]) -> PipelineOutput {
        let run_id = NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("pipeline", run_id);
        let _guard = span.enter();

        info!(
            symbols = frames.len(),
            rsi_period = self.params.rsi_period,
            short_dma = self.params.short_dma,
            long_dma = self.params.long_dma,
            rsi_buy_threshold = self.params.rsi_buy_threshold,
            providers = self.signals.provider_count(),
            "starting run"
        );

        //symbols share nothing, so each one runs on its own worker
        let results: Vec<Result<SymbolReport, SkippedSymbol>> = frames
            .par_iter()
            .map(|frame| {
                span.in_scope(|| match frame.to_price_bars() {
                    Ok(bars) => Ok(self.run_symbol(&frame.symbol, &bars)),
                    Err(err) => {
                        warn!(symbol = %frame.symbol, error = %err, "skipping symbol");
                        Err(SkippedSymbol {
                            symbol: frame.symbol.clone(),
                            reason: err.to_string(),
                        })
                    }
                })
            })
            .collect();

        //join: the summary needs the complete ledger
        let mut output = PipelineOutput::default();
        for result in results {
            match result {
                Ok(report) => {
                    output.rows.extend(report.rows);
                    output.trades.extend(report.trades);
                }
                Err(skipped) => output.skipped.push(skipped),
            }
        }

        output
            .rows
            .sort_by(|a, b| (&a.bar.symbol, a.bar.timestamp).cmp(&(&b.bar.symbol, b.bar.timestamp)));
        output
            .trades
            .sort_by(|a, b| (&a.symbol, a.entry_timestamp).cmp(&(&b.symbol, b.entry_timestamp)));
        output.skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        output.summary = SummaryRecord::from_trades(&output.trades);

        info!(
            trades = output.summary.trade_count,
            wins = output.summary.win_count,
            skipped = output.skipped.len(),
            "{}",
            output.summary.headline()
        );

        output
    }
}
