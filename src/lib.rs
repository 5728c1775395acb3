//a Rust-based RSI and moving-average crossover signal generator and mark-to-market backtester

pub mod config;
pub mod data;
pub mod engine;
pub mod metrics;
pub mod report;
pub mod strategy;

#[cfg(test)]
mod test_util;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigError, DataConfig, OutputConfig, RunConfig, StrategyParams};
    pub use crate::data::{
        filter_by_symbol, load_all, load_csv, FrameError, LoadedData, MissingColumnError,
        PriceBar, RawFrame,
    };
    pub use crate::engine::{
        backtest_long_only, Pipeline, PipelineOutput, SkippedSymbol, SymbolReport, Trade,
    };
    pub use crate::metrics::SummaryRecord;
    pub use crate::report::{write_reports, ReportPaths};
    pub use crate::strategy::{
        compute_indicators, ExternalSignal, IndicatorRow, SignalGenerator, SignalProvider,
    };
}
