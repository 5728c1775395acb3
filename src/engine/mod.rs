pub mod backtest;
pub mod pipeline;

pub use backtest::{backtest_long_only, Trade};
pub use pipeline::{Pipeline, PipelineOutput, SkippedSymbol, SymbolReport};
