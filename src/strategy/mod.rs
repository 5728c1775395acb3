pub mod indicators;
pub mod signals;

pub use indicators::{
    backfill, compute_indicators, crossover_up, moving_average, rsi, IndicatorRow,
};
pub use signals::{indicator_decision, ExternalSignal, SignalGenerator, SignalProvider};
