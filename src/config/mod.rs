pub mod run_config;

pub use run_config::{ConfigError, DataConfig, OutputConfig, RunConfig, StrategyParams};
