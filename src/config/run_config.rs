use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value}")]
    NonPositiveWindow { name: &'static str, value: usize },
    #[error("rsi_buy_threshold must be within [0, 100], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("header_rows must be at least 1")]
    NoHeaderRows,
}

//indicator and signal parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub rsi_period: usize,
    pub short_dma: usize,
    pub long_dma: usize,
    pub rsi_buy_threshold: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            rsi_period: 14,
            short_dma: 20,
            long_dma: 50,
            rsi_buy_threshold: 30.0,
        }
    }
}

impl StrategyParams {
    //checks value ranges, short_dma < long_dma is a convention and not enforced
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("rsi_period", self.rsi_period),
            ("short_dma", self.short_dma),
            ("long_dma", self.long_dma),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositiveWindow { name, value });
            }
        }

        if !self.rsi_buy_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.rsi_buy_threshold)
        {
            return Err(ConfigError::ThresholdOutOfRange(self.rsi_buy_threshold));
        }

        Ok(())
    }

    //true when the windows follow the usual short < long convention
    pub fn windows_ordered(&self) -> bool {
        self.short_dma < self.long_dma
    }
}

//where bars come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    //symbols to keep, empty keeps every symbol found
    pub symbols: Vec<String>,

    //csv files with bars
    pub paths: Vec<PathBuf>,

    //number of header rows, more than one means a hierarchical header
    pub header_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            symbols: Vec::new(),
            paths: Vec::new(),
            header_rows: 1,
        }
    }
}

//where reports go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub reports_dir: PathBuf,
    pub write_indicators: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            reports_dir: PathBuf::from("reports"),
            write_indicators: true,
        }
    }
}

//complete run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data: DataConfig,
    pub strategy: StrategyParams,
    pub output: OutputConfig,
}

impl RunConfig {
    //load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: RunConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.header_rows == 0 {
            return Err(ConfigError::NoHeaderRows);
        }
        self.strategy.validate()
    }
}
