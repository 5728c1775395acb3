use crate::data::BUY_SIGNAL_PREFIX;
use crate::strategy::indicators::IndicatorRow;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

//auxiliary buy signal that is or-ed into the indicator decision
//providers are evaluated per symbol and must return one flag per row
pub trait SignalProvider: Send + Sync {
    //provider name, used to build the BUY_SIGNAL_* field on each row
    fn name(&self) -> &str;

    //returns one flag per row, missing entries count as false
    fn evaluate(&self, symbol: &str, rows: &[IndicatorRow]) -> Vec<bool>;
}

//suffix given to a provider named exactly BUY_SIGNAL, that name belongs to the combined decision
pub const BARE_SIGNAL_SUFFIX: &str = "INPUT";

//the row field a provider's output is stored under
pub fn signal_field(name: &str) -> String {
    if name == BUY_SIGNAL_PREFIX {
        format!("{}_{}", BUY_SIGNAL_PREFIX, BARE_SIGNAL_SUFFIX)
    } else if name.starts_with(BUY_SIGNAL_PREFIX) {
        name.to_string()
    } else {
        format!("{}_{}", BUY_SIGNAL_PREFIX, name.to_uppercase())
    }
}

//buy flags supplied from outside, keyed by symbol and bar timestamp
#[derive(Debug, Clone, Default)]
pub struct ExternalSignal {
    name: String,
    flagged: HashMap<String, HashSet<DateTime<Utc>>>,
}

impl ExternalSignal {
    pub fn new(name: impl Into<String>) -> Self {
        ExternalSignal {
            name: name.into(),
            flagged: HashMap::new(),
        }
    }

    //marks a bar as a buy
    pub fn flag(&mut self, symbol: &str, timestamp: DateTime<Utc>) {
        self.flagged
            .entry(symbol.to_string())
            .or_default()
            .insert(timestamp);
    }

    //number of flagged bars across all symbols
    pub fn flagged_count(&self) -> usize {
        self.flagged.values().map(|s| s.len()).sum()
    }
}

impl SignalProvider for ExternalSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, symbol: &str, rows: &[IndicatorRow]) -> Vec<bool> {
        match self.flagged.get(symbol) {
            Some(set) => rows.iter().map(|r| set.contains(&r.bar.timestamp)).collect(),
            None => vec![false; rows.len()],
        }
    }
}

//the indicator-only decision: oversold rsi on a crossover bar
//an undefined rsi never satisfies the threshold
pub fn indicator_decision(row: &IndicatorRow, rsi_buy_threshold: f64) -> bool {
    let oversold = row.rsi.map(|r| r < rsi_buy_threshold).unwrap_or(false);
    oversold && row.dma_cross_up
}

//combines indicator state and auxiliary providers into one buy decision per bar
pub struct SignalGenerator {
    rsi_buy_threshold: f64,
    providers: Vec<Box<dyn SignalProvider>>,
}

impl SignalGenerator {
    pub fn new(rsi_buy_threshold: f64) -> Self {
        SignalGenerator {
            rsi_buy_threshold,
            providers: Vec::new(),
        }
    }

    //appends an auxiliary provider, evaluation follows insertion order
    pub fn with_provider(mut self, provider: Box<dyn SignalProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn SignalProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    //fills buy_signal and aux_signals on every row of one symbol
    pub fn apply(&self, symbol: &str, rows: &mut [IndicatorRow]) {
        let aux: Vec<(String, Vec<bool>)> = self
            .providers
            .iter()
            .map(|p| (signal_field(p.name()), p.evaluate(symbol, rows)))
            .collect();

        for (i, row) in rows.iter_mut().enumerate() {
            let mut decision = indicator_decision(row, self.rsi_buy_threshold);

            for (field, flags) in &aux {
                let flag = flags.get(i).copied().unwrap_or(false);
                row.aux_signals.insert(field.clone(), flag);
                decision |= flag;
            }

            row.buy_signal = decision;
        }
    }
}
