use crate::config::StrategyParams;
use crate::data::PriceBar;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

//a price bar together with the indicator state computed for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorRow {
    pub bar: PriceBar,

    //none where no full window exists and nothing later could fill it
    pub rsi: Option<f64>,

    //short and long moving averages, always defined
    pub dma_s: f64,
    pub dma_l: f64,

    pub dma_cross_up: bool,

    //final buy decision, filled in by the signal generator
    pub buy_signal: bool,

    //auxiliary BUY_SIGNAL_* flags in provider order
    pub aux_signals: IndexMap<String, bool>,
}

//rolling arithmetic mean, pandas-style
//positions with fewer than min_periods points in the window are undefined
pub fn rolling_mean(series: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let min_periods = min_periods.clamp(1, window);

    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &series[start..=i];
            if slice.len() < min_periods {
                None
            } else {
                Some(slice.iter().sum::<f64>() / slice.len() as f64)
            }
        })
        .collect()
}

//moving average with a minimum window of 1
//the first w-1 points average over everything seen so far instead of being undefined
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    rolling_mean(series, window, 1)
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

//fills each undefined value with the nearest later defined one
//trailing undefined values have nothing to copy and stay undefined
pub fn backfill(values: &mut [Option<f64>]) {
    let mut next: Option<f64> = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}

//relative strength index over simple rolling means of gains and losses
//
//the first p-1 positions have no full window and are back-filled from the first
//defined value, so early history shows a flat rsi that was never observed.
//a window with zero average loss has no defined relative strength rather than
//an rsi of 100
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    if period == 0 {
        return vec![None; n];
    }

    //first delta is undefined and contributes nothing to either side
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else if change < 0.0 {
            losses[i] = -change;
        }
    }

    let avg_gain = rolling_mean(&gains, period, period);
    let avg_loss = rolling_mean(&losses, period, period);

    let mut values: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) if *l != 0.0 => {
                let rs = g / l;
                Some(100.0 - (100.0 / (1.0 + rs)))
            }
            _ => None,
        })
        .collect();

    backfill(&mut values);
    values
}

//true where short moves from at-or-below long to strictly above it
pub fn crossover_up(short: &[f64], long: &[f64]) -> Vec<bool> {
    let n = short.len().min(long.len());
    (0..n)
        .map(|i| i > 0 && short[i] > long[i] && short[i - 1] <= long[i - 1])
        .collect()
}

//computes rsi, both moving averages and the crossover flag for one symbol
//bars must already be in chronological order
pub fn compute_indicators(bars: &[PriceBar], params: &StrategyParams) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let rsi_values = rsi(&closes, params.rsi_period);
    let dma_s = moving_average(&closes, params.short_dma);
    let dma_l = moving_average(&closes, params.long_dma);
    let cross = crossover_up(&dma_s, &dma_l);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            bar: bar.clone(),
            rsi: rsi_values[i],
            dma_s: dma_s[i],
            dma_l: dma_l[i],
            dma_cross_up: cross[i],
            buy_signal: false,
            aux_signals: IndexMap::new(),
        })
        .collect()
}
