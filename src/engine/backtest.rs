use crate::data::PriceBar;
use crate::strategy::IndicatorRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a simulated long entry marked against the latest known price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    pub pnl_pct: f64,
}

impl Trade {
    //opens at entry's close and values the trade at exit's close
    pub fn mark_to_market(entry: &PriceBar, exit: &PriceBar) -> Self {
        Trade {
            symbol: entry.symbol.clone(),
            entry_timestamp: entry.timestamp,
            entry_price: entry.close,
            exit_timestamp: exit.timestamp,
            exit_price: exit.close,
            pnl_pct: pnl_pct(entry.close, exit.close),
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl_pct > 0.0
    }
}

//percentage return of a long trade
pub fn pnl_pct(entry_price: f64, exit_price: f64) -> f64 {
    (exit_price - entry_price) / entry_price * 100.0
}

//long-only backtest of one symbol's signal rows
//
//every buy row opens its own trade and all of them are valued at the last
//bar's close. this answers "what would each signal be worth now", not a
//sequential position backtest: trades overlap freely and there is no stop,
//re-entry suppression or capital limit
pub fn backtest_long_only(rows: &[IndicatorRow]) -> Vec<Trade> {
    let last = match rows.last() {
        Some(row) => &row.bar,
        None => return Vec::new(),
    };

    rows.iter()
        .filter(|row| row.buy_signal)
        .map(|row| Trade::mark_to_market(&row.bar, last))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyParams;
    use crate::strategy::compute_indicators;
    use crate::test_util::{bars_from_closes, day};
    use approx::assert_relative_eq;

    fn rows_with_buys(closes: &[f64], buys: &[usize]) -> Vec<IndicatorRow> {
        let mut rows =
            compute_indicators(&bars_from_closes("AAA", closes), &StrategyParams::default());
        for &i in buys {
            rows[i].buy_signal = true;
        }
        rows
    }

    #[test]
    fn no_rows_no_trades() {
        assert!(backtest_long_only(&[]).is_empty());
    }

    #[test]
    fn no_signals_no_trades() {
        assert!(backtest_long_only(&rows_with_buys(&[1.0, 2.0, 3.0], &[])).is_empty());
    }

    #[test]
    fn every_signal_marks_to_last_close() {
        let rows = rows_with_buys(&[10.0, 8.0, 12.0, 11.0, 15.0], &[1, 3]);
        let trades = backtest_long_only(&rows);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].entry_timestamp, day(2));
        assert_eq!(trades[1].entry_timestamp, day(4));

        for trade in &trades {
            assert_eq!(trade.symbol, "AAA");
            assert_eq!(trade.exit_price, 15.0);
            assert_eq!(trade.exit_timestamp, day(5));
        }

        assert_relative_eq!(trades[0].pnl_pct, 87.5);
        assert_relative_eq!(trades[1].pnl_pct, (15.0 - 11.0) / 11.0 * 100.0);
    }

    #[test]
    fn signal_on_last_bar_is_flat() {
        let rows = rows_with_buys(&[10.0, 9.0, 8.0, 7.0, 20.0], &[4]);
        let trades = backtest_long_only(&rows);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_price, 20.0);
        assert_eq!(trades[0].exit_price, 20.0);
        assert_eq!(trades[0].pnl_pct, 0.0);
        assert!(!trades[0].is_win());
    }

    #[test]
    fn losing_trade_is_negative() {
        assert_relative_eq!(pnl_pct(20.0, 15.0), -25.0);
    }
}
