use crate::engine::Trade;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//aggregate statistics over the whole trade ledger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub trade_count: usize,
    pub win_count: usize,
    pub win_ratio: f64,
    pub avg_pnl_pct: f64,
    pub total_pnl_pct: f64,
}

impl SummaryRecord {
    //reduces the ledger, an empty ledger gives the zeroed record
    pub fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return SummaryRecord::default();
        }

        let pnls: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
        let win_count = trades.iter().filter(|t| t.is_win()).count();
        let trade_count = trades.len();

        SummaryRecord {
            trade_count,
            win_count,
            win_ratio: win_count as f64 / trade_count as f64,
            avg_pnl_pct: pnls.iter().mean(),
            total_pnl_pct: pnls.iter().sum(),
        }
    }

    //one-line run report for alert delivery
    pub fn headline(&self) -> String {
        format!(
            "Run complete. Trades: {} | Win%: {:.2}%",
            self.trade_count,
            self.win_ratio * 100.0
        )
    }

    //prints the record in a formatted table
    pub fn pretty_print_table(&self) {
        self.to_table().printstd();
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        table.add_row(Row::new(vec![
            Cell::new("Trades"),
            Cell::new(&format!("{}", self.trade_count)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Wins"),
            Cell::new(&format!("{}", self.win_count)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Win Ratio"),
            Cell::new(&format!("{:.2}%", self.win_ratio * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Avg PnL"),
            Cell::new(&format!("{:.2}%", self.avg_pnl_pct)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Total PnL"),
            Cell::new(&format!("{:.2}%", self.total_pnl_pct)),
        ]));

        table
    }
}
