//fixtures shared by the unit test modules

use crate::data::{PriceBar, RawFrame};
use chrono::{DateTime, TimeZone, Utc};

//midnight utc on the given day of january 2024
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

//one bar per close on consecutive days starting 2024-01-01
pub fn bars_from_closes(symbol: &str, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(symbol, day(i as u32 + 1), c))
        .collect()
}

//raw frame equivalent of bars_from_closes
pub fn frame_from_closes(symbol: &str, closes: &[f64]) -> RawFrame {
    let dates: Vec<String> = (0..closes.len())
        .map(|i| day(i as u32 + 1).format("%Y-%m-%d").to_string())
        .collect();
    RawFrame::new(symbol)
        .with_column("DATETIME", &dates)
        .with_column("CLOSE", closes)
}
