#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

//closes that fall, then bounce hard enough for a close-over-average crossover
//while the 4-bar rsi is still about 20
pub const BOUNCE_CLOSES: [f64; 8] = [20.0, 18.0, 16.0, 14.0, 12.0, 13.5, 15.0, 16.0];

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

pub fn date(i: usize) -> String {
    format!("2024-01-{:02}", i + 1)
}

//csv body with one bar per day, DATETIME and CLOSE only
pub fn closes_csv(closes: &[f64]) -> String {
    let mut out = String::from("Date,Close\n");
    for (i, c) in closes.iter().enumerate() {
        out.push_str(&format!("{},{}\n", date(i), c));
    }
    out
}

//long-format csv with a SYMBOL column
pub fn long_csv(series: &[(&str, &[f64])]) -> String {
    let mut out = String::from("DATETIME,SYMBOL,OPEN,CLOSE,VOLUME\n");
    for (symbol, closes) in series {
        for (i, c) in closes.iter().enumerate() {
            out.push_str(&format!("{},{},{},{},1000\n", date(i), symbol, c, c));
        }
    }
    out
}
