mod common;

use approx::assert_relative_eq;
use common::*;
use minialgo::prelude::*;

fn bounce_params() -> StrategyParams {
    StrategyParams {
        rsi_period: 4,
        short_dma: 1,
        long_dma: 3,
        rsi_buy_threshold: 50.0,
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn csv_to_reports() {
        let dir = tempfile::tempdir().unwrap();
        let flat = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0];
        let long = write_file(
            dir.path(),
            "bars.csv",
            &long_csv(&[("AAA", &BOUNCE_CLOSES), ("CCC", &flat)]),
        );
        let broken = write_file(dir.path(), "BBB.csv", "DATETIME,OPEN\n2024-01-01,1\n");

        let loaded = load_all(&[long, broken], 1, &[]).unwrap();
        assert_eq!(loaded.frames.len(), 3);
        assert!(loaded.signals.is_empty());

        let output = Pipeline::new(bounce_params()).run(&loaded.frames);

        //BBB has no close column and is left out on its own
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].symbol, "BBB");
        assert_eq!(output.symbol_count(), 2);
        assert_eq!(output.rows.len(), 16);

        assert_eq!(output.trades.len(), 1);
        let trade = &output.trades[0];
        assert_eq!(trade.symbol, "AAA");
        assert_eq!(trade.entry_price, 13.5);
        assert_eq!(trade.exit_price, 16.0);
        assert_relative_eq!(trade.pnl_pct, 2.5 / 13.5 * 100.0);

        assert_eq!(output.summary.trade_count, 1);
        assert_eq!(output.summary.win_count, 1);
        assert_relative_eq!(output.summary.win_ratio, 1.0);

        let reports = dir.path().join("reports");
        let paths = write_reports(&output, &reports, true).unwrap();
        let trade_log = std::fs::read_to_string(&paths.trades).unwrap();
        assert_eq!(trade_log.lines().count(), 2);
        assert!(trade_log.lines().nth(1).unwrap().starts_with("AAA,2024-01-06"));

        let indicators = std::fs::read_to_string(paths.indicators.unwrap()).unwrap();
        assert_eq!(indicators.lines().count(), 17);
    }

    #[test]
    fn rsi_gate_is_visible_on_the_crossover_bar() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "AAA.csv", &closes_csv(&BOUNCE_CLOSES));

        let loaded = load_all(&[path], 1, &[]).unwrap();
        let output = Pipeline::new(bounce_params()).run(&loaded.frames);

        let bar = &output.rows[5];
        assert!(bar.dma_cross_up);
        assert!(bar.buy_signal);
        assert_relative_eq!(bar.rsi.unwrap(), 20.0, epsilon = 1e-9);

        //a threshold below the crossover's rsi removes the trade
        let strict = StrategyParams {
            rsi_buy_threshold: 20.0,
            ..bounce_params()
        };
        let output = Pipeline::new(strict).run(&loaded.frames);
        assert!(output.trades.is_empty());
        assert_eq!(output.summary, SummaryRecord::default());
    }

    #[test]
    fn symbol_filter_limits_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let flat = [10.0, 11.0, 12.0];
        let path = write_file(
            dir.path(),
            "bars.csv",
            &long_csv(&[("AAA", &BOUNCE_CLOSES), ("CCC", &flat)]),
        );

        let loaded = load_all(&[path], 1, &["CCC".to_string()]).unwrap();
        let output = Pipeline::new(bounce_params()).run(&loaded.frames);

        assert_eq!(output.rows.len(), 3);
        assert!(output.trades.is_empty());
    }
}

mod composition {
    use super::*;

    #[test]
    fn buy_signal_column_adds_trades() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "bars.csv",
            "DATETIME,SYMBOL,CLOSE,BUY_SIGNAL_MANUAL\n\
             2024-01-01,XYZ,100,false\n\
             2024-01-02,XYZ,90,true\n\
             2024-01-03,XYZ,110,false\n",
        );

        let loaded = load_all(&[path], 1, &[]).unwrap();
        let mut pipeline = Pipeline::new(StrategyParams::default());
        for signal in loaded.signals {
            pipeline = pipeline.with_provider(Box::new(signal));
        }
        let output = pipeline.run(&loaded.frames);

        assert_eq!(output.trades.len(), 1);
        assert_eq!(output.trades[0].entry_price, 90.0);
        assert_eq!(output.trades[0].exit_price, 110.0);
        assert_eq!(
            output.rows[1].aux_signals.get("BUY_SIGNAL_MANUAL"),
            Some(&true)
        );
    }

    #[test]
    fn overlapping_signals_share_the_last_close() {
        let frame = RawFrame::new("OVL")
            .with_column("DATETIME", &["2024-01-01", "2024-01-02", "2024-01-03"])
            .with_column("CLOSE", &["50", "40", "60"]);

        struct EveryBar;
        impl SignalProvider for EveryBar {
            fn name(&self) -> &str {
                "every_bar"
            }
            fn evaluate(&self, _symbol: &str, rows: &[IndicatorRow]) -> Vec<bool> {
                vec![true; rows.len()]
            }
        }

        let output = Pipeline::new(StrategyParams::default())
            .with_provider(Box::new(EveryBar))
            .run(&[frame]);

        assert_eq!(output.trades.len(), 3);
        assert!(output.trades.iter().all(|t| t.exit_price == 60.0));
        let entries: Vec<f64> = output.trades.iter().map(|t| t.entry_price).collect();
        assert_eq!(entries, vec![50.0, 40.0, 60.0]);

        //20% + 50% + 0%
        assert_eq!(output.summary.win_count, 2);
        assert_relative_eq!(output.summary.total_pnl_pct, 70.0);
        assert_relative_eq!(output.summary.avg_pnl_pct, 70.0 / 3.0);
    }

    #[test]
    fn repeated_timestamp_skips_only_that_symbol() {
        let dup = RawFrame::new("DUP")
            .with_column(
                "DATETIME",
                &["2024-01-01", "2024-01-02", "2024-01-02", "2024-01-03"],
            )
            .with_column("CLOSE", &["10", "11", "12", "13"]);
        let ok = RawFrame::new("OK")
            .with_column("DATETIME", &["2024-01-01", "2024-01-02"])
            .with_column("CLOSE", &["10", "11"]);

        let mut ext = ExternalSignal::new("BUY_SIGNAL_EXT");
        for day in 1..=3 {
            let ts = format!("2024-01-0{}T00:00:00Z", day).parse().unwrap();
            ext.flag("DUP", ts);
            ext.flag("OK", ts);
        }

        let output = Pipeline::new(StrategyParams::default())
            .with_provider(Box::new(ext))
            .run(&[dup, ok]);

        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].symbol, "DUP");
        assert!(output.skipped[0].reason.contains("row 3"));
        assert_eq!(output.symbol_count(), 1);
        assert_eq!(output.trades.len(), 2);
        assert!(output.trades.iter().all(|t| t.symbol == "OK"));
    }
}

mod determinism {
    use super::*;

    #[test]
    fn repeated_runs_are_identical() {
        let frames: Vec<RawFrame> = (0..12)
            .map(|s| {
                let dates: Vec<String> = (0..90)
                    .map(|i| format!("2024-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
                    .collect();
                let closes: Vec<f64> = (0..90)
                    .map(|i| 100.0 + (((i * (s + 3)) % 17) as f64 - 8.0) * 1.5)
                    .collect();
                RawFrame::new(format!("S{:02}", s))
                    .with_column("DATETIME", &dates)
                    .with_column("CLOSE", &closes)
            })
            .collect();

        let params = StrategyParams {
            rsi_period: 5,
            short_dma: 3,
            long_dma: 8,
            rsi_buy_threshold: 60.0,
        };

        let first = Pipeline::new(params.clone()).run(&frames);
        let second = Pipeline::new(params).run(&frames);

        assert_eq!(first.trades, second.trades);
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.rows, second.rows);
    }
}

mod config_file {
    use super::*;

    #[test]
    fn json_config_drives_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let data = write_file(dir.path(), "AAA.csv", &closes_csv(&BOUNCE_CLOSES));
        let config_path = write_file(
            dir.path(),
            "config.json",
            &format!(
                r#"{{
                    "data": {{ "paths": [{:?}] }},
                    "strategy": {{ "rsi_period": 4, "short_dma": 1, "long_dma": 3, "rsi_buy_threshold": 50 }}
                }}"#,
                data
            ),
        );

        let config = RunConfig::from_json_file(&config_path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.strategy, bounce_params());

        let loaded = load_all(&config.data.paths, config.data.header_rows, &config.data.symbols).unwrap();
        let output = Pipeline::new(config.strategy).run(&loaded.frames);
        assert_eq!(output.trades.len(), 1);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "strategy": { "rsi_buy_threshold": 150 } }"#).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange(150.0))
        );
    }
}
