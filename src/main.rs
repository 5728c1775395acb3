use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use minialgo::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minialgo")]
#[command(about = "RSI + moving-average crossover signals with a mark-to-market backtest", long_about = None)]
struct Cli {
    //log level filter, MINIALGO_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    //log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run indicators, signals and the backtest
    Run {
        //path to a json config file
        #[arg(long)]
        config: Option<PathBuf>,

        //csv files with bars (repeatable, overrides config paths)
        #[arg(long)]
        data: Vec<PathBuf>,

        //symbols to keep (repeatable, overrides config symbols)
        #[arg(long)]
        symbol: Vec<String>,

        //number of header rows in the csv files
        #[arg(long)]
        header_rows: Option<usize>,

        //strategy parameters
        //rsi lookback period
        #[arg(long)]
        rsi_period: Option<usize>,

        //short moving average window
        #[arg(long)]
        short_dma: Option<usize>,

        //long moving average window
        #[arg(long)]
        long_dma: Option<usize>,

        //buy only when rsi is below this value
        #[arg(long)]
        rsi_buy_threshold: Option<f64>,

        //output options
        //directory for trade_log.csv, summary.csv and indicators.csv
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        //skip writing indicators.csv
        #[arg(long)]
        no_indicators: bool,
    },

    //write a config file with default values
    InitConfig {
        //where to write the config
        #[arg(long, default_value = "config.json")]
        output: PathBuf,
    },
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var("MINIALGO_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow::anyhow!("invalid log filter: {}", err))?;

    let format = log_format.trim().to_lowercase();
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            header_rows,
            rsi_period,
            short_dma,
            long_dma,
            rsi_buy_threshold,
            reports_dir,
            no_indicators,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::from_json_file(&path)?,
                None => RunConfig::default(),
            };

            //command line values win over the config file
            if !data.is_empty() {
                run_config.data.paths = data;
            }
            if !symbol.is_empty() {
                run_config.data.symbols = symbol;
            }
            if let Some(v) = header_rows {
                run_config.data.header_rows = v;
            }
            if let Some(v) = rsi_period {
                run_config.strategy.rsi_period = v;
            }
            if let Some(v) = short_dma {
                run_config.strategy.short_dma = v;
            }
            if let Some(v) = long_dma {
                run_config.strategy.long_dma = v;
            }
            if let Some(v) = rsi_buy_threshold {
                run_config.strategy.rsi_buy_threshold = v;
            }
            if let Some(v) = reports_dir {
                run_config.output.reports_dir = v;
            }
            if no_indicators {
                run_config.output.write_indicators = false;
            }

            run(run_config)?;
        }
        Commands::InitConfig { output } => {
            RunConfig::default().to_json_file(&output)?;
            println!("Default config written to {:?}", output);
        }
    }

    Ok(())
}

fn run(config: RunConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    if !config.strategy.windows_ordered() {
        tracing::warn!(
            short_dma = config.strategy.short_dma,
            long_dma = config.strategy.long_dma,
            "short_dma is not below long_dma"
        );
    }

    if config.data.paths.is_empty() {
        anyhow::bail!("No data files given (use --data or data.paths in the config)");
    }

    let loaded = load_all(
        &config.data.paths,
        config.data.header_rows,
        &config.data.symbols,
    )?;

    if loaded.frames.is_empty() {
        anyhow::bail!("No data loaded.");
    }

    let mut pipeline = Pipeline::new(config.strategy.clone());
    for signal in loaded.signals {
        tracing::info!(
            signal = signal.name(),
            flagged = signal.flagged_count(),
            "using external buy signal"
        );
        pipeline = pipeline.with_provider(Box::new(signal));
    }

    let output = pipeline.run(&loaded.frames);

    for skipped in &output.skipped {
        eprintln!("Skipped {}: {}", skipped.symbol, skipped.reason);
    }

    println!("Backtest Results");
    println!("================\n");
    output.summary.pretty_print_table();
    println!("\n{}", output.summary.headline());

    let paths = write_reports(
        &output,
        &config.output.reports_dir,
        config.output.write_indicators,
    )?;

    if let Some(indicators) = &paths.indicators {
        println!("\nIndicators saved to {:?}", indicators);
    }
    println!("Trades saved to {:?}", paths.trades);
    println!("Summary saved to {:?}", paths.summary);

    Ok(())
}
