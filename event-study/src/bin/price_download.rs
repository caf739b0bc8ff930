//! Daily Price Downloader
//!
//! Downloads daily OHLCV bars from Yahoo Finance and writes one CSV per
//! ticker, ready for `event-study run`.
//!
//! # Usage
//!
//! ```bash
//! # Download the default tickers (AMD, INTC) for 2020-01-01 .. 2025-08-18
//! price-download download
//!
//! # Download other tickers into a data directory
//! price-download --data-dir data download --tickers NVDA,TSM --start 2021-01-01
//!
//! # Write the single-header layout instead of the multi-index one
//! price-download download --layout standard
//!
//! # Check the downloaded files
//! price-download validate --tickers AMD,INTC
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use event_study::data::{load_ticker, save_prices, CsvLayout, YahooClient};

const SEPARATOR: &str = "============================================================";

/// Daily price downloader CLI.
#[derive(Parser)]
#[command(name = "price-download")]
#[command(about = "Download daily stock prices from Yahoo Finance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data output directory
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily bars
    Download {
        /// Comma-separated list of tickers
        #[arg(long, default_value = "AMD,INTC")]
        tickers: String,

        /// Start date (YYYY-MM-DD), inclusive
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// End date (YYYY-MM-DD), exclusive
        #[arg(long, default_value = "2025-08-18")]
        end: String,

        /// CSV layout to write
        #[arg(long, value_enum, default_value_t = CsvLayout::MultiIndex)]
        layout: CsvLayout,

        /// Keep raw prices instead of split/dividend adjusted ones
        #[arg(long)]
        raw: bool,
    },

    /// Load downloaded files and summarize them
    Validate {
        /// Comma-separated list of tickers
        #[arg(long, default_value = "AMD,INTC")]
        tickers: String,

        /// Start date used for the download
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// End date used for the download
        #[arg(long, default_value = "2025-08-18")]
        end: String,
    },
}

/// Output file for a ticker, e.g. `AMD_stock_2020_2025.csv`.
fn output_path(data_dir: &Path, ticker: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
    data_dir.join(format!(
        "{}_stock_{}_{}.csv",
        ticker.to_uppercase(),
        start.year(),
        end.year()
    ))
}

fn parse_date(value: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format: {}", what, value))
}

fn parse_tickers(tickers: &str) -> Vec<&str> {
    tickers
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn cmd_download(
    data_dir: &Path,
    tickers: Vec<&str>,
    start: NaiveDate,
    end: NaiveDate,
    layout: CsvLayout,
    adjust: bool,
) -> Result<()> {
    let mut client = YahooClient::new()?;

    println!("\nDownload Plan:");
    println!("  Tickers: {:?}", tickers);
    println!("  Date range: {} to {} (exclusive)", start, end);
    println!("  Adjusted: {}", adjust);
    println!("  Layout: {}", layout.as_str());
    println!();

    let start_time = Instant::now();

    let pb = ProgressBar::new(tickers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut written = Vec::new();
    for ticker in &tickers {
        pb.set_message(ticker.to_string());

        let series = client
            .daily_bars(ticker, start, end, adjust)
            .await
            .with_context(|| format!("Failed to download {}", ticker))?;

        let path = output_path(data_dir, ticker, start, end);
        save_prices(&path, &series, layout)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        written.push((path, series.len()));
        pb.inc(1);
    }
    pb.finish_with_message("complete");

    println!("\nDownload Complete!");
    for (path, rows) in &written {
        println!("  {} ({} sessions)", path.display(), rows);
    }
    println!("  Requests: {}", client.request_count());
    println!("  Elapsed time: {:.1} seconds", start_time.elapsed().as_secs_f64());

    Ok(())
}

fn cmd_validate(data_dir: &Path, tickers: Vec<&str>, start: NaiveDate, end: NaiveDate) -> Result<()> {
    println!("{}", SEPARATOR);
    println!("Validating downloaded data");
    println!("{}", SEPARATOR);

    for ticker in &tickers {
        let path = output_path(data_dir, ticker, start, end);
        if !path.exists() {
            println!("{}: No data found ({})", ticker, path.display());
            continue;
        }

        let series = match load_ticker(&path, Some(*ticker)) {
            Ok(series) => series,
            Err(e) => {
                warn!("{}: failed to load {}: {}", ticker, path.display(), e);
                continue;
            }
        };

        let missing = series.bars().iter().filter(|b| !b.price.is_finite()).count();
        let max_gap = series
            .bars()
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .max()
            .unwrap_or(0);

        println!("{}:", ticker);
        println!("  File: {}", path.display());
        println!("  Sessions: {}", series.len());
        println!(
            "  Date range: {} to {}",
            series.first_date().map(|d| d.to_string()).unwrap_or("?".into()),
            series.last_date().map(|d| d.to_string()).unwrap_or("?".into())
        );
        println!("  Missing prices: {}", missing);
        println!("  Longest calendar gap: {} days", max_gap);
        println!();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_study=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    fs::create_dir_all(&cli.data_dir)?;

    match cli.command {
        Commands::Download {
            tickers,
            start,
            end,
            layout,
            raw,
        } => {
            let start_date = parse_date(&start, "start")?;
            let end_date = parse_date(&end, "end")?;
            cmd_download(
                &cli.data_dir,
                parse_tickers(&tickers),
                start_date,
                end_date,
                layout,
                !raw,
            )
            .await?;
        }
        Commands::Validate { tickers, start, end } => {
            let start_date = parse_date(&start, "start")?;
            let end_date = parse_date(&end, "end")?;
            cmd_validate(&cli.data_dir, parse_tickers(&tickers), start_date, end_date)?;
        }
    }

    Ok(())
}
