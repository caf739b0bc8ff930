//! # Run the study with the built-in events and tickers
//! event-study run
//!
//! # Run with a custom configuration, without charts
//! event-study run --config study.toml --no-charts
//!
//! # List configured events
//! event-study events --config study.toml
//!
//! # Check how a price file is read
//! event-study inspect --file AMD_stock_2020_2025.csv

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use event_study::data::{parse_prices_with_layout, ticker_from_path};
use event_study::report::format_summary_table;
use event_study::{EventStudy, StudyConfig};

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "event-study")]
#[command(about = "Normalized stock price moves around dated news events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load prices, render one chart per event and write the summary
    Run {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write the summary table
        #[arg(long)]
        no_charts: bool,
    },

    /// List the configured events
    Events {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load a price file and describe it
    Inspect {
        /// CSV file in standard or multi-index layout
        #[arg(short, long)]
        file: PathBuf,

        /// Ticker label (defaults to the file name prefix)
        #[arg(short, long)]
        ticker: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<StudyConfig> {
    match path {
        Some(p) => StudyConfig::from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(StudyConfig::default()),
    }
}

fn cmd_run(config: StudyConfig) -> Result<()> {
    let study = EventStudy::load(config).context("Failed to load price data")?;
    let config = study.config();

    println!("{}", SEPARATOR);
    println!("Event study");
    println!("{}", SEPARATOR);
    println!("  Tickers: {}", study.series().len());
    println!("  Events: {}", config.events.len());
    println!(
        "  Window: -{} / +{} sessions",
        config.window.sessions_before, config.window.sessions_after
    );
    println!("  Output: {}", config.output_dir.display());
    println!();

    let report = study.run().context("Event study failed")?;

    for event in &report.skipped {
        println!("No data near event '{}' ({}) in the price files.", event.label, event.date);
    }
    for chart in &report.charts {
        println!("Chart saved: {}", chart.display());
    }
    println!("Summary saved: {}", report.summary_path.display());
    println!();
    print!("{}", format_summary_table(&config.horizons, &report.rows));

    Ok(())
}

fn cmd_events(config: &StudyConfig) {
    for event in &config.events {
        println!("{}  {:<45} {}", event.date, event.label, event.slug());
    }
}

fn cmd_inspect(file: PathBuf, ticker: Option<String>) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let ticker = ticker.unwrap_or_else(|| ticker_from_path(&file));
    let (series, layout) = parse_prices_with_layout(&content, &ticker)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    println!("{}:", file.display());
    println!("  Ticker: {}", series.ticker());
    println!("  Layout: {}", layout.as_str());
    println!("  Sessions: {}", series.len());
    println!(
        "  Date range: {} to {}",
        series.first_date().map(|d| d.to_string()).unwrap_or("?".into()),
        series.last_date().map(|d| d.to_string()).unwrap_or("?".into())
    );
    let missing = series.bars().iter().filter(|b| !b.price.is_finite()).count();
    println!("  Missing prices: {}", missing);

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_study=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            no_charts,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            if no_charts {
                config.charts = false;
            }
            cmd_run(config)?;
        }
        Commands::Events { config } => {
            let config = load_config(config.as_ref())?;
            cmd_events(&config);
        }
        Commands::Inspect { file, ticker } => {
            cmd_inspect(file, ticker)?;
        }
    }

    Ok(())
}
