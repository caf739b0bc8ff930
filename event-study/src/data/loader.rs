//! CSV loader for daily price files.
//!
//! Two layouts are accepted and normalized into the same [`PriceSeries`]:
//!
//! - **Standard**: a single header row containing `Date`, `Open`, `High`,
//!   `Low`, `Close` (or `Adj Close`) and `Volume`, optionally `Ticker`.
//! - **Multi-index**: three header rows as written by common market-data
//!   downloaders, followed by `Date,Close,High,Low,Open,Volume` rows:
//!
//! ```text
//! Price,Close,High,Low,Open,Volume
//! Ticker,AMD,AMD,AMD,AMD,AMD
//! Date,,,,,
//! 2020-01-02,49.1,49.25,46.63,46.86,80331100
//! ```
//!
//! The standard parser runs first. Any failure falls back to the
//! multi-index parser, whose error is the one reported.

use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{PriceBar, PriceSeries};

/// Header rows preceding data in the multi-index layout.
pub const MULTI_INDEX_HEADER_ROWS: usize = 3;

/// Column order of multi-index data rows.
pub const MULTI_INDEX_COLUMNS: &[&str] = &["Date", "Close", "High", "Low", "Open", "Volume"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid date '{value}' on row {row}")]
    InvalidDate { value: String, row: usize },

    #[error("No price rows found")]
    Empty,
}

/// On-disk layout of a price CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CsvLayout {
    Standard,
    MultiIndex,
}

impl CsvLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MultiIndex => "multi-index",
        }
    }
}

/// Load a ticker's price file.
///
/// The ticker label is taken from a `Ticker` column when the standard
/// layout has one, then from `fallback_ticker`, then from the file name
/// (`AMD_stock_2020_2025.csv` → `AMD`).
pub fn load_ticker(
    path: impl AsRef<Path>,
    fallback_ticker: Option<&str>,
) -> Result<PriceSeries, LoaderError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let ticker = match fallback_ticker {
        Some(t) => t.to_string(),
        None => ticker_from_path(path),
    };

    let (series, layout) = parse_prices_with_layout(&content, &ticker)?;
    debug!(
        "Loaded {} ({} layout, {} sessions) from {}",
        series.ticker(),
        layout.as_str(),
        series.len(),
        path.display()
    );
    Ok(series)
}

/// Derive a ticker from a file name: first `_`-separated token of the stem, uppercased.
pub fn ticker_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy())
        .and_then(|stem| stem.split('_').next().map(str::to_uppercase))
        .unwrap_or_default()
}

/// Parse CSV text in either layout.
pub fn parse_prices(content: &str, default_ticker: &str) -> Result<PriceSeries, LoaderError> {
    parse_prices_with_layout(content, default_ticker).map(|(series, _)| series)
}

/// Parse CSV text in either layout, reporting which one matched.
pub fn parse_prices_with_layout(
    content: &str,
    default_ticker: &str,
) -> Result<(PriceSeries, CsvLayout), LoaderError> {
    match parse_standard(content, default_ticker) {
        Ok(series) => Ok((series, CsvLayout::Standard)),
        Err(e) => {
            debug!("Standard layout rejected ({}), trying multi-index", e);
            let series = parse_multi_index(content, default_ticker)?;
            Ok((series, CsvLayout::MultiIndex))
        }
    }
}

/// Column positions resolved from a standard header row.
struct StandardColumns {
    date: usize,
    ticker: Option<usize>,
    open: usize,
    high: usize,
    low: usize,
    price: usize,
    volume: usize,
}

impl StandardColumns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoaderError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require =
            |name: &str| find(name).ok_or_else(|| LoaderError::MissingColumn(name.to_string()));

        let price = find("Adj Close")
            .or_else(|| find("Close"))
            .ok_or_else(|| LoaderError::MissingColumn("Close".to_string()))?;

        Ok(Self {
            date: require("Date")?,
            ticker: find("Ticker"),
            open: require("Open")?,
            high: require("High")?,
            low: require("Low")?,
            price,
            volume: require("Volume")?,
        })
    }
}

fn parse_standard(content: &str, default_ticker: &str) -> Result<PriceSeries, LoaderError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let columns = StandardColumns::resolve(reader.headers()?)?;

    let mut ticker: Option<String> = None;
    let mut bars = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        if ticker.is_none() {
            ticker = columns
                .ticker
                .map(field)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
        }

        bars.push(PriceBar {
            date: parse_session_date(field(columns.date), row)?,
            open: parse_number(field(columns.open)),
            high: parse_number(field(columns.high)),
            low: parse_number(field(columns.low)),
            price: parse_number(field(columns.price)),
            volume: parse_number(field(columns.volume)),
        });
    }

    let ticker = ticker.unwrap_or_else(|| default_ticker.to_string());
    Ok(PriceSeries::new(ticker, bars))
}

fn parse_multi_index(content: &str, ticker: &str) -> Result<PriceSeries, LoaderError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut bars = Vec::new();

    for (row, result) in reader
        .records()
        .enumerate()
        .skip(MULTI_INDEX_HEADER_ROWS)
    {
        let record = result?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        bars.push(PriceBar {
            date: parse_session_date(field(0), row)?,
            price: parse_number(field(1)),
            high: parse_number(field(2)),
            low: parse_number(field(3)),
            open: parse_number(field(4)),
            volume: parse_number(field(5)),
        });
    }

    if bars.is_empty() {
        return Err(LoaderError::Empty);
    }

    let series = PriceSeries::new(ticker, bars);
    let missing = series
        .bars()
        .iter()
        .filter(|b| !b.price.is_finite())
        .count();
    if missing > 0 {
        warn!("{}: {} rows without a usable close", ticker, missing);
    }
    Ok(series)
}

/// Parse a session date, ignoring any time-of-day suffix.
fn parse_session_date(value: &str, row: usize) -> Result<NaiveDate, LoaderError> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .map_err(|_| LoaderError::InvalidDate {
            value: value.to_string(),
            row,
        })
}

/// Numeric cells that fail to parse become NaN.
fn parse_number(value: &str) -> f64 {
    value.parse().unwrap_or(f64::NAN)
}
