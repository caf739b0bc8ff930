//! Yahoo Finance chart API client for daily bars.
//!
//! One request per symbol covers the whole date range. Requests are
//! issued one at a time and are not retried.

use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::types::{PriceBar, PriceSeries};

/// Chart API base URL.
const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// The chart endpoint rejects requests without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Error, Debug)]
pub enum YahooError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No data available for {0}")]
    NoData(String),
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: Option<String>,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteColumns>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance client.
pub struct YahooClient {
    client: Client,
    base_url: String,
    request_count: u64,
}

impl YahooClient {
    pub fn new() -> Result<Self, YahooError> {
        Self::with_base_url(BASE_URL)
    }

    /// Client pointed at a different chart endpoint.
    pub fn with_base_url(base_url: &str) -> Result<Self, YahooError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_count: 0,
        })
    }

    /// Get request count for monitoring.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Daily bars for `symbol` from `start` (inclusive) to `end` (exclusive).
    ///
    /// With `adjust`, open/high/low/close are scaled by the split and
    /// dividend adjustment factor so `price` is the adjusted close.
    pub async fn daily_bars(
        &mut self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        adjust: bool,
    ) -> Result<PriceSeries, YahooError> {
        let url = format!("{}/{}", self.base_url, symbol);
        let params = [
            ("period1", unix_seconds(start).to_string()),
            ("period2", unix_seconds(end).to_string()),
            ("interval", "1d".to_string()),
            ("events", "div,splits".to_string()),
        ];

        let response = self.client.get(&url).query(&params).send().await?;
        self.request_count += 1;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(YahooError::Api(format!("{}: {}", status, text)));
        }

        parse_chart(symbol, &text, adjust)
    }
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Convert a chart API payload into a price series.
///
/// Rows missing any of open/high/low/close/volume are dropped.
pub(crate) fn parse_chart(symbol: &str, json: &str, adjust: bool) -> Result<PriceSeries, YahooError> {
    let response: ChartResponse = serde_json::from_str(json)
        .map_err(|e| YahooError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = response.chart.error {
        return Err(YahooError::Api(format!("{}: {}", error.code, error.description)));
    }

    let results = response
        .chart
        .result
        .ok_or_else(|| YahooError::NoData(symbol.to_string()))?;
    let data = results
        .first()
        .ok_or_else(|| YahooError::NoData(symbol.to_string()))?;
    let quote = data
        .indicators
        .quote
        .first()
        .ok_or_else(|| YahooError::NoData(symbol.to_string()))?;
    let adj_close = data
        .indicators
        .adjclose
        .as_ref()
        .and_then(|a| a.first())
        .map(|a| a.adjclose.as_slice())
        .unwrap_or(&[]);

    let mut bars = Vec::with_capacity(data.timestamp.len());
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let fields = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
            continue;
        };

        let Some(date) = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0).map(|dt| dt.date_naive())
        else {
            continue;
        };

        let factor = if adjust {
            value_at(adj_close, i)
                .filter(|_| close != 0.0)
                .map(|adj| adj / close)
                .unwrap_or(1.0)
        } else {
            1.0
        };

        bars.push(PriceBar {
            date,
            open: open * factor,
            high: high * factor,
            low: low * factor,
            price: close * factor,
            volume,
        });
    }

    if bars.is_empty() {
        return Err(YahooError::NoData(symbol.to_string()));
    }

    let ticker = data.meta.symbol.clone().unwrap_or_else(|| symbol.to_string());
    debug!("Parsed {} daily bars for {}", bars.len(), ticker);
    Ok(PriceSeries::new(ticker, bars))
}
