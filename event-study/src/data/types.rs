//! Core data types for event studies.
//!
//! A [`PriceSeries`] is one ticker's daily bars ordered by session date.
//! Dates are sparse: only trading sessions are present, so every lookup
//! that starts from a calendar date goes through a binary search over
//! the session dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily bar.
///
/// `price` is the adjusted close when the source provides one, otherwise
/// the raw close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: f64,
}

/// Daily bars for one ticker, sorted ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a series, sorting the bars by date.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    /// Same bars under another ticker label.
    pub fn with_ticker(self, ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..self
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// First session date, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    /// Last session date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Index of the first session on or after `date`.
    ///
    /// Equals `len()` when every session precedes `date`.
    pub fn first_session_on_or_after(&self, date: NaiveDate) -> usize {
        self.bars.partition_point(|b| b.date < date)
    }

    /// Sessions whose date falls in `[start, end]`.
    pub fn sessions_between(&self, start: NaiveDate, end: NaiveDate) -> &[PriceBar] {
        let lo = self.first_session_on_or_after(start);
        let hi = self.bars.partition_point(|b| b.date <= end);
        if lo >= hi {
            return &[];
        }
        &self.bars[lo..hi]
    }

    /// Price at the last session on or before `date`.
    ///
    /// Sessions with a non-finite price are skipped. Returns `None` when
    /// `date` precedes the series.
    pub fn baseline_price(&self, date: NaiveDate) -> Option<f64> {
        if self.first_date().map_or(true, |first| date < first) {
            return None;
        }
        let end = self.bars.partition_point(|b| b.date <= date);
        self.bars[..end]
            .iter()
            .rev()
            .map(|b| b.price)
            .find(|p| p.is_finite())
    }
}

/// A dated news event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub label: String,
    pub date: NaiveDate,
}

impl Event {
    pub fn new(label: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            date,
        }
    }

    /// Filesystem-friendly form of the label.
    pub fn slug(&self) -> String {
        self.label
            .to_lowercase()
            .chars()
            .map(|c| match c {
                ' ' | '/' => '-',
                'á' | 'à' | 'ä' | 'â' => 'a',
                'é' | 'è' | 'ë' | 'ê' => 'e',
                'í' | 'ì' | 'ï' | 'î' => 'i',
                'ó' | 'ò' | 'ö' | 'ô' => 'o',
                'ú' | 'ù' | 'ü' | 'û' => 'u',
                other => other,
            })
            .collect()
    }

    /// Chart file name: `event_<date>_<slug>.png`.
    pub fn chart_file_name(&self) -> String {
        format!("event_{}_{}.png", self.date.format("%Y-%m-%d"), self.slug())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn bar(d: &str, price: f64) -> PriceBar {
        PriceBar {
            date: date(d),
            open: price,
            high: price,
            low: price,
            price,
            volume: 1000.0,
        }
    }

    /// Thu 2024-01-04 .. Wed 2024-01-10, weekend removed.
    pub(crate) fn sample_series() -> PriceSeries {
        PriceSeries::new(
            "TEST",
            vec![
                bar("2024-01-08", 110.0),
                bar("2024-01-04", 100.0),
                bar("2024-01-05", 105.0),
                bar("2024-01-09", 99.0),
                bar("2024-01-10", 121.0),
            ],
        )
    }

    #[test]
    fn test_bars_sorted_on_construction() {
        let series = sample_series();
        let dates: Vec<_> = series.bars().iter().map(|b| b.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(series.first_date(), Some(date("2024-01-04")));
        assert_eq!(series.last_date(), Some(date("2024-01-10")));
    }

    #[test]
    fn test_baseline_on_trading_day_is_exact_close() {
        let series = sample_series();
        assert_eq!(series.baseline_price(date("2024-01-08")), Some(110.0));
    }

    #[test]
    fn test_baseline_on_weekend_uses_prior_session() {
        let series = sample_series();
        assert_eq!(series.baseline_price(date("2024-01-06")), Some(105.0));
        assert_eq!(series.baseline_price(date("2024-01-07")), Some(105.0));
    }

    #[test]
    fn test_baseline_before_series_is_none() {
        let series = sample_series();
        assert_eq!(series.baseline_price(date("2024-01-03")), None);
        assert_eq!(PriceSeries::default().baseline_price(date("2024-01-03")), None);
    }

    #[test]
    fn test_baseline_skips_missing_prices() {
        let mut bars = sample_series().bars().to_vec();
        bars[3].price = f64::NAN; // 2024-01-09
        let series = PriceSeries::new("TEST", bars);
        assert_eq!(series.baseline_price(date("2024-01-09")), Some(110.0));
    }

    #[test]
    fn test_baseline_after_series_uses_last_session() {
        let series = sample_series();
        assert_eq!(series.baseline_price(date("2024-03-01")), Some(121.0));
    }

    #[test]
    fn test_session_lookup() {
        let series = sample_series();
        assert_eq!(series.first_session_on_or_after(date("2024-01-06")), 2);
        assert_eq!(series.first_session_on_or_after(date("2024-01-04")), 0);
        assert_eq!(series.first_session_on_or_after(date("2024-02-01")), 5);

        let slice = series.sessions_between(date("2024-01-05"), date("2024-01-09"));
        assert_eq!(slice.len(), 3);
        assert!(series
            .sessions_between(date("2024-01-06"), date("2024-01-07"))
            .is_empty());
    }

    #[test]
    fn test_event_slug() {
        let event = Event::new("Integración ChatGPT en Bing/Office", date("2023-05-01"));
        assert_eq!(event.slug(), "integracion-chatgpt-en-bing-office");
        assert_eq!(
            event.chart_file_name(),
            "event_2023-05-01_integracion-chatgpt-en-bing-office.png"
        );
    }
}
