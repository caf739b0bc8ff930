//! Event-study report generation.
//!
//! Runs the study loop:
//! 1. Load every configured price file
//! 2. For each event, extract return windows per ticker
//! 3. Skip events with no nearby data
//! 4. Render the event chart
//! 5. Accumulate horizon returns per ticker
//! 6. Write the summary CSV

pub mod chart;
pub mod summary;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::StudyConfig;
use crate::data::{load_ticker, Event, LoaderError, PriceSeries};
use crate::study::{horizon_returns, window_returns, WindowedReturns};

pub use chart::{render_event_chart, ChartError};
pub use summary::{format_summary_table, write_summary, SummaryRow};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to load {path}: {source}")]
    Load { path: String, source: LoaderError },

    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Windows and summary rows for one event.
#[derive(Debug, Clone)]
pub struct EventAnalysis {
    pub event: Event,
    /// `(ticker, window)` in ticker order; windows may be empty.
    pub windows: Vec<(String, WindowedReturns)>,
    pub rows: Vec<SummaryRow>,
}

impl EventAnalysis {
    /// True when at least one ticker has a finite return around the event.
    pub fn has_data(&self) -> bool {
        self.windows.iter().any(|(_, w)| w.value_range().is_some())
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default)]
pub struct EventStudyReport {
    pub charts: Vec<PathBuf>,
    pub skipped: Vec<Event>,
    pub rows: Vec<SummaryRow>,
    pub summary_path: PathBuf,
}

/// Event study over a fixed set of price series.
pub struct EventStudy {
    config: StudyConfig,
    series: Vec<PriceSeries>,
}

impl EventStudy {
    pub fn new(config: StudyConfig, series: Vec<PriceSeries>) -> Self {
        Self { config, series }
    }

    /// Load every configured ticker file.
    ///
    /// Series are labelled with the configured ticker, whatever the file's
    /// own `Ticker` column says.
    pub fn load(config: StudyConfig) -> Result<Self, ReportError> {
        let mut series = Vec::with_capacity(config.tickers.len());
        for ticker in &config.tickers {
            let loaded = load_ticker(&ticker.path, Some(ticker.ticker.as_str()))
                .map_err(|e| ReportError::Load {
                    path: ticker.path.display().to_string(),
                    source: e,
                })?
                .with_ticker(ticker.ticker.as_str());
            info!(
                "Loaded {}: {} sessions ({} to {})",
                loaded.ticker(),
                loaded.len(),
                loaded.first_date().map(|d| d.to_string()).unwrap_or("?".into()),
                loaded.last_date().map(|d| d.to_string()).unwrap_or("?".into())
            );
            series.push(loaded);
        }
        Ok(Self::new(config, series))
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    /// Windows and horizon returns of every ticker for one event.
    pub fn analyze_event(&self, event: &Event) -> EventAnalysis {
        let mut windows = Vec::with_capacity(self.series.len());
        let mut rows = Vec::with_capacity(self.series.len());

        for series in &self.series {
            windows.push((
                series.ticker().to_string(),
                window_returns(series, event.date, self.config.window),
            ));
            rows.push(SummaryRow {
                event: event.label.clone(),
                event_date: event.date,
                ticker: series.ticker().to_string(),
                returns: horizon_returns(series, event.date, &self.config.horizons),
            });
        }

        EventAnalysis {
            event: event.clone(),
            windows,
            rows,
        }
    }

    /// Run every event, write charts and the summary CSV.
    pub fn run(&self) -> Result<EventStudyReport, ReportError> {
        fs::create_dir_all(&self.config.output_dir)?;

        let mut report = EventStudyReport {
            summary_path: self.config.summary_path(),
            ..Default::default()
        };

        for event in &self.config.events {
            let analysis = self.analyze_event(event);

            if !analysis.has_data() {
                warn!("No data near event '{}' ({})", event.label, event.date);
                report.skipped.push(event.clone());
                continue;
            }

            if self.config.charts {
                let path = self.config.output_dir.join(event.chart_file_name());
                render_event_chart(&path, event, &analysis.windows)?;
                info!("Chart saved: {}", path.display());
                report.charts.push(path);
            }

            report.rows.extend(analysis.rows);
        }

        let file = fs::File::create(&report.summary_path)?;
        write_summary(file, &self.config.horizons, &report.rows)?;
        info!(
            "Summary written: {} ({} rows)",
            report.summary_path.display(),
            report.rows.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TickerSource;
    use crate::data::types::tests::{bar, date, sample_series};
    use crate::data::{save_prices, CsvLayout};

    fn config(dir: &std::path::Path) -> StudyConfig {
        StudyConfig {
            output_dir: dir.join("charts"),
            charts: false,
            events: vec![
                Event::new("Before everything", date("2020-06-01")),
                Event::new("Monday session", date("2024-01-08")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_run_skips_events_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let study = EventStudy::new(config(dir.path()), vec![sample_series()]);

        let report = study.run().unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].label, "Before everything");
        assert_eq!(report.rows.len(), 1);
        assert!(report.charts.is_empty());

        let summary = fs::read_to_string(&report.summary_path).unwrap();
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Monday session,2024-01-08,TEST,"));
        // Only two sessions follow the event: H+5 and H+20 are empty.
        assert!(lines[1].ends_with(",,"));
    }

    #[test]
    fn test_rows_cover_tickers_without_nearby_data() {
        let dir = tempfile::tempdir().unwrap();
        let late = PriceSeries::new("LATE", vec![bar("2025-01-02", 1.0)]);
        let study = EventStudy::new(config(dir.path()), vec![sample_series(), late]);

        let analysis = study.analyze_event(&Event::new("Monday session", date("2024-01-08")));
        assert!(analysis.has_data());
        assert_eq!(analysis.rows.len(), 2);
        assert!(analysis.windows[1].1.is_empty());
        assert!(analysis.rows[1].returns.iter().all(|r| r.pct.is_none()));
    }

    #[test]
    fn test_all_nan_window_skips_event_and_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let gappy = PriceSeries::new(
            "GAP",
            vec![bar("2023-01-03", 100.0), bar("2024-03-04", f64::NAN), bar("2025-06-02", 100.0)],
        );
        let cfg = StudyConfig {
            output_dir: dir.path().join("charts"),
            charts: true,
            events: vec![Event::new("Gap event", date("2024-03-04"))],
            ..Default::default()
        };
        let study = EventStudy::new(cfg, vec![gappy]);

        let analysis = study.analyze_event(&study.config().events[0]);
        assert_eq!(analysis.windows[0].1.len(), 1);
        assert!(!analysis.has_data());

        let report = study.run().unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert!(report.charts.is_empty());
        assert!(report.rows.is_empty());
        assert!(report.summary_path.exists());
    }

    #[test]
    fn test_configured_ticker_labels_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Nvidia_stock_data.csv");
        let csv = "Date,Ticker,Open,High,Low,Close,Volume\n\
                   2024-01-05,NVIDIA,1,1,1,100,10\n\
                   2024-01-08,NVIDIA,1,1,1,110,10\n";
        fs::write(&path, csv).unwrap();

        let mut cfg = config(dir.path());
        cfg.tickers = vec![TickerSource {
            ticker: "NVDA".to_string(),
            path,
        }];
        let study = EventStudy::load(cfg).unwrap();
        assert_eq!(study.series()[0].ticker(), "NVDA");

        let report = study.run().unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].ticker, "NVDA");

        let analysis = study.analyze_event(&Event::new("Monday session", date("2024-01-08")));
        assert_eq!(analysis.windows[0].0, "NVDA");
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST_stock_2024_2024.csv");
        save_prices(&path, &sample_series(), CsvLayout::MultiIndex).unwrap();

        let mut cfg = config(dir.path());
        cfg.tickers = vec![TickerSource {
            ticker: "TST".to_string(),
            path,
        }];
        let study = EventStudy::load(cfg).unwrap();
        assert_eq!(study.series()[0].ticker(), "TST");

        cfg = config(dir.path());
        cfg.tickers = vec![TickerSource::new("MISSING", "missing.csv")];
        assert!(matches!(EventStudy::load(cfg), Err(ReportError::Load { .. })));
    }
}
