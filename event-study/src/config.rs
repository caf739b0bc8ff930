//! Study configuration.
//!
//! The built-in defaults reproduce the standard NVDA/AMD/INTC study over
//! the generative-AI milestones. A TOML file can override any subset:
//!
//! ```toml
//! output_dir = "charts"
//! horizons = [1, 5, 20, 60]
//!
//! [window]
//! sessions_before = 5
//! sessions_after = 20
//!
//! [[events]]
//! label = "GPT-4 launch"
//! date = "2023-03-14"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Event;
use crate::study::{WindowSpec, DEFAULT_HORIZONS};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// A ticker and the CSV holding its prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSource {
    pub ticker: String,
    pub path: PathBuf,
}

impl TickerSource {
    pub fn new(ticker: &str, path: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            path: PathBuf::from(path),
        }
    }
}

/// Configuration for one event-study run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Directory receiving charts and the summary CSV.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Sessions shown around each event.
    #[serde(default)]
    pub window: WindowSpec,

    /// Horizons, in sessions, for the summary table.
    #[serde(default = "default_horizons")]
    pub horizons: Vec<usize>,

    /// Render PNG charts (the summary is always written).
    #[serde(default = "default_true")]
    pub charts: bool,

    /// Price files, in legend order.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<TickerSource>,

    /// Events to study, in report order.
    #[serde(default = "default_events")]
    pub events: Vec<Event>,
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("event_charts")
}

fn default_horizons() -> Vec<usize> {
    DEFAULT_HORIZONS.to_vec()
}

fn default_tickers() -> Vec<TickerSource> {
    vec![
        TickerSource::new("NVDA", "Nvidia_stock_data.csv"),
        TickerSource::new("AMD", "AMD_stock_2020_2025.csv"),
        TickerSource::new("INTC", "INTC_stock_2020_2025.csv"),
    ]
}

fn default_events() -> Vec<Event> {
    // Month-only milestones are pinned to the first of the month.
    [
        ("GPT-3 launch", (2020, 6, 1)),
        ("Microsoft exclusive GPT-3 license", (2021, 9, 1)),
        ("ChatGPT launch", (2022, 11, 30)),
        ("Microsoft invests $10B in OpenAI", (2023, 1, 1)),
        ("GPT-4 launch", (2023, 3, 14)),
        ("ChatGPT integration in Bing/Office/Azure", (2023, 5, 1)),
        ("GPT-4o launch", (2024, 5, 13)),
    ]
    .into_iter()
    .filter_map(|(label, (y, m, d))| NaiveDate::from_ymd_opt(y, m, d).map(|date| Event::new(label, date)))
    .collect()
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            window: WindowSpec::default(),
            horizons: default_horizons(),
            charts: true,
            tickers: default_tickers(),
            events: default_events(),
        }
    }
}

impl StudyConfig {
    /// Load from a TOML file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::Invalid("no tickers configured".to_string()));
        }
        if self.events.is_empty() {
            return Err(ConfigError::Invalid("no events configured".to_string()));
        }
        if self.horizons.is_empty() {
            return Err(ConfigError::Invalid("no horizons configured".to_string()));
        }
        Ok(())
    }

    /// Path of the summary CSV inside the output directory.
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join("event_horizon_returns_summary.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_study() {
        let config = StudyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.events.len(), 7);
        assert_eq!(config.horizons, vec![1, 5, 20]);
        assert_eq!(config.window.sessions_before, 10);
        assert_eq!(config.window.sessions_after, 30);
        let tickers: Vec<_> = config.tickers.iter().map(|t| t.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["NVDA", "AMD", "INTC"]);
        assert_eq!(
            config.summary_path(),
            PathBuf::from("event_charts/event_horizon_returns_summary.csv")
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StudyConfig::from_toml(
            r#"
            output_dir = "out"
            horizons = [1, 60]

            [[events]]
            label = "GPT-4 launch"
            date = "2023-03-14"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.horizons, vec![1, 60]);
        assert_eq!(config.events.len(), 1);
        assert_eq!(config.events[0].date, NaiveDate::from_ymd_opt(2023, 3, 14).unwrap());
        assert_eq!(config.tickers.len(), 3);
        assert!(config.charts);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(matches!(
            StudyConfig::from_toml("horizons = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StudyConfig::from_toml("tickers = []"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StudyConfig::from_toml("horizons = \"one\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
