pub mod config;
pub mod data;
pub mod report;
pub mod study;

// Re-export commonly used types
pub use config::{ConfigError, StudyConfig, TickerSource};
pub use data::{load_ticker, CsvLayout, Event, LoaderError, PriceBar, PriceSeries, YahooClient};
pub use report::{EventStudy, EventStudyReport, ReportError, SummaryRow};
pub use study::{horizon_returns, window_returns, HorizonReturn, WindowSpec, WindowedReturns};
