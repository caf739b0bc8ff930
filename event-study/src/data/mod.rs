pub mod export;
pub mod loader;
pub mod types;
pub mod yahoo;

pub use export::{save_prices, write_prices};
pub use loader::{load_ticker, parse_prices, parse_prices_with_layout, ticker_from_path, CsvLayout, LoaderError};
pub use types::{Event, PriceBar, PriceSeries};
pub use yahoo::{YahooClient, YahooError};
