//! CSV writers for price series.
//!
//! The output of [`write_prices`] is always readable by
//! [`load_ticker`](super::loader::load_ticker) in either layout.

use std::fs;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use super::loader::{CsvLayout, LoaderError, MULTI_INDEX_COLUMNS};
use super::types::PriceSeries;

/// Write `series` to `writer` in the given layout.
pub fn write_prices<W: Write>(
    writer: W,
    series: &PriceSeries,
    layout: CsvLayout,
) -> Result<(), LoaderError> {
    let mut csv = Writer::from_writer(writer);

    match layout {
        CsvLayout::Standard => {
            csv.write_record(["Date", "Ticker", "Open", "High", "Low", "Close", "Volume"])?;
            for bar in series.bars() {
                csv.write_record([
                    bar.date.format("%Y-%m-%d").to_string(),
                    series.ticker().to_string(),
                    format_number(bar.open),
                    format_number(bar.high),
                    format_number(bar.low),
                    format_number(bar.price),
                    format_number(bar.volume),
                ])?;
            }
        }
        CsvLayout::MultiIndex => {
            let mut price_row = vec!["Price"];
            price_row.extend(&MULTI_INDEX_COLUMNS[1..]);
            csv.write_record(&price_row)?;

            let mut ticker_row = vec!["Ticker"];
            ticker_row.extend(std::iter::repeat(series.ticker()).take(MULTI_INDEX_COLUMNS.len() - 1));
            csv.write_record(&ticker_row)?;

            let mut date_row = vec!["Date"];
            date_row.extend(std::iter::repeat("").take(MULTI_INDEX_COLUMNS.len() - 1));
            csv.write_record(&date_row)?;

            for bar in series.bars() {
                csv.write_record([
                    bar.date.format("%Y-%m-%d").to_string(),
                    format_number(bar.price),
                    format_number(bar.high),
                    format_number(bar.low),
                    format_number(bar.open),
                    format_number(bar.volume),
                ])?;
            }
        }
    }

    csv.flush()?;
    Ok(())
}

/// Write `series` to a file, creating parent directories.
pub fn save_prices(path: &Path, series: &PriceSeries, layout: CsvLayout) -> Result<(), LoaderError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    write_prices(file, series, layout)
}

/// NaN is written as an empty cell.
fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_ticker, parse_prices_with_layout};
    use crate::data::types::tests::sample_series;

    fn render(layout: CsvLayout) -> String {
        let mut buf = Vec::new();
        write_prices(&mut buf, &sample_series(), layout).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_multi_index_header() {
        let text = render(CsvLayout::MultiIndex);
        let lines: Vec<_> = text.lines().take(4).collect();
        assert_eq!(lines[0], "Price,Close,High,Low,Open,Volume");
        assert_eq!(lines[1], "Ticker,TEST,TEST,TEST,TEST,TEST");
        assert_eq!(lines[2], "Date,,,,,");
        assert_eq!(lines[3], "2024-01-04,100,100,100,100,1000");
    }

    #[test]
    fn test_written_layouts_reload_to_same_series() {
        for layout in [CsvLayout::Standard, CsvLayout::MultiIndex] {
            let (series, detected) = parse_prices_with_layout(&render(layout), "TEST").unwrap();
            assert_eq!(detected, layout);
            assert_eq!(series, sample_series());
        }
    }

    #[test]
    fn test_save_prices_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("TEST_stock_2024_2024.csv");
        save_prices(&path, &sample_series(), CsvLayout::MultiIndex).unwrap();

        let loaded = load_ticker(&path, None).unwrap();
        assert_eq!(loaded.ticker(), "TEST");
        assert_eq!(loaded.len(), 5);
    }
}
