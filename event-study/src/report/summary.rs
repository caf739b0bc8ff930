//! Horizon-return summary table.

use std::io::Write;

use chrono::NaiveDate;
use csv::Writer;

use crate::study::HorizonReturn;

/// One (event, ticker) line of the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub event: String,
    pub event_date: NaiveDate,
    pub ticker: String,
    pub returns: Vec<HorizonReturn>,
}

impl SummaryRow {
    /// Return at `horizon`, if configured and defined.
    pub fn pct_at(&self, horizon: usize) -> Option<f64> {
        self.returns
            .iter()
            .find(|r| r.horizon == horizon)
            .and_then(|r| r.pct)
    }
}

/// Column header for a horizon, e.g. `H+5d %`.
pub fn horizon_header(horizon: usize) -> String {
    format!("H+{}d %", horizon)
}

fn header(horizons: &[usize]) -> Vec<String> {
    ["Event", "EventDate", "Ticker"]
        .iter()
        .map(|s| s.to_string())
        .chain(horizons.iter().map(|&h| horizon_header(h)))
        .collect()
}

/// Write the summary as CSV. Undefined returns are empty cells.
pub fn write_summary<W: Write>(
    writer: W,
    horizons: &[usize],
    rows: &[SummaryRow],
) -> Result<(), csv::Error> {
    let mut csv = Writer::from_writer(writer);
    csv.write_record(header(horizons))?;

    for row in rows {
        let mut record = vec![
            row.event.clone(),
            row.event_date.format("%Y-%m-%d").to_string(),
            row.ticker.clone(),
        ];
        record.extend(
            horizons
                .iter()
                .map(|&h| row.pct_at(h).map(|v| v.to_string()).unwrap_or_default()),
        );
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Fixed-width console table with two decimals; undefined returns show as `NaN`.
pub fn format_summary_table(horizons: &[usize], rows: &[SummaryRow]) -> String {
    let mut table: Vec<Vec<String>> = vec![header(horizons)];
    for row in rows {
        let mut line = vec![
            row.event.clone(),
            row.event_date.format("%Y-%m-%d").to_string(),
            row.ticker.clone(),
        ];
        line.extend(horizons.iter().map(|&h| match row.pct_at(h) {
            Some(v) => format!("{:.2}", v),
            None => "NaN".to_string(),
        }));
        table.push(line);
    }

    let columns = table[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| table.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in &table {
        let cells: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                // Text columns left-aligned, numbers right-aligned.
                if c < 3 {
                    format!("{:<width$}", cell, width = widths[c])
                } else {
                    format!("{:>width$}", cell, width = widths[c])
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::tests::date;

    fn rows() -> Vec<SummaryRow> {
        vec![
            SummaryRow {
                event: "GPT-4 launch".to_string(),
                event_date: date("2023-03-14"),
                ticker: "NVDA".to_string(),
                returns: vec![
                    HorizonReturn { horizon: 1, pct: Some(1.5) },
                    HorizonReturn { horizon: 5, pct: Some(-2.25) },
                    HorizonReturn { horizon: 20, pct: None },
                ],
            },
            SummaryRow {
                event: "GPT-4 launch".to_string(),
                event_date: date("2023-03-14"),
                ticker: "AMD".to_string(),
                returns: vec![
                    HorizonReturn { horizon: 1, pct: None },
                    HorizonReturn { horizon: 5, pct: None },
                    HorizonReturn { horizon: 20, pct: None },
                ],
            },
        ]
    }

    #[test]
    fn test_csv_columns_and_empty_cells() {
        let mut buf = Vec::new();
        write_summary(&mut buf, &[1, 5, 20], &rows()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Event,EventDate,Ticker,H+1d %,H+5d %,H+20d %");
        assert_eq!(lines[1], "GPT-4 launch,2023-03-14,NVDA,1.5,-2.25,");
        assert_eq!(lines[2], "GPT-4 launch,2023-03-14,AMD,,,");
    }

    #[test]
    fn test_console_table() {
        let table = format_summary_table(&[1, 5, 20], &rows());
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Event"));
        assert!(lines[1].contains("1.50"));
        assert!(lines[1].contains("-2.25"));
        assert!(lines[1].ends_with("NaN"));
        assert!(lines[2].contains("AMD"));
    }

    #[test]
    fn test_pct_at_unknown_horizon() {
        assert_eq!(rows()[0].pct_at(60), None);
        assert_eq!(rows()[0].pct_at(1), Some(1.5));
    }
}
