//! Fixed-horizon returns after an event.

use chrono::NaiveDate;

use crate::data::PriceSeries;

/// Horizons reported by default, in sessions.
pub const DEFAULT_HORIZONS: &[usize] = &[1, 5, 20];

/// Return at one horizon. `pct` is `None` when it cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonReturn {
    pub horizon: usize,
    pub pct: Option<f64>,
}

/// Percent return `h` sessions after the event session, for each `h`.
///
/// The event session is the first session on or after `event_date`; the
/// baseline is the last price on or before it. A horizon past the end of
/// the series, or an event before the first session, yields `None`.
pub fn horizon_returns(
    series: &PriceSeries,
    event_date: NaiveDate,
    horizons: &[usize],
) -> Vec<HorizonReturn> {
    let undefined = || -> Vec<HorizonReturn> {
        horizons
            .iter()
            .map(|&horizon| HorizonReturn { horizon, pct: None })
            .collect()
    };

    let Some(baseline) = series.baseline_price(event_date) else {
        return undefined();
    };

    let bars = series.bars();
    let base = series.first_session_on_or_after(event_date);

    horizons
        .iter()
        .map(|&horizon| {
            let pct = bars
                .get(base + horizon)
                .map(|bar| 100.0 * (bar.price / baseline - 1.0))
                .filter(|pct| pct.is_finite());
            HorizonReturn { horizon, pct }
        })
        .collect()
}
