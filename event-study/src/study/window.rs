//! Session-aligned return windows around an event.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::data::PriceSeries;

/// Number of sessions kept on each side of the event session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    pub sessions_before: usize,
    pub sessions_after: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            sessions_before: 10,
            sessions_after: 30,
        }
    }
}

/// Percent return versus the baseline, keyed by session offset.
///
/// Offset 0 is the first session on or after the event date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowedReturns(BTreeMap<i32, f64>);

impl WindowedReturns {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, offset: i32) -> Option<f64> {
        self.0.get(&offset).copied()
    }

    /// `(offset, pct)` pairs in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    /// Smallest and largest offsets.
    pub fn offset_range(&self) -> Option<(i32, i32)> {
        let first = self.0.keys().next()?;
        let last = self.0.keys().next_back()?;
        Some((*first, *last))
    }

    /// Smallest and largest finite returns.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.0
            .values()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Calendar days covering `sessions` trading sessions. `None` when the
/// span does not fit a date offset.
fn calendar_span(sessions: usize) -> Option<Duration> {
    i64::try_from(sessions)
        .ok()?
        .checked_mul(2)
        .and_then(Duration::try_days)
}

/// Percent returns around `event_date`, relative to the baseline price.
///
/// The calendar range is widened to twice the session counts so that
/// weekends and holidays still leave enough sessions, then the result is
/// cut by session count around the event session. Empty when nothing
/// falls in range or the event predates the series.
pub fn window_returns(series: &PriceSeries, event_date: NaiveDate, window: WindowSpec) -> WindowedReturns {
    let start = calendar_span(window.sessions_before)
        .and_then(|span| event_date.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN);
    let end = calendar_span(window.sessions_after)
        .and_then(|span| event_date.checked_add_signed(span))
        .unwrap_or(NaiveDate::MAX);

    let sessions = series.sessions_between(start, end);
    if sessions.is_empty() {
        return WindowedReturns::default();
    }

    let Some(baseline) = series.baseline_price(event_date) else {
        return WindowedReturns::default();
    };

    let pos0 = sessions.partition_point(|b| b.date < event_date);
    let lo = pos0.saturating_sub(window.sessions_before);
    let hi = pos0.saturating_add(window.sessions_after).min(sessions.len() - 1);

    let returns = (lo..=hi)
        .map(|i| {
            let offset = i as i32 - pos0 as i32;
            (offset, 100.0 * (sessions[i].price / baseline - 1.0))
        })
        .collect();

    WindowedReturns(returns)
}
