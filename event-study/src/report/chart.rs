//! Per-event PNG charts.
//!
//! One line per ticker, dashed vertical line at the event session and a
//! dashed horizontal line at zero return.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use crate::data::Event;
use crate::study::WindowedReturns;

/// Output size in pixels (9 x 5.5 in at 160 dpi).
pub const CHART_SIZE: (u32, u32) = (1440, 880);

/// Maximum title line length in characters.
const TITLE_WIDTH: usize = 70;

const TITLE_LINE_HEIGHT: i32 = 30;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to plot for {0}")]
    Empty(String),

    #[error("Render failed: {0}")]
    Render(String),
}

fn render_err(e: impl std::fmt::Display) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Title lines for an event chart.
pub fn chart_title(event: &Event) -> Vec<String> {
    let title = format!(
        "{} - normalized to the event close (or last session on or before the date)",
        event.label
    );
    let mut lines = wrap_text(&title, TITLE_WIDTH);
    lines.push(event.date.format("%Y-%m-%d").to_string());
    lines
}

/// Axis ranges covering every window, padded, always including zero.
pub fn plot_bounds(windows: &[(String, WindowedReturns)]) -> Option<((i32, i32), (f64, f64))> {
    let mut x: Option<(i32, i32)> = None;
    let mut y: Option<(f64, f64)> = None;

    for (_, window) in windows {
        if let Some((lo, hi)) = window.offset_range() {
            x = Some(x.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
        }
        if let Some((lo, hi)) = window.value_range() {
            y = Some(y.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
        }
    }

    let (x_min, x_max) = x?;
    let (y_min, y_max) = y?;

    let (x_min, x_max) = if x_min == x_max {
        (x_min - 1, x_max + 1)
    } else {
        (x_min, x_max)
    };

    let y_min = y_min.min(0.0);
    let y_max = y_max.max(0.0);
    let pad = ((y_max - y_min) * 0.05).max(1.0);

    Some(((x_min, x_max), (y_min - pad, y_max + pad)))
}

/// Render one event chart to `path`.
pub fn render_event_chart(
    path: &Path,
    event: &Event,
    windows: &[(String, WindowedReturns)],
) -> Result<(), ChartError> {
    let ((x_min, x_max), (y_min, y_max)) =
        plot_bounds(windows).ok_or_else(|| ChartError::Empty(event.label.clone()))?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let title = chart_title(event);
    let title_height = TITLE_LINE_HEIGHT * title.len() as i32 + 20;
    let (title_area, plot_area) = root.split_vertically(title_height);

    let title_style =
        TextStyle::from(("sans-serif", 24).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for (i, line) in title.iter().enumerate() {
        title_area
            .draw_text(
                line,
                &title_style,
                (CHART_SIZE.0 as i32 / 2, 10 + TITLE_LINE_HEIGHT * i as i32),
            )
            .map_err(render_err)?;
    }

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Trading sessions relative to the event (0 = event session)")
        .y_desc("% change since the event")
        .draw()
        .map_err(render_err)?;

    for (idx, (ticker, window)) in windows.iter().enumerate() {
        if window.value_range().is_none() {
            continue;
        }
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(
                window.iter().filter(|(_, v)| v.is_finite()),
                color.stroke_width(2),
            ))
            .map_err(render_err)?
            .label(ticker.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .draw_series(DashedLineSeries::new(
            vec![(0, y_min), (0, y_max)],
            8,
            6,
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;
    chart
        .draw_series(DashedLineSeries::new(
            vec![(x_min, 0.0), (x_max, 0.0)],
            2,
            4,
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::tests::{date, sample_series};
    use crate::study::{window_returns, WindowSpec};

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("aaa bbb ccc dddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc", "dddd"]);
        assert_eq!(wrap_text("averyveryverylongword x", 5), vec!["averyveryverylongword", "x"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn test_chart_title_wrapped_with_date_last() {
        let event = Event::new("ChatGPT integration in Bing/Office/Azure", date("2023-05-01"));
        let title = chart_title(&event);
        assert!(title.len() >= 3);
        assert!(title.iter().all(|l| l.chars().count() <= TITLE_WIDTH));
        assert_eq!(title.last().map(String::as_str), Some("2023-05-01"));
    }

    #[test]
    fn test_plot_bounds_include_zero() {
        let series = sample_series();
        let window = window_returns(&series, date("2024-01-04"), WindowSpec::default());
        let ((x_min, x_max), (y_min, y_max)) =
            plot_bounds(&[("TEST".to_string(), window)]).unwrap();
        assert_eq!((x_min, x_max), (0, 4));
        assert!(y_min < -1.0);
        assert!(y_max > 21.0);
    }

    #[test]
    fn test_plot_bounds_empty() {
        assert!(plot_bounds(&[]).is_none());
        assert!(plot_bounds(&[("X".to_string(), WindowedReturns::default())]).is_none());
    }
}
