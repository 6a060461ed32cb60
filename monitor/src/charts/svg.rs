use std::fmt::Write;

use chrono::{DateTime, Utc};
use maud::{Markup, html};

use super::series::{Point, Series};

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 30.0;
const LEGEND_ROW: f64 = 16.0;

/// The Es/N0 axis always spans at least this range.
const Y_FLOOR: f64 = 0.0;
const Y_CEILING: f64 = 20.0;

const TEXT_STYLE: &str = "fill: var(--foreground); font-family: inherit";
const SVG_CONTAINER_STYLE: &str = "width:100%;height:auto";

const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

fn format_time(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_default()
}

fn format_value(v: f64) -> String {
    format!("{v:.2}")
}

/// Splits a series into runs of consecutive non-null points; a null point
/// ends the current run so the chart shows a gap.
fn segments(points: &[Point]) -> Vec<Vec<(i64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for point in points {
        match point.y {
            Some(y) => current.push((point.x, y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

struct Frame {
    x_min: i64,
    x_span: f64,
    y_min: f64,
    y_span: f64,
    chart_w: f64,
    chart_h: f64,
}

impl Frame {
    fn fit(series: &[Series<Point>], chart_h: f64) -> Option<Frame> {
        let points = || series.iter().flat_map(|s| s.values.iter());
        let x_min = points().map(|p| p.x).min()?;
        let x_max = points().map(|p| p.x).max()?;
        let ys = || points().filter_map(|p| p.y);
        let y_min = ys().fold(Y_FLOOR, f64::min);
        let y_max = ys().fold(Y_CEILING, f64::max);

        Some(Frame {
            x_min,
            x_span: ((x_max - x_min) as f64).max(1.0),
            y_min,
            y_span: (y_max - y_min).max(f64::EPSILON),
            chart_w: WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            chart_h,
        })
    }

    fn x(&self, millis: i64) -> f64 {
        MARGIN_LEFT + ((millis - self.x_min) as f64 / self.x_span) * self.chart_w
    }

    fn y(&self, value: f64) -> f64 {
        MARGIN_TOP + self.chart_h - ((value - self.y_min) / self.y_span) * self.chart_h
    }
}

/// Line chart of averaged series, one colored polyline run per gap-free
/// stretch, with a legend below the plot.
pub fn render_line_chart(series: &[Series<Point>], label: &str) -> Markup {
    let legend_h = LEGEND_ROW * series.len() as f64;
    let total_h = HEIGHT + legend_h;
    let chart_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let Some(frame) = Frame::fit(series, chart_h) else {
        return empty_chart(label);
    };
    let x_max = frame.x_min + frame.x_span as i64;

    html! {
        svg viewBox=(format!("0 0 {WIDTH} {total_h}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(total_h) style="fill: var(--background)" {}
            text x=(MARGIN_LEFT) y="14" font-size="12" style=(TEXT_STYLE) { (label) }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + 10.0) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_value(frame.y_min + frame.y_span))
            }
            text x=(MARGIN_LEFT - 5.0) y=(MARGIN_TOP + chart_h) font-size="10" text-anchor="end" style=(TEXT_STYLE) {
                (format_value(frame.y_min))
            }
            @for (i, s) in series.iter().enumerate() {
                @let color = PALETTE[i % PALETTE.len()];
                @for run in segments(&s.values) {
                    @let points = polyline_points(&frame, &run);
                    polyline points=(points) fill="none" stroke-width="1.5" stroke=(color) {
                        title { (s.key) }
                    }
                }
            }
            (write_x_axis(&frame, x_max))
            @for (i, s) in series.iter().enumerate() {
                @let y = HEIGHT + LEGEND_ROW * i as f64 + 4.0;
                rect x=(MARGIN_LEFT) y=(y) width="10" height="10" fill=(PALETTE[i % PALETTE.len()]) {}
                text x=(MARGIN_LEFT + 16.0) y=(y + 9.0) font-size="11" style=(TEXT_STYLE) { (s.key) }
            }
        }
    }
}

fn polyline_points(frame: &Frame, run: &[(i64, f64)]) -> String {
    let mut points = String::new();
    for &(x, y) in run {
        if !points.is_empty() {
            points.push(' ');
        }
        let _ = write!(points, "{:.1},{:.1}", frame.x(x), frame.y(y));
    }
    // A lone point still needs a visible stroke
    if run.len() == 1 {
        let (x, y) = run[0];
        let _ = write!(points, " {:.1},{:.1}", frame.x(x) + 1.0, frame.y(y));
    }
    points
}

fn write_x_axis(frame: &Frame, x_max: i64) -> Markup {
    let label_y = HEIGHT - 5.0;
    let mid = frame.x_min + (x_max - frame.x_min) / 2;
    html! {
        text x=(MARGIN_LEFT) y=(label_y) font-size="11" text-anchor="start" style=(TEXT_STYLE) {
            (format_time(frame.x_min))
        }
        text x=(frame.x(mid)) y=(label_y) font-size="11" text-anchor="middle" style=(TEXT_STYLE) {
            (format_time(mid))
        }
        text x=(frame.x(x_max)) y=(label_y) font-size="11" text-anchor="end" style=(TEXT_STYLE) {
            (format_time(x_max))
        }
    }
}

fn empty_chart(label: &str) -> Markup {
    html! {
        svg viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) xmlns="http://www.w3.org/2000/svg" style=(SVG_CONTAINER_STYLE) {
            rect width=(WIDTH) height=(HEIGHT) style="fill: var(--background)" {}
            text x=(WIDTH / 2.0) y=(HEIGHT / 2.0) font-size="14" text-anchor="middle" style=(TEXT_STYLE) {
                (label) ": no data"
            }
        }
    }
}
