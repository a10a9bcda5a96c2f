//! A backend independent description of a plot.
//!
//! The plot builders produce a [`Figure`]; the GUI draws it with egui_plot and the server
//! renders it to SVG. Datetime x values are seconds since the unix epoch, already shifted to
//! the display offset.
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use super::palette::Rgb;

pub const FIGURE_WIDTH: u32 = 1000;
pub const FIGURE_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisKind {
    Datetime,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YAxis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: f64,
    pub end: f64,
}

impl Range {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Map a value of this range onto `other`, linearly
    pub fn map_to(&self, other: &Range, value: f64) -> f64 {
        let span = self.end - self.start;
        if span == 0.0 {
            return other.start;
        }
        other.start + (value - self.start) / span * (other.end - other.start)
    }
}

/// A single polyline. NaN y values break the line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Used by the hover tooltip
    pub name: String,
    pub legend: String,
    pub points: Vec<[f64; 2]>,
    pub color: Rgb,
    pub width: f32,
    pub alpha: f32,
    pub y_axis: YAxis,
    pub hoverable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueFormat {
    Datetime,
    Decimal(usize),
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TooltipField {
    X(ValueFormat),
    Y(ValueFormat),
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    pub label: String,
    pub field: TooltipField,
}

impl Tooltip {
    pub fn new(label: impl Into<String>, field: TooltipField) -> Self {
        Self {
            label: label.into(),
            field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryAxis {
    pub label: String,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendLocation {
    BottomLeft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: String,
    pub x_kind: AxisKind,
    pub x_label: String,
    pub y_label: String,
    /// Fixed y range, None to autoscale
    pub y_range: Option<Range>,
    pub secondary: Option<SecondaryAxis>,
    pub lines: Vec<Line>,
    pub tooltips: Vec<Tooltip>,
    pub legend: Option<LegendLocation>,
    pub placeholder: bool,
}

impl Figure {
    /// An empty figure which only carries an explanatory title
    pub fn placeholder(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_kind: AxisKind::Linear,
            x_label: String::new(),
            y_label: String::new(),
            y_range: None,
            secondary: None,
            lines: vec![],
            tooltips: vec![],
            legend: None,
            placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn lines_on(&self, axis: YAxis) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(move |l| l.y_axis == axis)
    }

    /// The (min, max) of finite values over all lines of an axis
    pub fn data_bounds(&self, axis: YAxis) -> Option<(Range, Range)> {
        let mut x = Range::new(f64::INFINITY, f64::NEG_INFINITY);
        let mut y = Range::new(f64::INFINITY, f64::NEG_INFINITY);
        for p in self.lines_on(axis).flat_map(|l| l.points.iter()) {
            if p[0].is_finite() && p[1].is_finite() {
                x = Range::new(x.start.min(p[0]), x.end.max(p[0]));
                y = Range::new(y.start.min(p[1]), y.end.max(p[1]));
            }
        }
        if x.start > x.end {
            None
        } else {
            Some((x, y))
        }
    }

    /// The tooltip rows for a hovered point of a line
    pub fn tooltip_rows(&self, line: &Line, point: [f64; 2]) -> Vec<(String, String)> {
        self.tooltips
            .iter()
            .map(|t| {
                let value = match &t.field {
                    TooltipField::X(format) => format_value(point[0], *format),
                    TooltipField::Y(format) => format_value(point[1], *format),
                    TooltipField::Name => line.name.clone(),
                };
                (t.label.clone(), value)
            })
            .collect()
    }
}

pub fn format_value(value: f64, format: ValueFormat) -> String {
    match format {
        ValueFormat::Datetime => format!("{} CET", format_datetime(value)),
        ValueFormat::Decimal(places) => format!("{value:.places$}"),
        ValueFormat::Integer => format!("{}", value.round() as i64),
    }
}

fn to_datetime(seconds: f64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds.floor() as i64).ok()
}

/// `YYYY-MM-DD HH:MM:SS` of display seconds
pub fn format_datetime(seconds: f64) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    to_datetime(seconds)
        .and_then(|t| t.format(&format).ok())
        .unwrap_or_default()
}

/// `DD/MM/YYYY HH:MM:SS` of display seconds
pub fn format_start_time(seconds: f64) -> String {
    let format = format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");
    to_datetime(seconds)
        .and_then(|t| t.format(&format).ok())
        .unwrap_or_default()
}

/// Tick label for a datetime axis: the date for spans of several days, otherwise the time
pub fn format_time_tick(seconds: f64, span_seconds: f64) -> String {
    let result = to_datetime(seconds).and_then(|t| {
        if span_seconds > 2.0 * 86_400.0 {
            t.format(&format_description!("[year]/[month]/[day]")).ok()
        } else {
            t.format(&format_description!("[month]/[day] [hour]:[minute]"))
                .ok()
        }
    });
    result.unwrap_or_default()
}
