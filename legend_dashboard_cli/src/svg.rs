use std::collections::HashSet;

use plotters::prelude::*;
use thiserror::Error;

use liblegend_dashboard::figure::{
    format_time_tick, AxisKind, Figure, Line, Range, YAxis, FIGURE_HEIGHT, FIGURE_WIDTH,
};
use liblegend_dashboard::palette::Rgb;

use super::html::escape;

/// Upper bound on the hover targets emitted per line
const MAX_HOVER_POINTS: usize = 500;
const HOVER_RADIUS: u32 = 4;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to draw the figure: {0}")]
    Drawing(String),
}

fn drawing<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

fn style(color: Rgb, alpha: f32, width: f32) -> ShapeStyle {
    RGBColor(color.r, color.g, color.b)
        .mix(alpha as f64)
        .stroke_width(width.round().max(1.0) as u32)
}

/// Split a polyline at NaN values so gaps are not bridged
fn segments(points: &[[f64; 2]]) -> Vec<Vec<(f64, f64)>> {
    points
        .split(|p| !p[1].is_finite())
        .filter(|s| !s.is_empty())
        .map(|s| s.iter().map(|p| (p[0], p[1])).collect())
        .collect()
}

/// Widen a degenerate range so it can be used as an axis
fn padded(range: Range) -> std::ops::Range<f64> {
    if range.end > range.start {
        range.start..range.end
    } else {
        (range.start - 1.0)..(range.end + 1.0)
    }
}

/// A transparent circle at a data point whose title holds the tooltip rows
struct HoverTarget {
    x: i32,
    y: i32,
    text: String,
}

/// The finite points of a line to attach tooltips to, thinned to at most MAX_HOVER_POINTS
fn hover_points(line: &Line) -> impl Iterator<Item = [f64; 2]> + '_ {
    let step = line.points.len().div_ceil(MAX_HOVER_POINTS).max(1);
    line.points
        .iter()
        .step_by(step)
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .copied()
}

fn tooltip_text(figure: &Figure, line: &Line, point: [f64; 2]) -> String {
    figure
        .tooltip_rows(line, point)
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append the hover targets as a group at the end of an SVG document
fn append_hover_targets(buffer: &mut String, targets: &[HoverTarget]) {
    if targets.is_empty() {
        return;
    }
    let mut group = String::from("<g fill=\"transparent\" pointer-events=\"all\">\n");
    for target in targets {
        group.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"><title>{}</title></circle>\n",
            target.x,
            target.y,
            HOVER_RADIUS,
            escape(&target.text)
        ));
    }
    group.push_str("</g>\n");
    match buffer.rfind("</svg>") {
        Some(end) => buffer.insert_str(end, &group),
        None => buffer.push_str(&group),
    }
}

/// Render a figure as a standalone SVG document. Points of hoverable lines carry their
/// tooltip as an SVG title
pub fn render_svg(figure: &Figure) -> Result<String, RenderError> {
    let mut buffer = String::new();
    let mut targets: Vec<HoverTarget> = Vec::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (FIGURE_WIDTH, FIGURE_HEIGHT))
            .into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let bounds = figure.data_bounds(YAxis::Primary);
        let (x_range, y_range) = match (figure.is_placeholder(), bounds) {
            (false, Some((x, y))) => (x, figure.y_range.unwrap_or(y)),
            _ => {
                root.titled(&figure.title, ("sans-serif", 20))
                    .map_err(drawing)?;
                root.present().map_err(drawing)?;
                drop(root);
                return Ok(buffer);
            }
        };
        let secondary = figure
            .secondary
            .as_ref()
            .map(|s| s.range)
            .unwrap_or(y_range);

        let mut chart = ChartBuilder::on(&root)
            .caption(&figure.title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .right_y_label_area_size(if figure.secondary.is_some() { 70 } else { 0 })
            .build_cartesian_2d(padded(x_range), padded(y_range))
            .map_err(drawing)?
            .set_secondary_coord(padded(x_range), padded(secondary));

        let span = x_range.end - x_range.start;
        let time_label = |x: &f64| format_time_tick(*x, span);
        let plain_label = |x: &f64| format!("{x:.2}");
        let x_formatter: &dyn Fn(&f64) -> String = match figure.x_kind {
            AxisKind::Datetime => &time_label,
            AxisKind::Linear => &plain_label,
        };
        chart
            .configure_mesh()
            .x_desc(figure.x_label.as_str())
            .y_desc(figure.y_label.as_str())
            .x_labels(8)
            .x_label_formatter(x_formatter)
            .draw()
            .map_err(drawing)?;
        if let Some(axis) = &figure.secondary {
            chart
                .configure_secondary_axes()
                .y_desc(axis.label.as_str())
                .draw()
                .map_err(drawing)?;
        }

        let mut labelled: HashSet<&str> = HashSet::new();
        for line in figure.lines.iter() {
            if line.hoverable && !figure.tooltips.is_empty() {
                for point in hover_points(line) {
                    let (x, y) = match line.y_axis {
                        YAxis::Primary => chart.backend_coord(&(point[0], point[1])),
                        YAxis::Secondary => {
                            chart.borrow_secondary().backend_coord(&(point[0], point[1]))
                        }
                    };
                    targets.push(HoverTarget {
                        x,
                        y,
                        text: tooltip_text(figure, line, point),
                    });
                }
            }
            let line_style = style(line.color, line.alpha, line.width);
            let legend_style = style(line.color, 1.0, line.width);
            for segment in segments(&line.points) {
                let series = LineSeries::new(segment, line_style);
                let mut annotation = match line.y_axis {
                    YAxis::Primary => chart.draw_series(series),
                    YAxis::Secondary => chart.draw_secondary_series(series),
                }
                .map_err(drawing)?;
                if figure.legend.is_some() && labelled.insert(line.legend.as_str()) {
                    annotation.label(line.legend.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], legend_style)
                    });
                }
            }
        }

        if figure.legend.is_some() && !labelled.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(drawing)?;
        }
        root.present().map_err(drawing)?;
    }
    append_hover_targets(&mut buffer, &targets);
    Ok(buffer)
}
