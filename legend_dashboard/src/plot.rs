use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText};
use egui_plot::{
    AxisHints, Corner, GridMark, HPlacement, Legend, Line, Plot, PlotBounds, PlotPoint, PlotPoints,
};

use liblegend_dashboard::figure::{
    format_time_tick, AxisKind, Figure, LegendLocation, Range, YAxis,
};
use liblegend_dashboard::palette::Rgb;

fn color(rgb: Rgb, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
}

/// Split a polyline at NaN values so gaps are not bridged
fn segments(points: &[[f64; 2]]) -> Vec<Vec<[f64; 2]>> {
    let mut segments = vec![];
    let mut current = vec![];
    for p in points {
        if p[1].is_finite() {
            current.push(*p);
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Range of the primary y axis as drawn, used to place secondary lines
fn primary_range(figure: &Figure) -> Range {
    figure
        .y_range
        .or_else(|| figure.data_bounds(YAxis::Primary).map(|(_, y)| y))
        .unwrap_or(Range::new(0.0, 1.0))
}

/// Draw a figure. `reset` restores the figure's own bounds, which is done whenever a new
/// figure is shown.
pub fn render_figure(ui: &mut egui::Ui, figure: &Figure, reset: bool) {
    ui.label(RichText::new(&figure.title).size(16.0).strong());
    if figure.is_placeholder() {
        return;
    }

    let primary = primary_range(figure);
    let x_bounds = figure.data_bounds(YAxis::Primary).map(|(x, _)| x);

    let mut y_axes = vec![AxisHints::new_y().label(figure.y_label.clone())];
    if let Some(secondary) = figure.secondary.clone() {
        y_axes.push(
            AxisHints::new_y()
                .label(secondary.label)
                .placement(HPlacement::Right)
                .formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                    format!("{:.1}", primary.map_to(&secondary.range, mark.value))
                }),
        );
    }

    let hover_figure = figure.clone();
    let mut plot = Plot::new("phy_plot")
        .x_axis_label(figure.x_label.clone())
        .custom_y_axes(y_axes)
        .allow_scroll(false)
        .label_formatter(move |name: &str, value: &PlotPoint| {
            let Some(line) = hover_figure
                .lines
                .iter()
                .find(|l| l.hoverable && l.legend == name)
            else {
                return String::new();
            };
            hover_figure
                .tooltip_rows(line, [value.x, value.y])
                .into_iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect::<Vec<_>>()
                .join("\n")
        });
    if figure.legend == Some(LegendLocation::BottomLeft) {
        plot = plot.legend(Legend::default().position(Corner::LeftBottom));
    }
    if figure.x_kind == AxisKind::Datetime {
        plot = plot.x_axis_formatter(|mark: GridMark, range: &RangeInclusive<f64>| {
            format_time_tick(mark.value, range.end() - range.start())
        });
    }
    if reset {
        plot = plot.reset();
    }

    plot.show(ui, |plot_ui| {
        for line in figure.lines.iter() {
            for segment in segments(&line.points) {
                let points: Vec<[f64; 2]> = match line.y_axis {
                    YAxis::Primary => segment,
                    YAxis::Secondary => match &figure.secondary {
                        Some(axis) => segment
                            .into_iter()
                            .map(|[x, y]| [x, axis.range.map_to(&primary, y)])
                            .collect(),
                        None => segment,
                    },
                };
                plot_ui.line(
                    Line::new(PlotPoints::new(points))
                        .name(&line.legend)
                        .color(color(line.color, line.alpha))
                        .width(line.width)
                        .allow_hover(line.hoverable),
                );
            }
        }
        if let (true, Some(y), Some(x)) = (reset, figure.y_range, x_bounds) {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max([x.start, y.start], [x.end, y.end]));
        }
    });
}
