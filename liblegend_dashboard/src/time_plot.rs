use time::UtcOffset;

use super::figure::{
    format_start_time, AxisKind, Figure, LegendLocation, Line, Range, SecondaryAxis, Tooltip,
    TooltipField, ValueFormat, YAxis,
};
use super::frame::{ColumnLabel, Frame, ResampleOrigin, NANOS_PER_SECOND};
use super::palette::{hls_palette, Rgb};
use super::retrieval::{PhySeries, SlowControlSeries};
use super::selection::Selection;

const RELATIVE_UNIT: &str = "%";
const NOISE_LABEL: &str = "Noise";
const NOISE_RANGE: Range = Range::new(-150.0, 150.0);
const DEFAULT_RELATIVE_RANGE: Range = Range::new(-1.0, 1.0);

/// Fixed y ranges of relative (%) plots, keyed by display label
const RELATIVE_RANGES: [(&str, Range); 6] = [
    (NOISE_LABEL, NOISE_RANGE),
    ("FPGA baseline", Range::new(-10.0, 10.0)),
    ("Mean Baseline", Range::new(-10.0, 10.0)),
    ("Gain to Pulser Difference", Range::new(-4.0, 4.0)),
    ("Event Rate", Range::new(-150.0, 50.0)),
    ("Custom A/E (A_max / cuspEmax)", Range::new(-10.0, 10.0)),
];

const FULL_RES_WIDTH: f32 = 1.0;
const RESAMPLED_WIDTH: f32 = 2.5;
const DIMMED_ALPHA: f32 = 0.3;
const SC_WIDTH: f32 = 2.0;
const SC_DIMMED_ALPHA: f32 = 0.2;

/// What the plot builders need to know besides the data
#[derive(Debug, Clone, Copy)]
pub struct PlotContext<'a> {
    /// `<experiment>-<period>-<run>`
    pub run_label: &'a str,
    pub selection: &'a Selection,
    pub display_offset: UtcOffset,
}

impl PlotContext<'_> {
    fn offset_nanos(&self) -> i64 {
        self.display_offset.whole_seconds() as i64 * NANOS_PER_SECOND
    }
}

/// The y range of a time plot, None to autoscale
pub fn y_range_override(label: &str, unit: &str) -> Option<Range> {
    if unit == RELATIVE_UNIT {
        let range = RELATIVE_RANGES
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, r)| *r)
            .unwrap_or(DEFAULT_RELATIVE_RANGE);
        Some(range)
    } else if label == NOISE_LABEL {
        Some(NOISE_RANGE)
    } else {
        None
    }
}

fn to_points(frame: &Frame, column: &ColumnLabel) -> Option<Vec<[f64; 2]>> {
    let values = frame.column(column)?;
    Some(
        frame
            .index()
            .iter()
            .zip(values.iter())
            .map(|(t, v)| [*t as f64 / NANOS_PER_SECOND as f64, *v])
            .collect(),
    )
}

/// Build the value-vs-time figure: one line per detector, optionally resampled, with an
/// optional slow control overlay on a secondary axis
pub fn build_time_plot(series: &PhySeries, ctx: &PlotContext<'_>) -> Figure {
    let selection = ctx.selection;
    if series.values.n_rows() == 0 {
        return Figure::placeholder(format!("No data for run {}", ctx.run_label));
    }

    let high_res = series.values.clone().shift_index(ctx.offset_nanos());
    let resampled = selection
        .resample_seconds()
        .map(|s| high_res.resample_mean(s * NANOS_PER_SECOND, ResampleOrigin::Start));

    let channels = series.mean.columns();
    let colors = hls_palette(channels.len());
    let mut lines = Vec::new();
    for (column, color) in channels.iter().zip(colors) {
        let name = column.to_string();
        if let Some(points) = to_points(&high_res, column) {
            lines.push(Line {
                name: name.clone(),
                legend: name.clone(),
                points,
                color,
                width: FULL_RES_WIDTH,
                alpha: if resampled.is_some() { DIMMED_ALPHA } else { 1.0 },
                y_axis: YAxis::Primary,
                hoverable: resampled.is_none(),
            });
        }
        if let Some(points) = resampled.as_ref().and_then(|r| to_points(r, column)) {
            lines.push(Line {
                name: name.clone(),
                legend: name,
                points,
                color,
                width: RESAMPLED_WIDTH,
                alpha: 1.0,
                y_axis: YAxis::Primary,
                hoverable: true,
            });
        }
    }

    let start_frame = resampled.as_ref().unwrap_or(&high_res);
    let start = start_frame
        .index()
        .first()
        .map(|t| format_start_time(*t as f64 / NANOS_PER_SECOND as f64))
        .unwrap_or_default();

    let info = &series.info;
    let mut figure = Figure {
        title: format!(
            "{} | Phy. {} | {} | {}",
            ctx.run_label,
            selection.plot_type.label(),
            selection.plot_value.label(),
            selection.group
        ),
        x_kind: AxisKind::Datetime,
        x_label: format!("Time (CET), starting: {start}"),
        y_label: format!("{} [{}]", info.label, info.unit),
        y_range: y_range_override(&info.label, &info.unit),
        secondary: None,
        lines,
        tooltips: vec![
            Tooltip::new("Time", TooltipField::X(ValueFormat::Datetime)),
            Tooltip::new(
                format!("Avg. {} ({})", info.label, info.unit),
                TooltipField::Y(ValueFormat::Decimal(2)),
            ),
            Tooltip::new("Detector", TooltipField::Name),
        ],
        legend: Some(LegendLocation::BottomLeft),
        placeholder: false,
    };

    if let Some(sc) = &series.slow_control {
        add_slow_control(&mut figure, sc, ctx);
    }
    figure
}

fn add_slow_control(figure: &mut Figure, sc: &SlowControlSeries, ctx: &PlotContext<'_>) {
    let finite = sc.values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return;
    }
    let frame = match sc.to_frame() {
        Ok(f) => f.shift_index(ctx.offset_nanos()),
        Err(e) => {
            spdlog::warn!("Skipping slow control overlay: {}", e);
            return;
        }
    };
    figure.secondary = Some(SecondaryAxis {
        label: format!("{} [{}]", sc.name, sc.unit),
        range: Range::new(min * 0.99, max * 1.01),
    });

    let column = ColumnLabel::Name(sc.name.clone());
    let resampled = ctx
        .selection
        .resample_seconds()
        .map(|s| frame.resample_mean(s * NANOS_PER_SECOND, ResampleOrigin::StartDay));
    let sc_line = |points: Vec<[f64; 2]>, alpha: f32| Line {
        name: sc.name.clone(),
        legend: sc.name.clone(),
        points,
        color: Rgb::BLACK,
        width: SC_WIDTH,
        alpha,
        y_axis: YAxis::Secondary,
        hoverable: false,
    };
    if let Some(points) = to_points(&frame, &column) {
        let alpha = if resampled.is_some() { SC_DIMMED_ALPHA } else { 1.0 };
        figure.lines.push(sc_line(points, alpha));
    }
    if let Some(points) = resampled.as_ref().and_then(|r| to_points(r, &column)) {
        figure.lines.push(sc_line(points, 1.0));
    }
}
