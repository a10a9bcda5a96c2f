use super::figure::{
    AxisKind, Figure, LegendLocation, Line, Tooltip, TooltipField, ValueFormat, YAxis,
};
use super::frame::ColumnLabel;
use super::palette::categorical_palette;
use super::plot_meta::PlotInfo;
use super::retrieval::PhySeries;
use super::time_plot::PlotContext;

/// Fixed histogram ranges keyed by unit
const UNIT_RANGES: [(&str, (f64, f64)); 1] = [("keV", (0.0, 2500.0))];
/// Bin widths keyed by unit
const UNIT_BIN_WIDTHS: [(&str, f64); 1] = [("keV", 2.5)];
const DEFAULT_BIN_WIDTH: f64 = 1.0;
/// Upper bound on the number of edges of a single histogram
const MAX_EDGES: usize = 1_000_000;

const LINE_WIDTH: f32 = 2.0;

/// The histogram range: fixed for some units, otherwise the data extent
pub fn histogram_range(info: &PlotInfo, data_min: f64, data_max: f64) -> (f64, f64) {
    UNIT_RANGES
        .iter()
        .find(|(unit, _)| *unit == info.unit)
        .map(|(_, range)| *range)
        .unwrap_or((data_min, data_max))
}

/// Bin width and step between edges for a quantity.
///
/// A/E parameters get steps of width/50, corrected A/E parameters width/100.
pub fn bin_width_and_step(info: &PlotInfo) -> (f64, f64) {
    let width = UNIT_BIN_WIDTHS
        .iter()
        .find(|(unit, _)| *unit == info.unit)
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_BIN_WIDTH);
    let parameter = info.parameter_name();
    let step = if parameter.contains("AoE") {
        let step = width / 50.0;
        if parameter.contains("Corrected") {
            step / 2.0
        } else {
            step
        }
    } else {
        width
    };
    (width, step)
}

/// `arange(min, max + width, step)`
pub fn bin_edges(min: f64, max: f64, width: f64, step: f64) -> Vec<f64> {
    let stop = max + width;
    if !(min.is_finite() && stop.is_finite()) || step <= 0.0 || stop <= min {
        return vec![];
    }
    let n = ((stop - min) / step).ceil() as usize;
    if n > MAX_EDGES {
        spdlog::warn!("Refusing to build a histogram with {} edges", n);
        return vec![];
    }
    (0..n).map(|i| min + i as f64 * step).collect()
}

/// Count values per bin. Bins are half open except the last, which includes its right edge;
/// values outside the edges and NaN are ignored
pub fn histogram(values: impl Iterator<Item = f64>, edges: &[f64]) -> Vec<u64> {
    if edges.len() < 2 {
        return vec![];
    }
    let mut counts = vec![0u64; edges.len() - 1];
    let first = edges[0];
    let last = edges[edges.len() - 1];
    for value in values {
        if value.is_nan() || value < first || value > last {
            continue;
        }
        let bin = if value == last {
            counts.len() - 1
        } else {
            edges.partition_point(|e| *e <= value) - 1
        };
        counts[bin] += 1;
    }
    counts
}

/// Build the histogram figure: one line of bin centre vs count per detector of the group
pub fn build_histogram(series: &PhySeries, ctx: &PlotContext<'_>) -> Figure {
    let info = &series.info;
    let (width, step) = bin_width_and_step(info);
    let colors = categorical_palette(series.values.columns().len());

    let mut lines = Vec::new();
    for (det, color) in series.detectors.iter().zip(colors) {
        let Some(values) = series.values.column(&ColumnLabel::Name(det.name.clone())) else {
            continue;
        };
        let (data_min, data_max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let (x_min, x_max) = histogram_range(info, data_min, data_max);
        let edges = bin_edges(x_min, x_max, width, step);
        let counts = histogram(values.iter().copied(), &edges);
        let points = counts
            .iter()
            .enumerate()
            .map(|(i, c)| [(edges[i] + edges[i + 1]) / 2.0, *c as f64])
            .collect();
        lines.push(Line {
            name: format!("ch {}", det.rawid),
            legend: det.name.clone(),
            points,
            color,
            width: LINE_WIDTH,
            alpha: 1.0,
            y_axis: YAxis::Primary,
            hoverable: true,
        });
    }

    Figure {
        title: format!(
            "{} | Phy. {} | {} | {}",
            ctx.run_label,
            ctx.selection.plot_type.label(),
            info.label,
            ctx.selection.group
        ),
        x_kind: AxisKind::Linear,
        x_label: format!("{} [{}]", info.label, info.axis_unit()),
        y_label: String::from("Counts"),
        y_range: None,
        secondary: None,
        lines,
        tooltips: vec![
            Tooltip::new(
                format!("{} ({})", info.label, info.unit),
                TooltipField::X(ValueFormat::Decimal(2)),
            ),
            Tooltip::new("Counts", TooltipField::Y(ValueFormat::Integer)),
            Tooltip::new("Detector", TooltipField::Name),
        ],
        legend: Some(LegendLocation::BottomLeft),
        placeholder: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{PlotStyle, PlotType, PlotValue, SlowControl, UnitMode};
    use crate::channel_map::{Detector, SortBy};
    use crate::frame::Frame;
    use crate::selection::Selection;
    use ndarray::array;
    use time::UtcOffset;

    fn info(unit: &str, parameter: &str) -> PlotInfo {
        PlotInfo {
            label: String::from("Quantity"),
            unit: unit.to_string(),
            parameter: Some(parameter.to_string()),
            unit_label: None,
        }
    }

    fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
        let n = ((stop - start) / step).ceil() as usize;
        (0..n).map(|i| start + i as f64 * step).collect()
    }

    #[test]
    fn test_bin_steps() {
        assert_eq!(bin_width_and_step(&info("keV", "cuspEmax")), (2.5, 2.5));
        assert_eq!(bin_width_and_step(&info("ADC", "baseline")), (1.0, 1.0));
        assert_eq!(bin_width_and_step(&info("a.u.", "AoE_Custom")), (1.0, 0.02));
        assert_eq!(
            bin_width_and_step(&info("a.u.", "AoE_Corrected")),
            (1.0, 0.01)
        );
        assert_eq!(
            bin_width_and_step(&info("keV", "AoE_Corrected")),
            (2.5, 0.025)
        );
    }

    #[test]
    fn test_bin_edges_match_arange() {
        let (width, step) = bin_width_and_step(&info("ADC", "baseline"));
        assert_eq!(
            bin_edges(3.0, 7.5, width, step),
            arange(3.0, 8.5, 1.0)
        );
        assert_eq!(bin_edges(3.0, 7.5, width, step).len(), 6);

        let (width, step) = bin_width_and_step(&info("a.u.", "AoE_Custom"));
        let edges = bin_edges(-1.0, 1.0, width, step);
        assert_eq!(edges, arange(-1.0, 2.0, 0.02));
        assert_eq!(edges.len(), 150);

        let kev = info("keV", "cuspEmax");
        assert_eq!(histogram_range(&kev, 10.0, 20.0), (0.0, 2500.0));
        assert_eq!(bin_edges(0.0, 2500.0, 2.5, 2.5).len(), 1001);
        assert!(bin_edges(f64::INFINITY, f64::NEG_INFINITY, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_histogram_counts() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        let values = [0.0, 0.5, 1.0, 2.9, 3.0, 3.1, -0.1, f64::NAN];
        assert_eq!(histogram(values.into_iter(), &edges), vec![2, 1, 2]);
        assert!(histogram(values.into_iter(), &[1.0]).is_empty());
    }

    #[test]
    fn test_build_histogram() {
        let values = Frame::try_new(
            "t",
            vec![0, 1, 2, 3],
            vec![
                ColumnLabel::Name(String::from("V01")),
                ColumnLabel::Name(String::from("V02")),
            ],
            array![[1.0, 5.0], [1.2, 5.0], [2.5, f64::NAN], [3.0, 6.0]],
        )
        .unwrap();
        let det = |name: &str, rawid: u32, position: u32| Detector {
            name: name.to_string(),
            rawid,
            string: 1,
            position,
            cc4_id: None,
        };
        let series = PhySeries {
            values: values.clone(),
            mean: values,
            info: info("ADC", "baseline"),
            detectors: vec![det("V01", 11, 1), det("V02", 12, 2)],
            slow_control: None,
        };
        let selection = Selection {
            period: String::from("p03"),
            run: String::from("r000"),
            sort_by: SortBy::String,
            group: String::from("String 1"),
            plot_type: PlotType::BaselineEvents,
            plot_value: PlotValue::BaselineFpga,
            plot_style: PlotStyle::Histogram,
            resample_minutes: 60,
            units: UnitMode::Absolute,
            slow_control: SlowControl::None,
        };
        let ctx = PlotContext {
            run_label: "L200-p03-r000",
            selection: &selection,
            display_offset: UtcOffset::UTC,
        };
        let fig = build_histogram(&series, &ctx);
        assert_eq!(fig.lines.len(), 2);
        assert_eq!(fig.x_kind, AxisKind::Linear);
        assert_eq!(fig.y_label, "Counts");
        assert_eq!(
            fig.title,
            "L200-p03-r000 | Phy. Baseline Events | Quantity | String 1"
        );
        // edges 1, 2, 3 -> centres 1.5, 2.5 with counts 2 and 2
        let v01 = &fig.lines[0];
        assert_eq!(v01.legend, "V01");
        assert_eq!(v01.name, "ch 11");
        assert_eq!(v01.points, vec![[1.5, 2.0], [2.5, 2.0]]);
        assert_ne!(fig.lines[0].color, fig.lines[1].color);
    }
}
