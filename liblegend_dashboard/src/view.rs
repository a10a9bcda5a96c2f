//! Page composition shared by the native viewer and the web server.
//!
//! A [`PageSection`] describes which selectors exist and what is selected, together with the
//! figure for the current [`Selection`]. Front-ends only draw it and turn user actions back
//! into [`SelectionEvent`]s via [`WidgetId::event`].
use serde::Serialize;

use super::catalogue::{from_label, PlotStyle, PlotType, PlotValue, SlowControl, UnitMode};
use super::channel_map::SortBy;
use super::figure::Figure;
use super::monitor::PhyMonitor;
use super::selection::{Selection, SelectionEvent, MAX_RESAMPLE_MINUTES};

pub const DEFAULT_WIDGET_WIDTH: u32 = 140;

/// Content of the information page
pub const GENERAL_INFORMATION: &str = include_str!("data/general.md");

/// The pages of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    PhyMonitoring,
    Information,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::PhyMonitoring, Page::Information];

    /// The name used to disable the page from the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhyMonitoring => "phy",
            Self::Information => "info",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PhyMonitoring => "Phy. Monitoring",
            Self::Information => "Information",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// The pages left after removing the disabled ones. Unknown names are logged and ignored.
pub fn enabled_pages<S: AsRef<str>>(disabled: &[S]) -> Vec<Page> {
    let mut disabled_pages = Vec::new();
    for name in disabled {
        match Page::from_name(name.as_ref()) {
            Some(page) => disabled_pages.push(page),
            None => spdlog::warn!("Ignoring unknown page {}", name.as_ref()),
        }
    }
    Page::ALL
        .into_iter()
        .filter(|p| !disabled_pages.contains(p))
        .collect()
}

/// Identifies a selector. The key doubles as the query parameter of the web front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WidgetId {
    Period,
    Run,
    SortBy,
    Group,
    PlotType,
    PlotValue,
    SlowControl,
    Units,
    Resample,
    PlotStyle,
}

impl WidgetId {
    /// All selectors in the order their events must be applied: a run only makes sense
    /// within its period and a group within its grouping
    pub const ALL: [WidgetId; 10] = [
        WidgetId::Period,
        WidgetId::Run,
        WidgetId::SortBy,
        WidgetId::Group,
        WidgetId::PlotType,
        WidgetId::PlotValue,
        WidgetId::SlowControl,
        WidgetId::Units,
        WidgetId::Resample,
        WidgetId::PlotStyle,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Period => "period",
            Self::Run => "run",
            Self::SortBy => "sort_by",
            Self::Group => "group",
            Self::PlotType => "plot_type",
            Self::PlotValue => "plot_value",
            Self::SlowControl => "slow_control",
            Self::Units => "units",
            Self::Resample => "resampled",
            Self::PlotStyle => "plot_style",
        }
    }

    /// Translate a selector value (its display label) into an event
    pub fn event(&self, value: &str) -> Option<SelectionEvent> {
        match self {
            Self::Period => Some(SelectionEvent::Period(value.to_string())),
            Self::Run => Some(SelectionEvent::Run(value.to_string())),
            Self::SortBy => {
                from_label(&SortBy::ALL, value, SortBy::label).map(SelectionEvent::SortBy)
            }
            Self::Group => Some(SelectionEvent::Group(value.to_string())),
            Self::PlotType => {
                from_label(&PlotType::ALL, value, PlotType::label).map(SelectionEvent::PlotType)
            }
            Self::PlotValue => {
                from_label(&PlotValue::ALL, value, PlotValue::label).map(SelectionEvent::PlotValue)
            }
            Self::SlowControl => from_label(&SlowControl::ALL, value, SlowControl::label)
                .map(SelectionEvent::SlowControl),
            Self::Units => {
                from_label(&UnitMode::ALL, value, UnitMode::label).map(SelectionEvent::Units)
            }
            Self::Resample => value
                .trim_end_matches("min")
                .trim()
                .parse::<u32>()
                .ok()
                .map(SelectionEvent::ResampleMinutes),
            Self::PlotStyle => {
                from_label(&PlotStyle::ALL, value, PlotStyle::label).map(SelectionEvent::PlotStyle)
            }
        }
    }
}

/// How a selector is drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WidgetKind {
    /// Drop-down list
    Select,
    RadioButtons { vertical: bool },
    /// Button opening a menu of the options
    MenuButton,
    /// Integer slider with a unit suffix
    Slider { min: u32, max: u32, suffix: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub id: WidgetId,
    pub label: String,
    pub kind: WidgetKind,
    pub options: Vec<String>,
    pub selected: String,
    pub width: u32,
}

/// A page section: selectors plus the figure of the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSection {
    pub name: String,
    /// Markdown heading showing the selected quantity
    pub current_plot: String,
    pub widgets: Vec<Widget>,
    pub figure: Figure,
}

impl PageSection {
    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }
}

fn labels<T>(all: &[T], label: fn(&T) -> &'static str) -> Vec<String> {
    all.iter().map(|v| label(v).to_string()).collect()
}

/// The selectors of the physics monitoring page for a given selection
pub fn phy_widgets(monitor: &PhyMonitor, selection: &Selection, width: u32) -> Vec<Widget> {
    let widget = |id: WidgetId, label: &str, kind: WidgetKind, options: Vec<String>, selected: String| {
        Widget {
            id,
            label: label.to_string(),
            kind,
            options,
            selected,
            width,
        }
    };
    let runs = monitor.runs();
    let groups = monitor
        .channels()
        .groups(selection.sort_by)
        .into_iter()
        .map(|g| g.name)
        .collect();

    vec![
        widget(
            WidgetId::Period,
            "Period",
            WidgetKind::Select,
            runs.periods().into_iter().map(String::from).collect(),
            selection.period.clone(),
        ),
        widget(
            WidgetId::Run,
            "Run",
            WidgetKind::Select,
            runs.runs(&selection.period).into_iter().map(String::from).collect(),
            selection.run.clone(),
        ),
        widget(
            WidgetId::SortBy,
            "Sort by",
            WidgetKind::RadioButtons { vertical: false },
            labels(&SortBy::ALL, SortBy::label),
            selection.sort_by.label().to_string(),
        ),
        widget(
            WidgetId::Group,
            selection.sort_by.label(),
            WidgetKind::Select,
            groups,
            selection.group.clone(),
        ),
        widget(
            WidgetId::PlotValue,
            "Phy. Parameters",
            WidgetKind::MenuButton,
            labels(&PlotValue::ALL, PlotValue::label),
            selection.plot_value.label().to_string(),
        ),
        widget(
            WidgetId::SlowControl,
            "Slow Control",
            WidgetKind::MenuButton,
            labels(&SlowControl::ALL, SlowControl::label),
            selection.slow_control.label().to_string(),
        ),
        widget(
            WidgetId::PlotType,
            "Plot type",
            WidgetKind::RadioButtons { vertical: true },
            labels(&PlotType::ALL, PlotType::label),
            selection.plot_type.label().to_string(),
        ),
        widget(
            WidgetId::Units,
            "Units",
            WidgetKind::RadioButtons { vertical: false },
            labels(&UnitMode::ALL, UnitMode::label),
            selection.units.label().to_string(),
        ),
        widget(
            WidgetId::Resample,
            "Resampled",
            WidgetKind::Slider {
                min: 0,
                max: MAX_RESAMPLE_MINUTES,
                suffix: "min",
            },
            vec![],
            selection.resample_minutes.to_string(),
        ),
        widget(
            WidgetId::PlotStyle,
            "Style",
            WidgetKind::RadioButtons { vertical: false },
            labels(&PlotStyle::ALL, PlotStyle::label),
            selection.plot_style.label().to_string(),
        ),
    ]
}

/// Compose the physics monitoring section around an already rendered figure
pub fn build_phy_section(
    monitor: &PhyMonitor,
    selection: &Selection,
    figure: Figure,
    widget_width: u32,
) -> PageSection {
    PageSection {
        name: Page::PhyMonitoring.title().to_string(),
        current_plot: format!("## {}", selection.plot_value.label()),
        widgets: phy_widgets(monitor, selection, widget_width),
        figure,
    }
}

/// Build the selection described by `(selector key, value)` pairs, starting from the
/// session's initial selection. Unknown keys and unparsable values are ignored.
pub fn selection_from_pairs<'a, I>(monitor: &PhyMonitor, pairs: I) -> Selection
where
    I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
{
    let mut selection = monitor.initial_selection();
    for id in WidgetId::ALL {
        let value = pairs
            .clone()
            .into_iter()
            .find(|(key, _)| *key == id.key())
            .map(|(_, v)| v);
        let Some(value) = value else {
            continue;
        };
        match id.event(value) {
            Some(event) => selection = monitor.apply(&selection, event),
            None => spdlog::debug!("Ignoring {}={}", id.key(), value),
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_map::{ChannelMap, Detector};
    use crate::config::Config;
    use crate::run_info::{RunDatabase, RunInfo};
    use std::collections::BTreeMap;

    fn monitor() -> PhyMonitor {
        let mut periods = BTreeMap::new();
        for (period, runs) in [("p03", ["r000", "r001"]), ("p04", ["r000", "r002"])] {
            let mut map = BTreeMap::new();
            for run in runs {
                map.insert(run.to_string(), RunInfo::default());
            }
            periods.insert(period.to_string(), map);
        }
        let det = |name: &str, rawid: u32, string: u32, cc4: &str| Detector {
            name: name.to_string(),
            rawid,
            string,
            position: 1,
            cc4_id: Some(cc4.to_string()),
        };
        let channels = ChannelMap::from_detectors(vec![
            det("V01", 1, 1, "A1"),
            det("V02", 2, 2, "B1"),
        ])
        .unwrap();
        PhyMonitor::from_parts(Config::default(), RunDatabase::from_map(periods), channels)
    }

    #[test]
    fn test_enabled_pages() {
        assert_eq!(enabled_pages::<&str>(&[]), vec![Page::PhyMonitoring, Page::Information]);
        assert_eq!(enabled_pages(&["phy", "cal"]), vec![Page::Information]);
        assert!(enabled_pages(&["info", "phy"]).is_empty());
    }

    #[test]
    fn test_widget_events() {
        assert_eq!(
            WidgetId::Resample.event("15 min"),
            Some(SelectionEvent::ResampleMinutes(15))
        );
        assert_eq!(WidgetId::Resample.event("abc"), None);
        assert_eq!(
            WidgetId::PlotValue.event("Noise"),
            Some(SelectionEvent::PlotValue(PlotValue::Noise))
        );
        assert_eq!(
            WidgetId::SortBy.event("CC4"),
            Some(SelectionEvent::SortBy(SortBy::Cc4))
        );
        assert_eq!(WidgetId::Units.event("percent"), None);
    }

    #[test]
    fn test_selection_from_pairs() {
        let mon = monitor();
        let initial = mon.initial_selection();
        assert_eq!((initial.period.as_str(), initial.run.as_str()), ("p04", "r002"));

        // Order of the pairs does not matter
        let pairs = [
            ("run", "r001"),
            ("group", "CC4 B1"),
            ("period", "p03"),
            ("sort_by", "CC4"),
            ("resampled", "0"),
            ("bogus", "1"),
        ];
        let sel = selection_from_pairs(&mon, pairs);
        assert_eq!(sel.period, "p03");
        assert_eq!(sel.run, "r001");
        assert_eq!(sel.sort_by, SortBy::Cc4);
        assert_eq!(sel.group, "CC4 B1");
        assert_eq!(sel.resample_minutes, 0);
    }

    #[test]
    fn test_phy_section() {
        let mon = monitor();
        let sel = mon.initial_selection();
        let section = build_phy_section(&mon, &sel, Figure::placeholder("empty"), 200);
        assert_eq!(section.current_plot, "## Cal. Gain");
        let run = section.widget(WidgetId::Run).unwrap();
        assert_eq!(run.options, vec!["r000", "r002"]);
        assert_eq!(run.selected, "r002");
        assert!(section.widgets.iter().all(|w| w.width == 200));
        let group = section.widget(WidgetId::Group).unwrap();
        assert_eq!(group.options, vec!["String 1", "String 2"]);
    }
}
