use serde::{Deserialize, Serialize};

use super::catalogue::{PlotStyle, PlotType, PlotValue, SlowControl, UnitMode};
use super::channel_map::{ChannelMap, SortBy};
use super::run_info::RunDatabase;

pub const MAX_RESAMPLE_MINUTES: u32 = 60;
pub const DEFAULT_RESAMPLE_MINUTES: u32 = 60;

/// An immutable snapshot of everything the user has selected.
///
/// Snapshots are never edited in place; [`Selection::apply`] produces the next snapshot,
/// which is then handed to the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub period: String,
    pub run: String,
    pub sort_by: SortBy,
    pub group: String,
    pub plot_type: PlotType,
    pub plot_value: PlotValue,
    pub plot_style: PlotStyle,
    pub resample_minutes: u32,
    pub units: UnitMode,
    pub slow_control: SlowControl,
}

/// A single user interaction with one of the selectors
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Period(String),
    Run(String),
    SortBy(SortBy),
    Group(String),
    PlotType(PlotType),
    PlotValue(PlotValue),
    PlotStyle(PlotStyle),
    ResampleMinutes(u32),
    Units(UnitMode),
    SlowControl(SlowControl),
}

impl Selection {
    /// The selection a new session starts with: the most recent run and the first group
    pub fn initial(runs: &RunDatabase, channels: &ChannelMap) -> Self {
        let (period, run) = runs
            .latest()
            .map(|(p, r)| (p.to_string(), r.to_string()))
            .unwrap_or_default();
        let sort_by = SortBy::default();
        let group = first_group(channels, sort_by);
        Self {
            period,
            run,
            sort_by,
            group,
            plot_type: PlotType::default(),
            plot_value: PlotValue::default(),
            plot_style: PlotStyle::default(),
            resample_minutes: DEFAULT_RESAMPLE_MINUTES,
            units: UnitMode::default(),
            slow_control: SlowControl::default(),
        }
    }

    /// Produce the snapshot that follows this one after `event`.
    ///
    /// Events naming an unknown period, run or group leave the selection unchanged. Changing
    /// the period moves to the last run of the new period unless the current run exists there
    /// too. Changing the grouping keeps the group if it still exists, otherwise picks the first.
    pub fn apply(&self, event: SelectionEvent, runs: &RunDatabase, channels: &ChannelMap) -> Self {
        let mut next = self.clone();
        match event {
            SelectionEvent::Period(period) => {
                if runs.get(&period, &self.run).is_some() {
                    next.period = period;
                } else if let Some(run) = runs.last_run(&period) {
                    next.run = run.to_string();
                    next.period = period;
                }
            }
            SelectionEvent::Run(run) => {
                if runs.get(&self.period, &run).is_some() {
                    next.run = run;
                }
            }
            SelectionEvent::SortBy(sort_by) => {
                next.sort_by = sort_by;
                if channels.group_channels(sort_by, &self.group).is_empty() {
                    next.group = first_group(channels, sort_by);
                }
            }
            SelectionEvent::Group(group) => {
                if channels.groups(self.sort_by).iter().any(|g| g.name == group) {
                    next.group = group;
                }
            }
            SelectionEvent::PlotType(t) => next.plot_type = t,
            SelectionEvent::PlotValue(v) => next.plot_value = v,
            SelectionEvent::PlotStyle(s) => next.plot_style = s,
            SelectionEvent::ResampleMinutes(m) => {
                next.resample_minutes = m.min(MAX_RESAMPLE_MINUTES)
            }
            SelectionEvent::Units(u) => next.units = u,
            SelectionEvent::SlowControl(sc) => next.slow_control = sc,
        }
        next
    }

    /// The resampling interval in seconds, None when resampling is disabled
    pub fn resample_seconds(&self) -> Option<i64> {
        match self.resample_minutes {
            0 => None,
            m => Some(m as i64 * 60),
        }
    }
}

fn first_group(channels: &ChannelMap, sort_by: SortBy) -> String {
    channels
        .groups(sort_by)
        .into_iter()
        .next()
        .map(|g| g.name)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_map::Detector;
    use crate::run_info::RunInfo;
    use std::collections::BTreeMap;

    fn context() -> (RunDatabase, ChannelMap) {
        let mut periods = BTreeMap::new();
        let mut p03 = BTreeMap::new();
        p03.insert(String::from("r000"), RunInfo::default());
        p03.insert(String::from("r001"), RunInfo::default());
        let mut p04 = BTreeMap::new();
        p04.insert(String::from("r000"), RunInfo::default());
        periods.insert(String::from("p03"), p03);
        periods.insert(String::from("p04"), p04);
        let channels = ChannelMap::from_detectors(vec![
            Detector {
                name: String::from("V01"),
                rawid: 1,
                string: 1,
                position: 1,
                cc4_id: Some(String::from("A1")),
            },
            Detector {
                name: String::from("V02"),
                rawid: 2,
                string: 2,
                position: 1,
                cc4_id: Some(String::from("B1")),
            },
        ])
        .unwrap();
        (RunDatabase::from_map(periods), channels)
    }

    #[test]
    fn test_initial_selection() {
        let (runs, channels) = context();
        let sel = Selection::initial(&runs, &channels);
        assert_eq!(sel.period, "p04");
        assert_eq!(sel.run, "r000");
        assert_eq!(sel.group, "String 1");
        assert_eq!(sel.resample_minutes, 60);
    }

    #[test]
    fn test_apply_returns_new_snapshot() {
        let (runs, channels) = context();
        let sel = Selection::initial(&runs, &channels);
        let next = sel.apply(SelectionEvent::Units(UnitMode::Absolute), &runs, &channels);
        assert_eq!(sel.units, UnitMode::Relative);
        assert_eq!(next.units, UnitMode::Absolute);
        assert_ne!(sel, next);
    }

    #[test]
    fn test_period_change_moves_run() {
        let (runs, channels) = context();
        let sel = Selection::initial(&runs, &channels);
        let next = sel.apply(SelectionEvent::Period(String::from("p03")), &runs, &channels);
        assert_eq!(next.period, "p03");
        assert_eq!(next.run, "r000");
        let next = next.apply(SelectionEvent::Run(String::from("r001")), &runs, &channels);
        let next = next.apply(SelectionEvent::Period(String::from("p04")), &runs, &channels);
        assert_eq!(next.run, "r000");
        let unchanged = next.apply(SelectionEvent::Period(String::from("p99")), &runs, &channels);
        assert_eq!(unchanged, next);
    }

    #[test]
    fn test_sort_by_change_resets_group() {
        let (runs, channels) = context();
        let sel = Selection::initial(&runs, &channels);
        let next = sel.apply(SelectionEvent::SortBy(SortBy::Cc4), &runs, &channels);
        assert_eq!(next.group, "CC4 A1");
        let next = next.apply(SelectionEvent::Group(String::from("CC4 B1")), &runs, &channels);
        assert_eq!(next.group, "CC4 B1");
        let same = next.apply(SelectionEvent::Group(String::from("String 1")), &runs, &channels);
        assert_eq!(same.group, "CC4 B1");
    }

    #[test]
    fn test_resample_clamped() {
        let (runs, channels) = context();
        let sel = Selection::initial(&runs, &channels);
        let next = sel.apply(SelectionEvent::ResampleMinutes(600), &runs, &channels);
        assert_eq!(next.resample_minutes, 60);
        assert_eq!(next.resample_seconds(), Some(3600));
        let off = next.apply(SelectionEvent::ResampleMinutes(0), &runs, &channels);
        assert_eq!(off.resample_seconds(), None);
    }
}
