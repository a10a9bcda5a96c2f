//! The fixed selector tables of the physics monitoring page.
//!
//! Each selector is an enum carrying its display label and the key fragment used inside the
//! monitoring files.
use serde::{Deserialize, Serialize};

/// Which event class the monitored quantity was computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlotType {
    #[default]
    PulserEvents,
    BaselineEvents,
}

impl PlotType {
    pub const ALL: [PlotType; 2] = [PlotType::PulserEvents, PlotType::BaselineEvents];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PulserEvents => "Pulser Events",
            Self::BaselineEvents => "Baseline Events",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::PulserEvents => "IsPulser",
            Self::BaselineEvents => "IsBsln",
        }
    }
}

/// The monitored quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlotValue {
    BaselineFpga,
    BaselineMean,
    Noise,
    Gain,
    #[default]
    CalGain,
    GainToPulserRatio,
    GainToPulserDiff,
    PsdClassifier,
}

impl PlotValue {
    pub const ALL: [PlotValue; 8] = [
        PlotValue::BaselineFpga,
        PlotValue::BaselineMean,
        PlotValue::Noise,
        PlotValue::Gain,
        PlotValue::CalGain,
        PlotValue::GainToPulserRatio,
        PlotValue::GainToPulserDiff,
        PlotValue::PsdClassifier,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::BaselineFpga => "Baseline FPGA",
            Self::BaselineMean => "Baseline Mean",
            Self::Noise => "Noise",
            Self::Gain => "Gain",
            Self::CalGain => "Cal. Gain",
            Self::GainToPulserRatio => "Gain to Pulser Ratio",
            Self::GainToPulserDiff => "Gain to Pulser Diff.",
            Self::PsdClassifier => "PSD Classifier",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::BaselineFpga => "Baseline",
            Self::BaselineMean => "BlMean",
            Self::Noise => "BlStd",
            Self::Gain => "Trapemax",
            Self::CalGain => "TrapemaxCtcCal",
            Self::GainToPulserRatio => "Trapemax_pulser01anaRatio",
            Self::GainToPulserDiff => "Trapemax_pulser01anaDiff",
            Self::PsdClassifier => "AoeCustom",
        }
    }
}

/// Whether values are shown as relative variation (%) or in absolute units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitMode {
    #[default]
    Relative,
    Absolute,
}

impl UnitMode {
    pub const ALL: [UnitMode; 2] = [UnitMode::Relative, UnitMode::Absolute];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Relative => "Relative",
            Self::Absolute => "Absolute",
        }
    }
}

/// Slow control quantity overlaid on time plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlowControl {
    #[default]
    None,
    DaqLeftTemp1,
    DaqLeftTemp2,
    DaqRightTemp1,
    DaqRightTemp2,
    RREiT,
    RRNTe,
    RRSTe,
    ZulTRr,
}

impl SlowControl {
    pub const ALL: [SlowControl; 9] = [
        SlowControl::None,
        SlowControl::DaqLeftTemp1,
        SlowControl::DaqLeftTemp2,
        SlowControl::DaqRightTemp1,
        SlowControl::DaqRightTemp2,
        SlowControl::RREiT,
        SlowControl::RRNTe,
        SlowControl::RRSTe,
        SlowControl::ZulTRr,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::DaqLeftTemp1 => "DAQ Temp. Left 1",
            Self::DaqLeftTemp2 => "DAQ Temp. Left 2",
            Self::DaqRightTemp1 => "DAQ Temp. Right 1",
            Self::DaqRightTemp2 => "DAQ Temp. Right 2",
            Self::RREiT => "RREiT",
            Self::RRNTe => "RRNTe",
            Self::RRSTe => "RRSTe",
            Self::ZulTRr => "ZUL_T_RR",
        }
    }

    /// The key of the slow control table, None when no overlay is requested
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::DaqLeftTemp1 => Some("DaqLeft_Temp1"),
            Self::DaqLeftTemp2 => Some("DaqLeft_Temp2"),
            Self::DaqRightTemp1 => Some("DaqRight_Temp1"),
            Self::DaqRightTemp2 => Some("DaqRight_Temp2"),
            Self::RREiT => Some("RREiT"),
            Self::RRNTe => Some("RRNTe"),
            Self::RRSTe => Some("RRSTe"),
            Self::ZulTRr => Some("ZUL_T_RR"),
        }
    }
}

/// How the retrieved series is visualised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlotStyle {
    #[default]
    Time,
    Histogram,
}

impl PlotStyle {
    pub const ALL: [PlotStyle; 2] = [PlotStyle::Time, PlotStyle::Histogram];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Time => "Time",
            Self::Histogram => "Histogram",
        }
    }
}

/// Find a selector value by its display label
pub fn from_label<T: Copy>(all: &[T], label: &str, get_label: fn(&T) -> &'static str) -> Option<T> {
    all.iter().find(|v| get_label(v) == label).copied()
}

/// The table key of a monitored quantity, `<type>_<value>`
pub fn data_key(plot_type: PlotType, plot_value: PlotValue) -> String {
    format!("{}_{}", plot_type.key(), plot_value.key())
}
