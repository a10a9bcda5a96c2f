use ndarray::Array2;
use std::path::{Path, PathBuf};

use super::catalogue::{data_key, SlowControl, UnitMode};
use super::channel_map::{ChannelMap, Detector};
use super::config::{metadata_path, Config, DataKind};
use super::error::{RetrievalError, StoreError};
use super::frame::{ColumnLabel, Frame, NANOS_PER_SECOND};
use super::hdf_reader::{FrameSource, PandasStore};
use super::plot_meta::{PlotInfo, PlotMetadata};
use super::run_info::RunDatabase;
use super::selection::Selection;

const PULSER_TAG: &str = "_pulser";
const RELATIVE_UNIT: &str = "%";
const SC_TIME_COLUMN: &str = "tstamp";
const SC_VALUE_COLUMN: &str = "value";
const SC_UNIT_COLUMN: &str = "unit";

/// The files backing one physics run
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub data_file: PathBuf,
    pub info_file: PathBuf,
    pub slow_control_file: PathBuf,
}

impl DataPaths {
    pub fn new(config: &Config, selection: &Selection) -> Self {
        let data_file = config.phy_data_file(&selection.period, &selection.run, DataKind::Geds);
        let info_file = metadata_path(&data_file);
        let slow_control_file =
            config.phy_data_file(&selection.period, &selection.run, DataKind::SlowControl);
        Self {
            data_file,
            info_file,
            slow_control_file,
        }
    }
}

/// The table keys holding the selected quantity, and its resolved info record
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKeys {
    pub value_key: String,
    pub mean_key: String,
    pub info: PlotInfo,
}

/// Slow control data overlaid on a time plot. Timestamps are UTC
#[derive(Debug, Clone, PartialEq)]
pub struct SlowControlSeries {
    pub name: String,
    pub unit: String,
    pub times: Vec<i64>,
    pub values: Vec<f64>,
}

impl SlowControlSeries {
    /// The series as a single column frame, for resampling
    pub fn to_frame(&self) -> Result<Frame, StoreError> {
        let values = Array2::from_shape_vec((self.values.len(), 1), self.values.clone())
            .map_err(|e| StoreError::MalformedTable {
                key: self.name.clone(),
                reason: e.to_string(),
            })?;
        Frame::try_new(
            &self.name,
            self.times.clone(),
            vec![ColumnLabel::Name(self.name.clone())],
            values,
        )
    }
}

/// Everything the plot builders need for one selection
#[derive(Debug, Clone, PartialEq)]
pub struct PhySeries {
    /// Full resolution values, one column per detector name
    pub values: Frame,
    /// Pre-aggregated means over the same detectors
    pub mean: Frame,
    pub info: PlotInfo,
    /// Detectors in column order
    pub detectors: Vec<Detector>,
    pub slow_control: Option<SlowControlSeries>,
}

/// Outcome of resolving a selection to data
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Found(Box<PhySeries>),
    /// The data needed for the selection is absent, with a message for the user
    Missing(String),
}

/// Read-only context shared by every retrieval of a session
#[derive(Debug, Clone, Copy)]
pub struct RetrievalContext<'a> {
    pub config: &'a Config,
    pub runs: &'a RunDatabase,
    pub channels: &'a ChannelMap,
}

/// The placeholder message for a selection without data
pub fn missing_message(runs: &RunDatabase, selection: &Selection) -> String {
    format!(
        "No data for run {}",
        runs.run_label(&selection.period, &selection.run)
    )
}

/// Work out which tables hold the selected quantity, using the metadata key listing.
///
/// Returns None when any of the required tables is not listed
pub fn resolve_keys(meta: &PlotMetadata, selection: &Selection) -> Option<ResolvedKeys> {
    let key = data_key(selection.plot_type, selection.plot_value);

    let mut info = match key.split_once(PULSER_TAG) {
        Some((prefix, _)) => {
            let info_key = format!("{prefix}_info");
            if !meta.has_key(&info_key) {
                return None;
            }
            let mut info = meta.info(&info_key)?.clone();
            info.label = if key.contains("Diff") {
                String::from("Gain to Pulser Difference")
            } else {
                String::from("Gain to Pulser Ratio")
            };
            info
        }
        None => {
            let info_key = format!("{key}_info");
            if !meta.has_key(&info_key) {
                return None;
            }
            meta.info(&info_key)?.clone()
        }
    };

    let value_key = match selection.units {
        UnitMode::Relative => {
            info.unit = String::from(RELATIVE_UNIT);
            format!("{key}_var")
        }
        UnitMode::Absolute => key.clone(),
    };
    if !meta.has_key(&value_key) {
        return None;
    }

    let mean_key = format!("{key}_mean");
    if !meta.has_key(&mean_key) {
        return None;
    }

    Some(ResolvedKeys {
        value_key,
        mean_key,
        info,
    })
}

/// Resolve a selection to data on disk using HDF5 monitoring files
pub fn retrieve(ctx: RetrievalContext<'_>, selection: &Selection) -> Retrieval {
    retrieve_with(ctx, selection, PandasStore::open)
}

/// Resolve a selection to data, opening stores with `open`.
///
/// Never fails: absent files, keys or channels, as well as read errors, yield
/// [`Retrieval::Missing`].
pub fn retrieve_with<S, O>(ctx: RetrievalContext<'_>, selection: &Selection, open: O) -> Retrieval
where
    S: FrameSource,
    O: Fn(&Path) -> Result<S, StoreError>,
{
    let missing = missing_message(ctx.runs, selection);
    let paths = DataPaths::new(ctx.config, selection);

    if !paths.data_file.exists() {
        spdlog::debug!("No data file at {}", paths.data_file.display());
        return Retrieval::Missing(missing);
    }

    let names = ctx.channels.group_channels(selection.sort_by, &selection.group);
    if names.is_empty() {
        spdlog::warn!("No channel names found for group {}", selection.group);
        return Retrieval::Missing(missing);
    }

    match load_series(ctx, selection, &paths, &names, &open) {
        Ok(Some(series)) => Retrieval::Found(Box::new(series)),
        Ok(None) => Retrieval::Missing(missing),
        Err(e) => {
            spdlog::error!("Failed to load data for {}: {}", missing, e);
            Retrieval::Missing(missing)
        }
    }
}

fn load_series<S, O>(
    ctx: RetrievalContext<'_>,
    selection: &Selection,
    paths: &DataPaths,
    names: &[String],
    open: &O,
) -> Result<Option<PhySeries>, RetrievalError>
where
    S: FrameSource,
    O: Fn(&Path) -> Result<S, StoreError>,
{
    let meta = PlotMetadata::read_file(&paths.info_file)?;
    let Some(keys) = resolve_keys(&meta, selection) else {
        spdlog::debug!(
            "Quantity {} is not available in {}",
            data_key(selection.plot_type, selection.plot_value),
            paths.info_file.display()
        );
        return Ok(None);
    };

    let store = open(&paths.data_file)?;
    let value_columns = store.column_labels(&keys.value_key)?;
    let mean_columns = store.column_labels(&keys.mean_key)?;

    // Channels of the group which exist in both tables, in group order
    let mut detectors: Vec<Detector> = Vec::new();
    let mut labels: Vec<ColumnLabel> = Vec::new();
    for name in names {
        let Some(det) = ctx.channels.detector(name) else {
            continue;
        };
        let label = ColumnLabel::RawId(det.rawid as i64);
        if value_columns.contains(&label) && mean_columns.contains(&label) {
            detectors.push(det.clone());
            labels.push(label);
        }
    }
    if labels.is_empty() {
        spdlog::warn!(
            "None of the channels of group {} are present in {}",
            selection.group,
            paths.data_file.display()
        );
        return Ok(None);
    }

    let relabel = |label: &ColumnLabel| match label {
        ColumnLabel::RawId(id) => match ctx.channels.name(*id as u32) {
            Some(name) => ColumnLabel::Name(name.to_string()),
            None => label.clone(),
        },
        ColumnLabel::Name(_) => label.clone(),
    };
    let values = store
        .read_frame(&keys.value_key)?
        .select(&labels)
        .rename(relabel);
    let mean = store
        .read_frame(&keys.mean_key)?
        .select(&labels)
        .rename(relabel);
    drop(store);

    let slow_control = load_slow_control(selection.slow_control, &paths.slow_control_file, open);

    Ok(Some(PhySeries {
        values,
        mean,
        info: keys.info,
        detectors,
        slow_control,
    }))
}

/// Load the slow control overlay. Absent or unreadable data simply leaves it out
fn load_slow_control<S, O>(sc: SlowControl, path: &Path, open: &O) -> Option<SlowControlSeries>
where
    S: FrameSource,
    O: Fn(&Path) -> Result<S, StoreError>,
{
    let key = sc.key()?;
    if !path.exists() {
        spdlog::debug!("No slow control file at {}", path.display());
        return None;
    }
    match read_slow_control(sc, key, path, open) {
        Ok(series) => series,
        Err(e) => {
            spdlog::warn!("Could not read slow control {}: {}", key, e);
            None
        }
    }
}

fn read_slow_control<S, O>(
    sc: SlowControl,
    key: &str,
    path: &Path,
    open: &O,
) -> Result<Option<SlowControlSeries>, StoreError>
where
    S: FrameSource,
    O: Fn(&Path) -> Result<S, StoreError>,
{
    let store = open(path)?;
    if !store.has_key(key) {
        return Ok(None);
    }
    let frame = store.read_frame(key)?;
    let column = |name: &str| {
        frame
            .column(&ColumnLabel::Name(name.to_string()))
            .ok_or_else(|| StoreError::MissingColumn {
                key: key.to_string(),
                column: name.to_string(),
            })
    };
    let tstamps = column(SC_TIME_COLUMN)?;
    let raw_values = column(SC_VALUE_COLUMN)?;

    let mut times = Vec::with_capacity(tstamps.len());
    let mut values = Vec::with_capacity(tstamps.len());
    for (t, v) in tstamps.iter().zip(raw_values.iter()) {
        if t.is_finite() {
            times.push((t * NANOS_PER_SECOND as f64) as i64);
            values.push(*v);
        }
    }
    if times.is_empty() {
        return Ok(None);
    }

    let unit = slow_control_unit(&store, key, path);

    Ok(Some(SlowControlSeries {
        name: sc.label().to_string(),
        unit,
        times,
        values,
    }))
}

/// The unit of a slow control table, from the `<key>_info` record of the `-info.yaml` beside
/// the file, else from a string `unit` column. Pickled object columns are not readable.
fn slow_control_unit<S: FrameSource>(store: &S, key: &str, path: &Path) -> String {
    let info_file = metadata_path(path);
    if info_file.exists() {
        match PlotMetadata::read_file(&info_file) {
            Ok(meta) => {
                if let Some(info) = meta.info(&format!("{key}_info")) {
                    if !info.unit.is_empty() {
                        return info.unit.clone();
                    }
                }
            }
            Err(e) => spdlog::warn!("Could not read {}: {}", info_file.display(), e),
        }
    }
    match store.read_text(key, SC_UNIT_COLUMN) {
        Ok(units) => units.into_iter().next().unwrap_or_default(),
        Err(e) => {
            spdlog::debug!("Slow control {} has no readable unit: {}", key, e);
            String::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// An in-memory FrameSource which counts how many tables were read
    #[derive(Debug, Clone, Default)]
    pub struct MemorySource {
        pub frames: HashMap<String, Frame>,
        pub units: HashMap<String, String>,
        pub reads: Rc<Cell<usize>>,
    }

    impl FrameSource for MemorySource {
        fn has_key(&self, key: &str) -> bool {
            self.frames.contains_key(key)
        }

        fn column_labels(&self, key: &str) -> Result<Vec<ColumnLabel>, StoreError> {
            self.frames
                .get(key)
                .map(|f| f.columns().to_vec())
                .ok_or_else(|| StoreError::MissingKey(key.to_string()))
        }

        fn read_frame(&self, key: &str) -> Result<Frame, StoreError> {
            self.reads.set(self.reads.get() + 1);
            self.frames
                .get(key)
                .cloned()
                .ok_or_else(|| StoreError::MissingKey(key.to_string()))
        }

        fn read_text(&self, key: &str, column: &str) -> Result<Vec<String>, StoreError> {
            self.units
                .get(key)
                .map(|u| vec![u.clone()])
                .ok_or_else(|| StoreError::MissingColumn {
                    key: key.to_string(),
                    column: column.to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemorySource;
    use super::*;
    use crate::catalogue::{PlotType, PlotValue};
    use crate::channel_map::SortBy;
    use crate::run_info::RunInfo;
    use crate::selection::DEFAULT_RESAMPLE_MINUTES;
    use ndarray::array;
    use std::collections::BTreeMap;

    const INFO: &str = "
keys: [IsPulser_TrapemaxCtcCal_info, IsPulser_TrapemaxCtcCal, IsPulser_TrapemaxCtcCal_var,
       IsPulser_TrapemaxCtcCal_mean, IsPulser_Trapemax_info,
       IsPulser_Trapemax_pulser01anaDiff_var, IsPulser_Trapemax_pulser01anaDiff_mean,
       IsPulser_Trapemax_pulser01anaRatio_var, IsPulser_Trapemax_pulser01anaRatio_mean]
IsPulser_TrapemaxCtcCal_info: {label: Energy, unit: keV, parameter: cuspEmax_ctc_cal}
IsPulser_Trapemax_info: {label: Gain, unit: ADC, parameter: trapEmax}
";

    struct Fixture {
        _dir: tempfile::TempDir,
        config: Config,
        runs: RunDatabase,
        channels: ChannelMap,
    }

    impl Fixture {
        fn new(with_files: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Config {
                phy: dir.path().to_path_buf(),
                ..Default::default()
            };
            if with_files {
                std::fs::create_dir_all(config.phy_run_directory("p03", "r000")).unwrap();
                let data = config.phy_data_file("p03", "r000", DataKind::Geds);
                std::fs::write(&data, b"").unwrap();
                std::fs::write(metadata_path(&data), INFO).unwrap();
            }
            let mut runs = BTreeMap::new();
            runs.insert(String::from("r000"), RunInfo::default());
            let mut periods = BTreeMap::new();
            periods.insert(String::from("p03"), runs);
            let channels = ChannelMap::from_detectors(vec![
                Detector {
                    name: String::from("V01"),
                    rawid: 11,
                    string: 1,
                    position: 1,
                    cc4_id: None,
                },
                Detector {
                    name: String::from("V02"),
                    rawid: 12,
                    string: 1,
                    position: 2,
                    cc4_id: None,
                },
                Detector {
                    name: String::from("V03"),
                    rawid: 13,
                    string: 2,
                    position: 1,
                    cc4_id: None,
                },
            ])
            .unwrap();
            Self {
                _dir: dir,
                config,
                runs: RunDatabase::from_map(periods),
                channels,
            }
        }

        fn ctx(&self) -> RetrievalContext<'_> {
            RetrievalContext {
                config: &self.config,
                runs: &self.runs,
                channels: &self.channels,
            }
        }
    }

    fn selection() -> Selection {
        Selection {
            period: String::from("p03"),
            run: String::from("r000"),
            sort_by: SortBy::String,
            group: String::from("String 1"),
            plot_type: PlotType::PulserEvents,
            plot_value: PlotValue::CalGain,
            plot_style: Default::default(),
            resample_minutes: DEFAULT_RESAMPLE_MINUTES,
            units: UnitMode::Relative,
            slow_control: SlowControl::None,
        }
    }

    fn table(rawids: &[i64]) -> Frame {
        let values = Array2::from_shape_fn((3, rawids.len()), |(r, c)| (r * 10 + c) as f64);
        Frame::try_new(
            "t",
            vec![0, NANOS_PER_SECOND, 2 * NANOS_PER_SECOND],
            rawids.iter().map(|r| ColumnLabel::RawId(*r)).collect(),
            values,
        )
        .unwrap()
    }

    fn source(value_cols: &[i64], mean_cols: &[i64]) -> MemorySource {
        let mut src = MemorySource::default();
        src.frames
            .insert(String::from("IsPulser_TrapemaxCtcCal_var"), table(value_cols));
        src.frames
            .insert(String::from("IsPulser_TrapemaxCtcCal_mean"), table(mean_cols));
        src
    }

    #[test]
    fn test_missing_file_is_placeholder() {
        let fx = Fixture::new(false);
        let result = retrieve(fx.ctx(), &selection());
        match result {
            Retrieval::Missing(msg) => {
                assert!(msg.contains("r000"));
                assert_eq!(msg, "No data for run L200-p03-r000");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn test_resolve_keys() {
        let meta = PlotMetadata::from_yaml(INFO).unwrap();
        let keys = resolve_keys(&meta, &selection()).unwrap();
        assert_eq!(keys.value_key, "IsPulser_TrapemaxCtcCal_var");
        assert_eq!(keys.mean_key, "IsPulser_TrapemaxCtcCal_mean");
        assert_eq!(keys.info.unit, "%");

        let mut sel = selection();
        sel.units = UnitMode::Absolute;
        let keys = resolve_keys(&meta, &sel).unwrap();
        assert_eq!(keys.value_key, "IsPulser_TrapemaxCtcCal");
        assert_eq!(keys.info.unit, "keV");

        sel.plot_value = PlotValue::GainToPulserDiff;
        assert!(resolve_keys(&meta, &sel).is_none());
        sel.units = UnitMode::Relative;
        let keys = resolve_keys(&meta, &sel).unwrap();
        assert_eq!(keys.info.label, "Gain to Pulser Difference");
        assert_eq!(keys.info.parameter.as_deref(), Some("trapEmax"));

        sel.plot_value = PlotValue::GainToPulserRatio;
        let keys = resolve_keys(&meta, &sel).unwrap();
        assert_eq!(keys.value_key, "IsPulser_Trapemax_pulser01anaRatio_var");
        assert_eq!(keys.mean_key, "IsPulser_Trapemax_pulser01anaRatio_mean");
        assert_eq!(keys.info.label, "Gain to Pulser Ratio");
        assert_eq!(keys.info.unit, "%");

        sel.plot_value = PlotValue::Noise;
        assert!(resolve_keys(&meta, &sel).is_none());
    }

    #[test]
    fn test_found_series_is_filtered_and_relabelled() {
        let fx = Fixture::new(true);
        let src = source(&[12, 11, 13], &[11, 12]);
        let result = retrieve_with(fx.ctx(), &selection(), |_| Ok(src.clone()));
        let Retrieval::Found(series) = result else {
            panic!()
        };
        let names = vec![
            ColumnLabel::Name(String::from("V01")),
            ColumnLabel::Name(String::from("V02")),
        ];
        assert_eq!(series.values.columns(), names.as_slice());
        assert_eq!(series.mean.columns(), names.as_slice());
        assert_eq!(series.detectors.len(), 2);
        assert_eq!(series.info.label, "Energy");
        // rawid 11 is the second column of the value table
        let v01 = series
            .values
            .column(&ColumnLabel::Name(String::from("V01")))
            .unwrap();
        assert_eq!(v01.to_vec(), vec![1.0, 11.0, 21.0]);
        assert!(series.slow_control.is_none());
    }

    #[test]
    fn test_empty_intersection_reads_nothing() {
        let fx = Fixture::new(true);
        let src = source(&[13], &[13]);
        let reads = src.reads.clone();
        let result = retrieve_with(fx.ctx(), &selection(), |_| Ok(src.clone()));
        assert!(matches!(result, Retrieval::Missing(_)));
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_empty_group_is_placeholder() {
        let fx = Fixture::new(true);
        let mut sel = selection();
        sel.group = String::from("String 42");
        let result = retrieve_with(fx.ctx(), &sel, |_| -> Result<MemorySource, StoreError> {
            panic!("store must not be opened")
        });
        assert!(matches!(result, Retrieval::Missing(_)));
    }

    #[test]
    fn test_missing_table_is_placeholder() {
        let fx = Fixture::new(true);
        let mut src = source(&[11], &[11]);
        src.frames.remove("IsPulser_TrapemaxCtcCal_mean");
        let result = retrieve_with(fx.ctx(), &selection(), |_| Ok(src.clone()));
        assert!(matches!(result, Retrieval::Missing(_)));
    }

    #[test]
    fn test_slow_control_overlay() {
        let fx = Fixture::new(true);
        let sc_file = fx.config.phy_data_file("p03", "r000", DataKind::SlowControl);
        std::fs::write(&sc_file, b"").unwrap();
        let mut src = source(&[11, 12], &[11, 12]);
        src.frames.insert(
            String::from("RREiT"),
            Frame::try_new(
                "RREiT",
                vec![0, 1],
                vec![
                    ColumnLabel::Name(String::from("tstamp")),
                    ColumnLabel::Name(String::from("value")),
                ],
                array![[100.0, 20.0], [f64::NAN, 30.0]],
            )
            .unwrap(),
        );
        src.units.insert(String::from("RREiT"), String::from("C"));
        let mut sel = selection();
        sel.slow_control = SlowControl::RREiT;
        let Retrieval::Found(series) = retrieve_with(fx.ctx(), &sel, |_| Ok(src.clone())) else {
            panic!()
        };
        let sc = series.slow_control.unwrap();
        assert_eq!(sc.name, "RREiT");
        assert_eq!(sc.unit, "C");
        assert_eq!(sc.times, vec![100 * NANOS_PER_SECOND]);
        assert_eq!(sc.values, vec![20.0]);
    }

    #[test]
    fn test_slow_control_unit_from_info_file() {
        let fx = Fixture::new(true);
        let sc_file = fx.config.phy_data_file("p03", "r000", DataKind::SlowControl);
        std::fs::write(&sc_file, b"").unwrap();
        std::fs::write(
            metadata_path(&sc_file),
            "keys: [RREiT]\nRREiT_info: {label: RREiT, unit: C}\n",
        )
        .unwrap();
        let mut src = source(&[11], &[11]);
        src.frames.insert(
            String::from("RREiT"),
            Frame::try_new(
                "RREiT",
                vec![0],
                vec![
                    ColumnLabel::Name(String::from("tstamp")),
                    ColumnLabel::Name(String::from("value")),
                ],
                array![[100.0, 20.0]],
            )
            .unwrap(),
        );
        // The unit column is an unreadable object block here
        assert!(src.read_text("RREiT", "unit").is_err());
        let mut sel = selection();
        sel.slow_control = SlowControl::RREiT;
        let Retrieval::Found(series) = retrieve_with(fx.ctx(), &sel, |_| Ok(src.clone())) else {
            panic!()
        };
        assert_eq!(series.slow_control.unwrap().unit, "C");
    }
}
