use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::UtcOffset;

use super::error::ConfigError;

/// Token which expands to the directory holding the configuration file
const CONFIG_DIR_TOKEN: &str = "$_";
const PHY_PLOT_DIRECTORY: &str = "generated/plt/hit/phy";
const DEFAULT_RUN_INFO_NAME: &str = "runinfo.yaml";
const DEFAULT_CHANNEL_MAP_NAME: &str = "channelmap.yaml";
const DEFAULT_DISPLAY_OFFSET_HOURS: i8 = 2;

fn default_display_offset() -> i8 {
    DEFAULT_DISPLAY_OFFSET_HOURS
}

/// The kinds of monitoring files written per physics run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Geds,
    SlowControl,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geds => "geds",
            Self::SlowControl => "slow_control",
        }
    }
}

/// Structure representing the dashboard configuration. Contains the locations of the
/// production data trees.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base: PathBuf,
    pub cal: PathBuf,
    pub phy: PathBuf,
    pub sipm: PathBuf,
    pub muon: PathBuf,
    pub tmp: PathBuf,
    pub llama: PathBuf,
    #[serde(default)]
    pub run_info: Option<PathBuf>,
    #[serde(default)]
    pub channel_map: Option<PathBuf>,
    #[serde(default = "default_display_offset")]
    pub display_utc_offset_hours: i8,
}

impl Default for Config {
    /// Generate a new Config object. All paths will be empty/invalid
    fn default() -> Self {
        Self {
            base: PathBuf::from("None"),
            cal: PathBuf::from("None"),
            phy: PathBuf::from("None"),
            sipm: PathBuf::from("None"),
            muon: PathBuf::from("None"),
            tmp: PathBuf::from("None"),
            llama: PathBuf::from("None"),
            run_info: None,
            channel_map: None,
            display_utc_offset_hours: DEFAULT_DISPLAY_OFFSET_HOURS,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config with all paths resolved against the directory of the file
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;
        let mut config = serde_yaml::from_str::<Self>(&yaml_str)?;
        // A bare file name has an empty parent
        let config_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        Ok(config)
    }

    /// Expand the `$_` token and anchor relative paths at `config_dir`
    pub fn resolve_paths(&mut self, config_dir: &Path) {
        for path in [
            &mut self.base,
            &mut self.cal,
            &mut self.phy,
            &mut self.sipm,
            &mut self.muon,
            &mut self.tmp,
            &mut self.llama,
        ] {
            *path = resolve_path(path, config_dir);
        }
        for path in [&mut self.run_info, &mut self.channel_map]
            .into_iter()
            .flatten()
        {
            *path = resolve_path(path, config_dir);
        }
    }

    /// Get the directory holding the physics monitoring files of a run
    pub fn phy_run_directory(&self, period: &str, run: &str) -> PathBuf {
        self.phy.join(PHY_PLOT_DIRECTORY).join(period).join(run)
    }

    /// Get the path to a physics monitoring file, following the L200 naming convention
    pub fn phy_data_file(&self, period: &str, run: &str, kind: DataKind) -> PathBuf {
        self.phy_run_directory(period, run)
            .join(format!("l200-{period}-{run}-phy-{}.hdf", kind.as_str()))
    }

    /// Get the path to the run information database
    pub fn run_info_path(&self) -> PathBuf {
        match &self.run_info {
            Some(p) => p.clone(),
            None => self.base.join(DEFAULT_RUN_INFO_NAME),
        }
    }

    /// Get the path to the channel map
    pub fn channel_map_path(&self) -> PathBuf {
        match &self.channel_map {
            Some(p) => p.clone(),
            None => self.base.join(DEFAULT_CHANNEL_MAP_NAME),
        }
    }

    /// The fixed civil-time offset used to display timestamps
    pub fn display_offset(&self) -> UtcOffset {
        match UtcOffset::from_hms(self.display_utc_offset_hours, 0, 0) {
            Ok(offset) => offset,
            Err(e) => {
                spdlog::warn!(
                    "Invalid display_utc_offset_hours {}, displaying UTC: {}",
                    self.display_utc_offset_hours,
                    e
                );
                UtcOffset::UTC
            }
        }
    }
}

/// Get the metadata file that accompanies a monitoring file (`.hdf` -> `-info.yaml`)
pub fn metadata_path(data_file: &Path) -> PathBuf {
    let name = data_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let info_name = match name.strip_suffix(".hdf") {
        Some(stem) => format!("{stem}-info.yaml"),
        None => format!("{name}-info.yaml"),
    };
    data_file.with_file_name(info_name)
}

fn resolve_path(path: &Path, config_dir: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = if raw.contains(CONFIG_DIR_TOKEN) {
        PathBuf::from(raw.replace(CONFIG_DIR_TOKEN, &config_dir.to_string_lossy()))
    } else {
        path.to_path_buf()
    };
    if expanded.is_relative() {
        config_dir.join(expanded)
    } else {
        expanded
    }
}
