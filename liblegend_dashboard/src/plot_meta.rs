use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

use super::error::PlotMetaError;

const KEYS_NAME: &str = "keys";
const INFO_SUFFIX: &str = "_info";

/// Descriptive record of a monitored quantity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotInfo {
    pub label: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub unit_label: Option<String>,
}

impl PlotInfo {
    /// The unit shown on histogram axes, falling back to the plain unit
    pub fn axis_unit(&self) -> &str {
        self.unit_label.as_deref().unwrap_or(&self.unit)
    }

    /// The name of the underlying parameter, falling back to the label
    pub fn parameter_name(&self) -> &str {
        self.parameter.as_deref().unwrap_or(&self.label)
    }
}

/// The companion `-info.yaml` file of a monitoring file: the list of tables it contains and
/// an info record per quantity
#[derive(Debug, Clone, Default)]
pub struct PlotMetadata {
    keys: Vec<String>,
    infos: FxHashMap<String, PlotInfo>,
}

impl PlotMetadata {
    pub fn read_file(path: &Path) -> Result<Self, PlotMetaError> {
        if !path.exists() {
            return Err(PlotMetaError::BadFilePath(path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self, PlotMetaError> {
        let root = serde_yaml::from_str::<Value>(yaml_str)?;
        let Value::Mapping(mapping) = root else {
            return Err(PlotMetaError::BadEntry(String::from("<root>")));
        };

        let mut meta = PlotMetadata::default();
        for (key, value) in mapping.into_iter() {
            let Some(name) = key.as_str() else {
                continue;
            };
            if name == KEYS_NAME {
                meta.keys = serde_yaml::from_value(value)?;
            } else if name.ends_with(INFO_SUFFIX) {
                if !value.is_mapping() {
                    return Err(PlotMetaError::BadEntry(name.to_string()));
                }
                meta.infos
                    .insert(name.to_string(), serde_yaml::from_value(value)?);
            }
        }
        Ok(meta)
    }

    /// Whether the key is listed as present in the monitoring file
    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn info(&self, info_key: &str) -> Option<&PlotInfo> {
        self.infos.get(info_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = "
keys:
  - IsPulser_Baseline
  - IsPulser_Baseline_info
  - IsPulser_Baseline_var
  - IsPulser_Baseline_mean
IsPulser_Baseline_info:
  label: FPGA baseline
  unit: ADC
  parameter: baseline
  extra: ignored
IsPulser_Trapemax_info:
  label: Gain
  unit: ADC
  unit_label: a.u.
";

    #[test]
    fn test_parse_metadata() {
        let meta = PlotMetadata::from_yaml(INFO).unwrap();
        assert!(meta.has_key("IsPulser_Baseline_var"));
        assert!(!meta.has_key("IsPulser_Trapemax_info"));
        let info = meta.info("IsPulser_Baseline_info").unwrap();
        assert_eq!(info.label, "FPGA baseline");
        assert_eq!(info.axis_unit(), "ADC");
        assert_eq!(info.parameter_name(), "baseline");
        let gain = meta.info("IsPulser_Trapemax_info").unwrap();
        assert_eq!(gain.axis_unit(), "a.u.");
        assert_eq!(gain.parameter_name(), "Gain");
    }

    #[test]
    fn test_bad_entry() {
        match PlotMetadata::from_yaml("keys: []\nfoo_info: 3\n") {
            Err(PlotMetaError::BadEntry(name)) => assert_eq!(name, "foo_info"),
            _ => panic!(),
        }
    }
}
