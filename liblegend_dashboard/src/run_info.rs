use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::RunInfoError;

fn default_experiment() -> String {
    String::from("L200")
}

/// Information about a single run as recorded in the run database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default = "default_experiment")]
    pub experiment: String,
    #[serde(default)]
    pub start_key: Option<String>,
    #[serde(default)]
    pub livetime_in_s: Option<f64>,
}

impl Default for RunInfo {
    fn default() -> Self {
        Self {
            experiment: default_experiment(),
            start_key: None,
            livetime_in_s: None,
        }
    }
}

/// Read-only mapping of period -> run -> RunInfo, loaded once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunDatabase {
    periods: BTreeMap<String, BTreeMap<String, RunInfo>>,
}

impl RunDatabase {
    /// Read the run database from a YAML file
    pub fn read_file(path: &Path) -> Result<Self, RunInfoError> {
        if !path.exists() {
            return Err(RunInfoError::BadFilePath(path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(path)?;
        let db = serde_yaml::from_str::<Self>(&yaml_str)?;
        if db.periods.values().all(|runs| runs.is_empty()) {
            return Err(RunInfoError::NoRuns(path.to_path_buf()));
        }
        Ok(db)
    }

    pub fn from_map(periods: BTreeMap<String, BTreeMap<String, RunInfo>>) -> Self {
        Self { periods }
    }

    /// All periods which contain at least one run, in ascending order
    pub fn periods(&self) -> Vec<&str> {
        self.periods
            .iter()
            .filter(|(_, runs)| !runs.is_empty())
            .map(|(p, _)| p.as_str())
            .collect()
    }

    /// All runs of a period, in ascending order
    pub fn runs(&self, period: &str) -> Vec<&str> {
        self.periods
            .get(period)
            .map(|runs| runs.keys().map(|r| r.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, period: &str, run: &str) -> Option<&RunInfo> {
        self.periods.get(period).and_then(|runs| runs.get(run))
    }

    /// The most recent (period, run) pair
    pub fn latest(&self) -> Option<(&str, &str)> {
        self.periods
            .iter()
            .rev()
            .find_map(|(p, runs)| runs.keys().next_back().map(|r| (p.as_str(), r.as_str())))
    }

    /// The last run of a period
    pub fn last_run(&self, period: &str) -> Option<&str> {
        self.periods
            .get(period)
            .and_then(|runs| runs.keys().next_back())
            .map(|r| r.as_str())
    }

    /// Human readable run identifier `<experiment>-<period>-<run>`.
    ///
    /// Falls back to `<period>-<run>` for runs unknown to the database
    pub fn run_label(&self, period: &str, run: &str) -> String {
        match self.get(period, run) {
            Some(info) => format!("{}-{period}-{run}", info.experiment),
            None => format!("{period}-{run}"),
        }
    }
}
