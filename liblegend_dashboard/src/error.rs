use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum RunInfoError {
    #[error("Could not load run information as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Run information failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Run information failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Run information file {0:?} does not contain any runs")]
    NoRuns(PathBuf),
}

#[derive(Debug, Error)]
pub enum ChannelMapError {
    #[error("Could not load channel map as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("ChannelMap failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ChannelMap failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("ChannelMap found raw id {0} assigned to both {1} and {2}")]
    DuplicateRawId(u32, String, String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Store does not contain a table with key {0}")]
    MissingKey(String),
    #[error("Table {key} is malformed: {reason}")]
    MalformedTable { key: String, reason: String },
    #[error("Table {key} has no column named {column}")]
    MissingColumn { key: String, column: String },
}

#[derive(Debug, Error)]
pub enum PlotMetaError {
    #[error("Could not load plot metadata as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Plot metadata failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Plot metadata failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Plot metadata entry {0} is not a mapping")]
    BadEntry(String),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Retrieval failed due to Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Retrieval failed due to plot metadata error: {0}")]
    PlotMetaError(#[from] PlotMetaError),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Monitor failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Monitor failed due to run information error: {0}")]
    RunInfoError(#[from] RunInfoError),
    #[error("Monitor failed due to ChannelMap error: {0}")]
    ChannelMapError(#[from] ChannelMapError),
}
