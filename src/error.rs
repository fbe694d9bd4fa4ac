use std::time::Duration;
use thiserror::Error;

/// A payload could not be turned into typed data at all.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("index payload is empty")]
    Empty,

    #[error("index CSV is malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("geometry is not a valid GeoJSON FeatureCollection: {0}")]
    Geometry(#[source] serde_json::Error),

    #[error("rates table is not valid JSON: {0}")]
    Rates(#[source] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("rank {0} is outside 1..=5")]
    RankOutOfRange(i64),

    #[error("thresholds must be finite and strictly ascending")]
    UnsortedThresholds,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fetching {resource} failed: {source:#}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("fetching {resource} timed out after {after:?}")]
    Timeout {
        resource: &'static str,
        after: Duration,
    },

    #[error(transparent)]
    Format(#[from] DataFormatError),

    #[error("period {0} is not present in the index data")]
    UnknownPeriod(String),

    #[error("index data has no period columns")]
    NoPeriods,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
