use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tracing::info;
use url::Url;

use crate::calculator::ValuationTable;
use crate::classify::Classification;
use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "IBLI_CONFIG";

/// Locations of the data files, relative to the backend or data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub index: String,
    pub geometry: String,
    pub rates: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            index: "sites/default/files/data/zCumNDVI_Percentile.csv".into(),
            geometry: "sites/default/files/data/KenyaEthiopia_IBLIunits_July2014.geojson".into(),
            rates: "sites/default/files/data/rates.json".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    /// Read data files from this directory instead of the backend.
    pub data_dir: Option<PathBuf>,
    pub paths: DataPaths,
    pub fetch_timeout_secs: u64,
    pub classification: Classification,
    pub valuations: ValuationTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:9000".into(),
            data_dir: None,
            paths: DataPaths::default(),
            fetch_timeout_secs: 30,
            classification: Classification::default(),
            valuations: ValuationTable::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw, &path.display().to_string())
    }

    /// Defaults, then the YAML file named by `IBLI_CONFIG`, then the
    /// individual environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var(CONFIG_ENV) {
            Ok(path) => {
                info!(path = %path, "loading config file");
                Self::from_yaml_file(path)?
            }
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| env::var(key).ok())
    }

    /// Apply `IBLI_BACKEND_URL`, `IBLI_DATA_DIR` and `IBLI_FETCH_TIMEOUT_SECS`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("IBLI_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(dir) = lookup("IBLI_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = lookup("IBLI_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs =
                secs.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "IBLI_FETCH_TIMEOUT_SECS",
                        value: secs.clone(),
                    })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend_url()?;
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fetch_timeout_secs",
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn backend_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.backend_url).map_err(|_| ConfigError::InvalidValue {
            key: "backend_url",
            value: self.backend_url.clone(),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
