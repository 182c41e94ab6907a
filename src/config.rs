use ::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

const ENVIRONMENT_PREFIX: &str = "KANON";

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    #[error("refusing to overwrite existing config at {0}")]
    AlreadyExists(PathBuf),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RunnerConfig {
    pub folds_path: PathBuf,
    pub manifest_path: PathBuf,
    #[serde(default)]
    pub diversity_protection: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            folds_path: PathBuf::from("./folds"),
            manifest_path: PathBuf::from("./experiment.csv"),
            diversity_protection: false,
            base_dir: None,
        }
    }
}

/// Reads `path`, then applies `KANON_*` environment overrides.
pub fn load_config(path: &Path) -> Result<RunnerConfig, ConfigurationError> {
    let mut s = ::config::Config::default();
    s.merge(::config::File::from(path))?;
    s.merge(::config::Environment::with_prefix(ENVIRONMENT_PREFIX))?;
    Ok(s.try_into()?)
}

pub fn save_config(path: &Path, config: &RunnerConfig) -> Result<(), ConfigurationError> {
    if path.exists() {
        return Err(ConfigurationError::AlreadyExists(path.to_path_buf()));
    }

    fs::write(path, toml::to_string(config)?)?;
    Ok(())
}
