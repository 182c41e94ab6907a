use crate::config::{save_config, RunnerConfig};
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub fn execute(config_file_path: &Path) -> Result<()> {
    save_config(config_file_path, &RunnerConfig::default())?;

    info!("Wrote starter config to {}", config_file_path.display());

    Ok(())
}
