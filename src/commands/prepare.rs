use anyhow::Result;
use kanon_prep::{load_definition, load_manifest, read_dataset_columns};
use std::path::Path;
use tracing::{info, warn};

pub fn execute(config_file_path: &Path) -> Result<()> {
    let config_file_path = std::env::current_dir()?.join(config_file_path);
    let config = crate::config::load_config(&config_file_path)?;

    let manifest = load_manifest(&config.manifest_path, &config.folds_path)?;
    let manifest = match &config.base_dir {
        Some(base_dir) => manifest.resolve(base_dir),
        None => manifest,
    };

    info!("{}", manifest);

    let (definition, target) = load_definition(
        &manifest.data_definition_path,
        &manifest.dataset_path,
        config.diversity_protection,
    )?;

    match read_dataset_columns(&definition.dataset_path) {
        Ok(columns) => {
            for column in definition.unknown_columns(&columns) {
                warn!(column, "column is not present in the dataset header");
            }
        }
        Err(err) => warn!("{}", err),
    }

    for (column, hierarchy_path) in definition.quasi_identifiers() {
        info!(column, hierarchy = %hierarchy_path.display(), "quasi-identifier");
    }

    info!(
        target_column = %target,
        sensitive = ?definition.sensitive_attributes(),
        insensitive = ?definition.insensitive_attributes(),
        k_values = ?manifest.k_values,
        "inputs ready"
    );

    Ok(())
}
