use crate::error::InputError;
use csv::ReaderBuilder;
use std::path::Path;

/// Field separator of raw datasets and hierarchy files.
pub const DATASET_DELIMITER: u8 = b';';

/// Column names from the header row of the dataset at `dataset_path`.
pub fn read_dataset_columns(dataset_path: &Path) -> Result<Vec<String>, InputError> {
    let header_error = |reason: String| InputError::DatasetHeader {
        path: dataset_path.to_path_buf(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(DATASET_DELIMITER)
        .has_headers(true)
        .from_path(dataset_path)
        .map_err(|err| header_error(err.to_string()))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| header_error(err.to_string()))?
        .iter()
        .map(|column| column.trim().to_string())
        .collect();

    if columns.iter().all(String::is_empty) {
        return Err(header_error("dataset has no header row".to_string()));
    }

    Ok(columns)
}
