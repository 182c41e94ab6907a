use crate::error::{InputError, KListError};
use csv::{ReaderBuilder, StringRecord};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const FIELD_DELIMITER: u8 = b';';
const K_LIST_SEPARATOR: &str = ", ";

/// Column layout of a manifest row. The file's own header line is skipped and
/// never consulted.
const MANIFEST_COLUMNS: [&str; 8] = [
    "k",
    "b",
    "experimentBasePath",
    "kAnonFolderPath",
    "inputDatasetPath",
    "inputDataDefenitionPath",
    "inputDataDefenitionAbsolutePath",
    "QID",
];

const K_COLUMN: usize = 0;
const EXPERIMENT_BASE_PATH_COLUMN: usize = 2;
const K_ANON_FOLDER_PATH_COLUMN: usize = 3;
const DATASET_PATH_COLUMN: usize = 4;
const DATA_DEFINITION_PATH_COLUMN: usize = 5;

/// One experiment: the k values to sweep and where its inputs and outputs live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperimentManifest {
    pub k_values: Vec<usize>,
    pub experiment_base_path: PathBuf,
    pub k_anon_output_path: PathBuf,
    pub dataset_path: PathBuf,
    pub data_definition_path: PathBuf,
    pub folds_dir_path: PathBuf,
}

impl ExperimentManifest {
    /// Joins the manifest's relative paths onto `base_dir`. Absolute paths and
    /// the folds directory are left alone.
    pub fn resolve(&self, base_dir: &Path) -> ExperimentManifest {
        ExperimentManifest {
            k_values: self.k_values.clone(),
            experiment_base_path: base_dir.join(&self.experiment_base_path),
            k_anon_output_path: base_dir.join(&self.k_anon_output_path),
            dataset_path: base_dir.join(&self.dataset_path),
            data_definition_path: base_dir.join(&self.data_definition_path),
            folds_dir_path: self.folds_dir_path.clone(),
        }
    }
}

impl fmt::Display for ExperimentManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExperimentManifest{{k_values={:?}, experiment_base_path='{}', k_anon_output_path='{}', dataset_path='{}'}}",
            self.k_values,
            self.experiment_base_path.display(),
            self.k_anon_output_path.display(),
            self.dataset_path.display(),
        )
    }
}

/// Reads the experiment manifest at `manifest_path`.
///
/// The first line is always treated as a header. When the file holds several
/// data rows, only the last one is used.
pub fn load_manifest(
    manifest_path: &Path,
    folds_dir_path: &Path,
) -> Result<ExperimentManifest, InputError> {
    let content = fs::read(manifest_path).map_err(|source| InputError::ManifestNotFound {
        path: manifest_path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(&content[..]);

    let mut rows = 0;
    let mut last_row: Option<StringRecord> = None;

    for record in reader.records() {
        rows += 1;

        let record = record
            .map_err(|err| malformed(manifest_path, format!("data row {}: {}", rows, err)))?;

        if record.len() != MANIFEST_COLUMNS.len() {
            return Err(malformed(
                manifest_path,
                format!(
                    "data row {} has {} fields, expected {} ({})",
                    rows,
                    record.len(),
                    MANIFEST_COLUMNS.len(),
                    MANIFEST_COLUMNS.join(";")
                ),
            ));
        }

        last_row = Some(record);
    }

    let record = last_row
        .ok_or_else(|| malformed(manifest_path, "no data row after the header".to_string()))?;

    if rows > 1 {
        warn!(
            path = %manifest_path.display(),
            rows,
            "manifest has more than one data row, using the last one"
        );
    }

    let k_field = &record[K_COLUMN];
    let k_values = parse_k_list(k_field).map_err(|err| InputError::MalformedKList {
        path: manifest_path.to_path_buf(),
        value: k_field.to_string(),
        token: err.token,
    })?;

    let manifest = ExperimentManifest {
        k_values,
        experiment_base_path: PathBuf::from(&record[EXPERIMENT_BASE_PATH_COLUMN]),
        k_anon_output_path: PathBuf::from(&record[K_ANON_FOLDER_PATH_COLUMN]),
        dataset_path: PathBuf::from(&record[DATASET_PATH_COLUMN]),
        data_definition_path: PathBuf::from(&record[DATA_DEFINITION_PATH_COLUMN]),
        folds_dir_path: folds_dir_path.to_path_buf(),
    };

    debug!(path = %manifest_path.display(), %manifest, "loaded experiment manifest");

    Ok(manifest)
}

/// Parses a k list such as `[3, 5, 10]`.
///
/// The first and last characters are dropped without being inspected and the
/// rest is split on `", "`. Every element has to be a positive integer.
pub fn parse_k_list(value: &str) -> Result<Vec<usize>, KListError> {
    let mut chars = value.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(KListError {
            token: value.to_string(),
        });
    }

    chars
        .as_str()
        .split(K_LIST_SEPARATOR)
        .map(|token| match token.parse::<i32>() {
            Ok(k) if k > 0 => Ok(k as usize),
            _ => Err(KListError {
                token: token.to_string(),
            }),
        })
        .collect()
}

fn malformed(path: &Path, reason: String) -> InputError {
    InputError::MalformedManifest {
        path: path.to_path_buf(),
        reason,
    }
}
