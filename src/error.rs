use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("data definition not found at {path}")]
    DocumentNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data definition {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("QID entry {index} in {path} has no usable '{field}'")]
    MalformedRoleEntry {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },

    #[error("experiment manifest not found at {path}")]
    ManifestNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed experiment manifest {path}: {reason}")]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("invalid k list '{value}' in {path}: bad element '{token}'")]
    MalformedKList {
        path: PathBuf,
        value: String,
        token: String,
    },

    #[error("unable to read dataset header from {path}: {reason}")]
    DatasetHeader { path: PathBuf, reason: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("'{token}' is not a positive integer")]
pub struct KListError {
    pub token: String,
}
