mod dataset;
mod definition;
mod error;
mod manifest;

pub use dataset::{read_dataset_columns, DATASET_DELIMITER};
pub use definition::{
    load_definition, load_target, AttributeRole, DatasetDefinition, QuasiIdentifierEntry,
    RoleSpecDocument,
};
pub use error::{InputError, KListError};
pub use manifest::{load_manifest, parse_k_list, ExperimentManifest};
