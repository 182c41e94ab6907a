use crate::error::InputError;
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const QID_KEY: &str = "QID";
const INSENSITIVE_KEY: &str = "IS";
const SENSITIVE_KEY: &str = "SA";
const TARGET_KEY: &str = "target";
const COLUMN_NAME_KEY: &str = "colName";
const HIERARCHY_PATH_KEY: &str = "hierarchyPath";

/// How the anonymization engine treats a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeRole {
    /// Generalized during anonymization using the hierarchy at `hierarchy_path`.
    QuasiIdentifier { hierarchy_path: PathBuf },
    Insensitive,
    Sensitive,
}

impl AttributeRole {
    pub fn is_quasi_identifier(&self) -> bool {
        matches!(self, AttributeRole::QuasiIdentifier { .. })
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self, AttributeRole::Sensitive)
    }

    pub fn hierarchy_path(&self) -> Option<&Path> {
        match self {
            AttributeRole::QuasiIdentifier { hierarchy_path } => Some(hierarchy_path),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuasiIdentifierEntry {
    pub column: String,
    pub hierarchy_path: PathBuf,
}

/// The role groups of a data definition document, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSpecDocument {
    pub quasi_identifiers: Vec<QuasiIdentifierEntry>,
    pub insensitive: Vec<String>,
    pub sensitive: Vec<String>,
    pub target: String,
}

impl RoleSpecDocument {
    pub fn from_value(path: &Path, value: &Value) -> Result<Self, InputError> {
        let object = as_object(path, value)?;

        let quasi_identifiers = required(path, object, QID_KEY)?
            .as_array()
            .ok_or_else(|| malformed(path, format!("'{}' must be an array", QID_KEY)))?
            .iter()
            .enumerate()
            .map(|(index, entry)| quasi_identifier_entry(path, index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            quasi_identifiers,
            insensitive: string_list(path, object, INSENSITIVE_KEY)?,
            sensitive: string_list(path, object, SENSITIVE_KEY)?,
            target: target_column(path, object)?,
        })
    }

    /// Assigns roles in three passes (QID, then IS, then SA). Each pass
    /// overwrites whatever an earlier entry set for the same column, so on
    /// collision SA beats IS beats QID.
    ///
    /// Sensitive attributes only become [`AttributeRole::Sensitive`] when
    /// `enable_diversity_protection` is set. A single sensitive attribute stops
    /// the engine from running plain k-anonymity, so they are demoted to
    /// insensitive unless the caller opts in.
    pub fn column_roles(
        &self,
        enable_diversity_protection: bool,
    ) -> HashMap<String, AttributeRole> {
        let mut roles = HashMap::new();

        for entry in &self.quasi_identifiers {
            assign(
                &mut roles,
                &entry.column,
                AttributeRole::QuasiIdentifier {
                    hierarchy_path: entry.hierarchy_path.clone(),
                },
            );
        }

        for column in &self.insensitive {
            assign(&mut roles, column, AttributeRole::Insensitive);
        }

        let sensitive_role = if enable_diversity_protection {
            AttributeRole::Sensitive
        } else {
            AttributeRole::Insensitive
        };

        for column in &self.sensitive {
            assign(&mut roles, column, sensitive_role.clone());
        }

        roles
    }
}

fn assign(roles: &mut HashMap<String, AttributeRole>, column: &str, role: AttributeRole) {
    if let Some(previous) = roles.insert(column.to_string(), role) {
        warn!(
            column,
            ?previous,
            current = ?roles[column],
            "column role declared more than once, keeping the later one"
        );
    }
}

/// A dataset together with the role of each of its managed columns.
///
/// Columns without an entry in `column_roles` are left to the engine, which
/// treats them as insensitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetDefinition {
    pub dataset_path: PathBuf,
    pub target_column: String,
    pub column_roles: HashMap<String, AttributeRole>,
}

impl DatasetDefinition {
    pub fn role(&self, column: &str) -> Option<&AttributeRole> {
        self.column_roles.get(column)
    }

    /// Quasi-identifier columns with their hierarchy, sorted by column name.
    pub fn quasi_identifiers(&self) -> Vec<(&str, &Path)> {
        let mut columns: Vec<(&str, &Path)> = self
            .column_roles
            .iter()
            .filter_map(|(column, role)| {
                role.hierarchy_path()
                    .map(|hierarchy_path| (column.as_str(), hierarchy_path))
            })
            .collect();
        columns.sort_by_key(|(column, _)| *column);
        columns
    }

    pub fn sensitive_attributes(&self) -> Vec<&str> {
        self.columns_with(|role| role.is_sensitive())
    }

    pub fn insensitive_attributes(&self) -> Vec<&str> {
        self.columns_with(|role| role == &AttributeRole::Insensitive)
    }

    /// Role and target columns that don't appear in `columns`.
    pub fn unknown_columns<S: AsRef<str>>(&self, columns: &[S]) -> Vec<&str> {
        let known = |name: &str| columns.iter().any(|column| column.as_ref() == name);

        let mut unknown: Vec<&str> = self
            .column_roles
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(self.target_column.as_str()))
            .filter(|column| !known(*column))
            .collect();
        unknown.sort_unstable();
        unknown.dedup();
        unknown
    }

    fn columns_with(&self, predicate: impl Fn(&AttributeRole) -> bool) -> Vec<&str> {
        let mut columns: Vec<&str> = self
            .column_roles
            .iter()
            .filter(|(_, role)| predicate(*role))
            .map(|(column, _)| column.as_str())
            .collect();
        columns.sort_unstable();
        columns
    }
}

/// Reads the data definition at `definition_path` and binds its roles to the
/// dataset at `dataset_path`. Returns the definition and the target column.
pub fn load_definition(
    definition_path: &Path,
    dataset_path: &Path,
    enable_diversity_protection: bool,
) -> Result<(DatasetDefinition, String), InputError> {
    let value = read_document(definition_path)?;
    let document = RoleSpecDocument::from_value(definition_path, &value)?;

    let column_roles = document.column_roles(enable_diversity_protection);

    debug!(
        path = %definition_path.display(),
        roles = column_roles.len(),
        target_column = %document.target,
        enable_diversity_protection,
        "loaded data definition"
    );

    let definition = DatasetDefinition {
        dataset_path: dataset_path.to_path_buf(),
        target_column: document.target.clone(),
        column_roles,
    };

    Ok((definition, document.target))
}

/// Reads only the target column from the data definition at `definition_path`.
pub fn load_target(definition_path: &Path) -> Result<String, InputError> {
    let value = read_document(definition_path)?;
    target_column(definition_path, as_object(definition_path, &value)?)
}

fn read_document(path: &Path) -> Result<Value, InputError> {
    let content = fs::read(path).map_err(|source| InputError::DocumentNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&content).map_err(|err| malformed(path, err.to_string()))
}

fn as_object<'a>(path: &Path, value: &'a Value) -> Result<&'a Map<String, Value>, InputError> {
    value
        .as_object()
        .ok_or_else(|| malformed(path, "expected a JSON object at the top level".to_string()))
}

fn required<'a>(
    path: &Path,
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Value, InputError> {
    object
        .get(key)
        .ok_or_else(|| malformed(path, format!("missing key '{}'", key)))
}

fn target_column(path: &Path, object: &Map<String, Value>) -> Result<String, InputError> {
    required(path, object, TARGET_KEY)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(path, format!("'{}' must be a string", TARGET_KEY)))
}

fn string_list(
    path: &Path,
    object: &Map<String, Value>,
    key: &str,
) -> Result<Vec<String>, InputError> {
    let array = required(path, object, key)?
        .as_array()
        .ok_or_else(|| malformed(path, format!("'{}' must be an array", key)))?;

    array
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.as_str().map(str::to_string).ok_or_else(|| {
                malformed(path, format!("element {} of '{}' must be a string", index, key))
            })
        })
        .collect()
}

fn quasi_identifier_entry(
    path: &Path,
    index: usize,
    entry: &Value,
) -> Result<QuasiIdentifierEntry, InputError> {
    let field = |name: &'static str| {
        entry
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InputError::MalformedRoleEntry {
                path: path.to_path_buf(),
                index,
                field: name,
            })
    };

    Ok(QuasiIdentifierEntry {
        column: field(COLUMN_NAME_KEY)?.to_string(),
        hierarchy_path: PathBuf::from(field(HIERARCHY_PATH_KEY)?),
    })
}

fn malformed(path: &Path, reason: String) -> InputError {
    InputError::MalformedDocument {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use serde_json::json;

    fn document(value: Value) -> RoleSpecDocument {
        RoleSpecDocument::from_value(Path::new("definition.json"), &value).unwrap()
    }

    fn qid(hierarchy_path: &str) -> AttributeRole {
        AttributeRole::QuasiIdentifier {
            hierarchy_path: PathBuf::from(hierarchy_path),
        }
    }

    #[test]
    fn test_sensitive_attributes_follow_diversity_flag() {
        let document = document(json!({
            "QID": [
                { "colName": "age", "hierarchyPath": "h1.csv" },
                { "colName": "zip", "hierarchyPath": "h2.csv" }
            ],
            "IS": ["sex"],
            "SA": ["income"],
            "target": "income"
        }));

        assert_eq!(
            document.column_roles(true),
            hashmap! {
                "age".to_string() => qid("h1.csv"),
                "zip".to_string() => qid("h2.csv"),
                "sex".to_string() => AttributeRole::Insensitive,
                "income".to_string() => AttributeRole::Sensitive,
            }
        );

        assert_eq!(
            document.column_roles(false),
            hashmap! {
                "age".to_string() => qid("h1.csv"),
                "zip".to_string() => qid("h2.csv"),
                "sex".to_string() => AttributeRole::Insensitive,
                "income".to_string() => AttributeRole::Insensitive,
            }
        );
    }

    #[test]
    fn test_later_groups_overwrite_earlier_roles() {
        let document = document(json!({
            "QID": [
                { "colName": "age", "hierarchyPath": "h1.csv" },
                { "colName": "zip", "hierarchyPath": "h2.csv" },
                { "colName": "race", "hierarchyPath": "h3.csv" }
            ],
            "IS": ["zip", "race"],
            "SA": ["race"],
            "target": "class"
        }));

        let roles = document.column_roles(true);

        assert_eq!(roles["age"], qid("h1.csv"));
        assert_eq!(roles["zip"], AttributeRole::Insensitive);
        assert_eq!(roles["race"], AttributeRole::Sensitive);
    }

    #[test]
    fn test_duplicate_quasi_identifier_keeps_last_hierarchy() {
        let document = document(json!({
            "QID": [
                { "colName": "age", "hierarchyPath": "old.csv" },
                { "colName": "age", "hierarchyPath": "new.csv" }
            ],
            "IS": [],
            "SA": [],
            "target": "class"
        }));

        assert_eq!(
            document.column_roles(false),
            hashmap! { "age".to_string() => qid("new.csv") }
        );
    }

    #[test]
    fn test_missing_group_is_malformed_document() {
        let result = RoleSpecDocument::from_value(
            Path::new("definition.json"),
            &json!({ "QID": [], "IS": [], "target": "class" }),
        );

        assert!(matches!(result, Err(InputError::MalformedDocument { .. })));
    }

    #[test]
    fn test_empty_hierarchy_path_is_malformed_entry() {
        let result = RoleSpecDocument::from_value(
            Path::new("definition.json"),
            &json!({
                "QID": [
                    { "colName": "age", "hierarchyPath": "h1.csv" },
                    { "colName": "zip", "hierarchyPath": "" }
                ],
                "IS": [],
                "SA": [],
                "target": "class"
            }),
        );

        match result {
            Err(InputError::MalformedRoleEntry { index, field, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "hierarchyPath");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_column_name_is_malformed_entry() {
        let result = RoleSpecDocument::from_value(
            Path::new("definition.json"),
            &json!({
                "QID": [{ "colName": "", "hierarchyPath": "h1.csv" }],
                "IS": [],
                "SA": [],
                "target": "class"
            }),
        );

        assert!(matches!(
            result,
            Err(InputError::MalformedRoleEntry {
                index: 0,
                field: "colName",
                ..
            })
        ));
    }

    #[test]
    fn test_non_string_sensitive_entry_is_malformed_document() {
        let result = RoleSpecDocument::from_value(
            Path::new("definition.json"),
            &json!({ "QID": [], "IS": [], "SA": [42], "target": "class" }),
        );

        assert!(matches!(result, Err(InputError::MalformedDocument { .. })));
    }

    #[test]
    fn test_definition_accessors() {
        let definition = DatasetDefinition {
            dataset_path: PathBuf::from("adult.csv"),
            target_column: "class".to_string(),
            column_roles: hashmap! {
                "zip".to_string() => qid("h2.csv"),
                "age".to_string() => qid("h1.csv"),
                "income".to_string() => AttributeRole::Sensitive,
                "sex".to_string() => AttributeRole::Insensitive,
            },
        };

        assert_eq!(
            definition.quasi_identifiers(),
            vec![("age", Path::new("h1.csv")), ("zip", Path::new("h2.csv"))]
        );
        assert_eq!(definition.sensitive_attributes(), vec!["income"]);
        assert_eq!(definition.insensitive_attributes(), vec!["sex"]);
        assert_eq!(definition.role("workclass"), None);
        assert!(definition.role("age").unwrap().is_quasi_identifier());
        assert!(!definition.role("income").unwrap().is_quasi_identifier());
        assert!(!definition.role("sex").unwrap().is_quasi_identifier());
        assert_eq!(
            definition.unknown_columns(&["age", "zip", "sex", "class"]),
            vec!["income"]
        );
    }
}
