use serde::{Deserialize, Serialize};

/// A table entry returned by `metadata_query/get_table_names`
///
/// # Example (JSON representation)
///
/// ```json
/// {
///   "name": "customer",
///   "tableType": "TABLE",
///   "schema": "public",
///   "catalog": "sampledb"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableName {
    /// Table name as reported by the remote database
    pub name: String,

    /// "TABLE", "VIEW", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: None,
            schema: None,
            catalog: None,
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Body of a successful `get_table_names` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableNamesPayload {
    #[serde(default)]
    pub table_names: Vec<TableName>,
}
