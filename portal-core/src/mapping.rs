//! Client mapping renderer.
//!
//! Turns a wizard submission into the two artifacts the dbt project
//! consumes: a per-client YAML file under
//! `models/staging/client_mappings/` and a record merged into the
//! `vars.client_mappings` list of `dbt_project.yml`.

use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::CoreError;

pub const CREATED_BY: &str = "client-mapping-portal";

/// Wizard configuration for one client. Identified by `client_code`;
/// persisted under the lower-cased code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientMappingConfig {
    pub client_code: String,
    pub client_name: String,
    pub source_schema: String,
    pub source_table: String,
    pub target_model: String,
}

impl ClientMappingConfig {
    /// Required-field check. Returns the names of the missing fields so
    /// the caller can reject the request before any mutation happens.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if self.client_name.is_empty() {
            missing.push("clientName");
        }
        if self.client_code.is_empty() {
            missing.push("clientCode");
        }
        if self.target_model.is_empty() {
            missing.push("targetModel");
        }
        if self.source_table.is_empty() {
            missing.push("sourceTable");
        }
        missing
    }
}

/// One field mapping as submitted by the wizard. `expression` is the
/// authoritative SQL fragment; the remaining fields only exist so the UI
/// can reconstruct the expression builder state and are carried through
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMapping {
    pub expression: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub field: Option<String>,
    pub function: Option<String>,
    pub args: Option<Vec<String>>,
    pub cast_type: Option<String>,
    pub static_value: Option<String>,
}

/// The declarative record stored in `vars.client_mappings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMappingRecord {
    pub client_code: String,
    pub client_name: String,
    pub source_table: String,
    pub target_model: String,
    pub field_mappings: IndexMap<String, String>,
}

#[derive(Debug, Serialize)]
struct MappingFile<'a> {
    version: u32,
    client_config: ClientConfigBlock<'a>,
}

#[derive(Debug, Serialize)]
struct ClientConfigBlock<'a> {
    client_code: &'a str,
    client_name: &'a str,
    source_table: &'a str,
    target_model: &'a str,
    created_by: &'static str,
    created_at: &'a str,
    field_mappings: &'a IndexMap<String, String>,
}

/// Both artifacts for one submission.
#[derive(Debug)]
pub struct RenderedMapping {
    /// `<client_code lower>.yml`
    pub filename: String,
    /// Full per-client YAML file text.
    pub file_yaml: String,
    /// Record to upsert into `vars.client_mappings`, keyed by
    /// `client_code`.
    pub record: Value,
}

/// Renders a submission. Mappings whose expression is empty are dropped
/// silently; the field is simply unmapped. Caller validates `config`
/// first (see `missing_fields`).
pub fn render(
    config: &ClientMappingConfig,
    mappings: &IndexMap<String, FieldMapping>,
    created_at: &str,
) -> Result<RenderedMapping, CoreError> {
    let field_mappings: IndexMap<String, String> = mappings
        .iter()
        .filter(|(_, m)| !m.expression.is_empty())
        .map(|(target, m)| (target.clone(), m.expression.clone()))
        .collect();

    let file = MappingFile {
        version: 2,
        client_config: ClientConfigBlock {
            client_code: &config.client_code,
            client_name: &config.client_name,
            source_table: &config.source_table,
            target_model: &config.target_model,
            created_by: CREATED_BY,
            created_at,
            field_mappings: &field_mappings,
        },
    };
    let file_yaml = serde_yaml::to_string(&file)?;

    let record = serde_yaml::to_value(ProjectMappingRecord {
        client_code: config.client_code.clone(),
        client_name: config.client_name.clone(),
        source_table: config.source_table.clone(),
        target_model: config.target_model.clone(),
        field_mappings,
    })?;

    Ok(RenderedMapping {
        filename: format!("{}.yml", config.client_code.to_lowercase()),
        file_yaml,
        record,
    })
}

/// Staging-select preview for the wizard: one line per target field,
/// `NULL` for anything unmapped.
pub fn render_sql(
    config: &ClientMappingConfig,
    target_fields: &[String],
    mappings: &IndexMap<String, FieldMapping>,
) -> String {
    let mut lines = vec!["SELECT".to_owned()];
    for (idx, field) in target_fields.iter().enumerate() {
        let expression = mappings
            .get(field)
            .filter(|m| !m.expression.is_empty())
            .map(|m| m.expression.as_str())
            .unwrap_or("NULL");
        let comma = if idx < target_fields.len() - 1 { "," } else { "" };
        lines.push(format!("    {} AS {}{}", expression, field, comma));
    }
    lines.push(format!(
        "FROM {{{{ source('{}', '{}') }}}}",
        config.source_schema, config.source_table
    ));
    lines.join("\n")
}

#[cfg(test)]
mod test {
    use super::*;

    fn acme() -> ClientMappingConfig {
        ClientMappingConfig {
            client_code: "ACME".to_owned(),
            client_name: "Acme Corp".to_owned(),
            source_schema: "acme_raw".to_owned(),
            source_table: "employee_feed".to_owned(),
            target_model: "dim_candidate".to_owned(),
        }
    }

    fn mapping(expression: &str) -> FieldMapping {
        FieldMapping {
            expression: expression.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_expressions_are_dropped() {
        let mut mappings = IndexMap::new();
        mappings.insert("candidate_id".to_owned(), mapping("emp_id"));
        mappings.insert("phone_number".to_owned(), mapping(""));

        let rendered = render(&acme(), &mappings, "2024-03-15T10:00:00Z").unwrap();
        let fields = rendered.record.get("field_mappings").unwrap();
        assert_eq!(fields.get("candidate_id").unwrap().as_str(), Some("emp_id"));
        assert!(fields.get("phone_number").is_none());
    }

    #[test]
    fn file_yaml_has_fixed_header() {
        let mut mappings = IndexMap::new();
        mappings.insert(
            "full_name".to_owned(),
            mapping("CONCAT(fname, ' ', lname)"),
        );

        let rendered = render(&acme(), &mappings, "2024-03-15T10:00:00Z").unwrap();
        assert_eq!(rendered.filename, "acme.yml");
        assert!(rendered.file_yaml.starts_with("version: 2\n"));
        assert!(rendered.file_yaml.contains("client_code: ACME"));
        assert!(rendered.file_yaml.contains("created_by: client-mapping-portal"));
        assert!(rendered
            .file_yaml
            .contains("full_name: CONCAT(fname, ' ', lname)"));
    }

    #[test]
    fn missing_fields_are_named() {
        let config = ClientMappingConfig {
            client_code: "ACME".to_owned(),
            ..Default::default()
        };
        assert_eq!(
            config.missing_fields(),
            vec!["clientName", "targetModel", "sourceTable"]
        );
        assert!(acme().missing_fields().is_empty());
    }

    #[test]
    fn sql_preview_fills_null_for_unmapped() {
        let mut mappings = IndexMap::new();
        mappings.insert("candidate_id".to_owned(), mapping("emp_id"));

        let sql = render_sql(
            &acme(),
            &["candidate_id".to_owned(), "email".to_owned()],
            &mappings,
        );
        assert_eq!(
            sql,
            "SELECT\n    emp_id AS candidate_id,\n    NULL AS email\nFROM {{ source('acme_raw', 'employee_feed') }}"
        );
    }
}
