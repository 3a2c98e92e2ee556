//! Platform entity renderer.
//!
//! Turns an entity definition into a dbt model file under
//! `models/platform_demo/` and an entry merged into the platform schema
//! document. Control fields come from the entity-type catalog and are
//! injected into the schema entry only; the execution engine populates
//! them, so they never appear in the generated select list.

use serde_derive::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::catalog::EntityType;
use crate::error::CoreError;

pub const PLATFORM_SOURCE: &str = "platform_demo";

/// Wizard configuration for one platform entity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformEntityConfig {
    pub entity_type: String,
    pub model_name: String,
    pub source_table: String,
    pub primary_key: String,
    pub description: String,
    pub columns: Vec<ColumnSelection>,
    pub relationships: Vec<Relationship>,
    pub cdc_config: CdcConfig,
}

impl PlatformEntityConfig {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if self.model_name.is_empty() {
            missing.push("modelName");
        }
        if self.entity_type.is_empty() {
            missing.push("entityType");
        }
        if self.source_table.is_empty() {
            missing.push("sourceTable");
        }
        if self.primary_key.is_empty() {
            missing.push("primaryKey");
        }
        missing
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSelection {
    pub source_column: String,
    pub target_column: String,
    pub data_type: String,
    pub track_changes: bool,
}

impl ColumnSelection {
    /// Output name: the rename target when one was given, otherwise the
    /// source column itself.
    fn output_name(&self) -> &str {
        if self.target_column.is_empty() {
            &self.source_column
        } else {
            &self.target_column
        }
    }

    fn is_renamed(&self) -> bool {
        !self.target_column.is_empty() && self.target_column != self.source_column
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Relationship {
    pub target_entity: String,
    pub join_key_column: String,
    pub cardinality: String,
    pub required: bool,
    pub description: Option<String>,
}

/// CDC settings, meaningful for fact entities only. The wizard sends an
/// empty block when untouched; `is_empty` distinguishes that from a real
/// configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CdcConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_time_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_time_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
}

impl CdcConfig {
    // the wizard sends empty strings for untouched inputs
    fn cleaned(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|s| !s.is_empty())
    }

    pub fn transaction_time(&self) -> Option<&str> {
        Self::cleaned(&self.transaction_time_column)
    }

    pub fn ingestion_time(&self) -> Option<&str> {
        Self::cleaned(&self.ingestion_time_column)
    }

    pub fn system(&self) -> Option<&str> {
        Self::cleaned(&self.source_system)
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_time().is_none()
            && self.ingestion_time().is_none()
            && self.system().is_none()
    }
}

// Persisted schema-entry shapes. These serialize snake_case into the
// platform schema document.

#[derive(Debug, Serialize)]
struct SchemaEntry<'a> {
    name: &'a str,
    description: &'a str,
    meta: EntityMeta<'a>,
    columns: Vec<SchemaColumn>,
}

#[derive(Debug, Serialize)]
struct EntityMeta<'a> {
    entity_type: &'static str,
    primary_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scd_type: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    track_changes_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cdc_config: Option<PersistedCdcConfig<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    relationships: Vec<PersistedRelationship<'a>>,
}

#[derive(Debug, Serialize)]
struct PersistedCdcConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_time_column: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ingestion_time_column: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PersistedRelationship<'a> {
    target_entity: &'a str,
    join_key_column: &'a str,
    cardinality: &'a str,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SchemaColumn {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tests: Option<Vec<&'static str>>,
}

/// Both artifacts for one entity submission.
#[derive(Debug)]
pub struct RenderedEntity {
    /// `<model_name>.sql`
    pub filename: String,
    /// Generated dbt model text.
    pub model_sql: String,
    /// Entry to upsert into the schema document's `models` list, keyed
    /// by `name`.
    pub schema_entry: Value,
}

pub fn render(config: &PlatformEntityConfig) -> Result<RenderedEntity, CoreError> {
    let entity_type: EntityType = config.entity_type.parse()?;

    Ok(RenderedEntity {
        filename: format!("{}.sql", config.model_name),
        model_sql: render_model_sql(config, entity_type),
        schema_entry: serde_yaml::to_value(schema_entry(config, entity_type))?,
    })
}

fn schema_entry<'a>(config: &'a PlatformEntityConfig, entity_type: EntityType) -> SchemaEntry<'a> {
    let (scd_type, track_changes_columns) = match entity_type {
        EntityType::Dimension => {
            let tracked = config
                .columns
                .iter()
                .filter(|c| c.track_changes)
                .map(|c| c.output_name().to_owned())
                .collect();
            (Some(2), Some(tracked))
        }
        _ => (None, None),
    };

    let cdc_config = match entity_type {
        EntityType::Fact if !config.cdc_config.is_empty() => Some(PersistedCdcConfig {
            transaction_time_column: config.cdc_config.transaction_time(),
            ingestion_time_column: config.cdc_config.ingestion_time(),
            source_system: config.cdc_config.system(),
        }),
        _ => None,
    };

    let relationships = config
        .relationships
        .iter()
        .map(|r| PersistedRelationship {
            target_entity: &r.target_entity,
            join_key_column: &r.join_key_column,
            cardinality: &r.cardinality,
            required: r.required,
            description: r.description.as_deref(),
        })
        .collect();

    let mut columns: Vec<SchemaColumn> = config
        .columns
        .iter()
        .map(|c| {
            let is_primary_key = c.output_name() == config.primary_key
                || c.source_column == config.primary_key;
            SchemaColumn {
                name: c.output_name().to_owned(),
                description: column_description(c),
                tests: if is_primary_key {
                    Some(vec!["unique", "not_null"])
                } else {
                    None
                },
            }
        })
        .collect();

    // catalog control fields go after the user's columns, in catalog order
    for field in entity_type.control_fields() {
        columns.push(SchemaColumn {
            name: (*field).to_owned(),
            description: control_field_description(field).to_owned(),
            tests: None,
        });
    }

    SchemaEntry {
        name: &config.model_name,
        description: &config.description,
        meta: EntityMeta {
            entity_type: entity_type.key(),
            primary_key: &config.primary_key,
            scd_type,
            track_changes_columns,
            cdc_config,
            relationships,
        },
        columns,
    }
}

fn column_description(column: &ColumnSelection) -> String {
    if column.is_renamed() {
        format!("Mapped from source column {}", column.source_column)
    } else {
        format!("Source column {}", column.source_column)
    }
}

fn control_field_description(field: &str) -> &'static str {
    match field {
        "_surrogate_key" => "Platform-generated surrogate key",
        "_valid_from" => "Start of the row's validity interval",
        "_valid_to" => "End of the row's validity interval",
        "_is_current" => "Whether this is the current row version",
        "_transaction_time" => "Source transaction timestamp used for CDC",
        "_ingestion_time" => "Timestamp the record entered the platform",
        "_source_system" => "Originating source system",
        "_relationship_created_at" => "When the link was first observed",
        "_is_active" => "Whether the link is currently active",
        "_snapshot_date" => "Calendar date of the snapshot",
        "_snapshot_timestamp" => "Exact time of the snapshot",
        "_layer" => "Platform layer tag",
        "_loaded_at" => "Load timestamp",
        "_source_schema" => "Schema the record was loaded from",
        "_model_name" => "Name of the producing model",
        "_dbt_run_id" => "Run that produced the record",
        _ => "Platform-managed control field",
    }
}

fn render_model_sql(config: &PlatformEntityConfig, entity_type: EntityType) -> String {
    let mut out = String::new();

    match entity_type {
        EntityType::Fact => {
            out.push_str("{{ config(\n");
            out.push_str("    materialized='incremental',\n");
            out.push_str(&format!("    unique_key='{}'\n", config.primary_key));
            out.push_str(") }}\n");
        }
        _ => {
            // full rebuild on every run
            out.push_str("{{ config(\n    materialized='table'\n) }}\n");
        }
    }
    out.push('\n');

    // relationships are documentation only; no join sql is generated
    if !config.relationships.is_empty() {
        for rel in &config.relationships {
            out.push_str(&format!(
                "-- {} -> {} ({})\n",
                rel.join_key_column, rel.target_entity, rel.cardinality
            ));
        }
        out.push('\n');
    }

    out.push_str("select\n");
    let last = config.columns.len().saturating_sub(1);
    for (idx, column) in config.columns.iter().enumerate() {
        let comma = if idx < last { "," } else { "" };
        if column.is_renamed() {
            out.push_str(&format!(
                "    {} as {}{}\n",
                column.source_column, column.target_column, comma
            ));
        } else {
            out.push_str(&format!("    {}{}\n", column.source_column, comma));
        }
    }
    out.push_str(&format!(
        "from {{{{ source('{}', '{}') }}}}\n",
        PLATFORM_SOURCE, config.source_table
    ));

    if entity_type == EntityType::Fact {
        let watermark = config.cdc_config.transaction_time().unwrap_or("updated_at");
        out.push('\n');
        out.push_str("{% if is_incremental() %}\n");
        out.push_str(&format!(
            "where {} > (select max(_transaction_time) from {{{{ this }}}})\n",
            watermark
        ));
        out.push_str("{% endif %}\n");
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn column(source: &str, target: &str, track: bool) -> ColumnSelection {
        ColumnSelection {
            source_column: source.to_owned(),
            target_column: target.to_owned(),
            data_type: "varchar".to_owned(),
            track_changes: track,
        }
    }

    fn dimension_config() -> PlatformEntityConfig {
        PlatformEntityConfig {
            entity_type: "dimension".to_owned(),
            model_name: "dim_customer".to_owned(),
            source_table: "raw_customers".to_owned(),
            primary_key: "customer_id".to_owned(),
            description: "Customer dimension".to_owned(),
            columns: vec![
                column("cust_id", "customer_id", false),
                column("cust_name", "", true),
                column("segment", "", true),
            ],
            ..Default::default()
        }
    }

    fn fact_config() -> PlatformEntityConfig {
        PlatformEntityConfig {
            entity_type: "fact".to_owned(),
            model_name: "fct_orders".to_owned(),
            source_table: "raw_orders".to_owned(),
            primary_key: "order_id".to_owned(),
            columns: vec![column("order_id", "", false), column("amount", "", false)],
            relationships: vec![Relationship {
                target_entity: "dim_customer".to_owned(),
                join_key_column: "customer_id".to_owned(),
                cardinality: "many_to_one".to_owned(),
                required: true,
                description: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn dimension_gets_scd_type_2_and_tracked_columns() {
        let rendered = render(&dimension_config()).unwrap();
        let meta = rendered.schema_entry.get("meta").unwrap();
        assert_eq!(meta.get("scd_type").unwrap().as_u64(), Some(2));

        let tracked = meta.get("track_changes_columns").unwrap().as_sequence().unwrap();
        let tracked: Vec<_> = tracked.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(tracked, vec!["cust_name", "segment"]);

        assert!(rendered.model_sql.contains("materialized='table'"));
        assert!(!rendered.model_sql.contains("is_incremental"));
    }

    #[test]
    fn fact_embeds_cdc_config_when_supplied() {
        let mut config = fact_config();
        config.cdc_config = CdcConfig {
            transaction_time_column: Some("order_ts".to_owned()),
            ingestion_time_column: None,
            source_system: Some("oms".to_owned()),
        };

        let rendered = render(&config).unwrap();
        let cdc = rendered.schema_entry.get("meta").unwrap().get("cdc_config").unwrap();
        assert_eq!(cdc.get("transaction_time_column").unwrap().as_str(), Some("order_ts"));
        assert_eq!(cdc.get("source_system").unwrap().as_str(), Some("oms"));
        assert!(cdc.get("ingestion_time_column").is_none());

        assert!(rendered.model_sql.contains("materialized='incremental'"));
        assert!(rendered.model_sql.contains(
            "where order_ts > (select max(_transaction_time) from {{ this }})"
        ));
    }

    #[test]
    fn fact_omits_cdc_config_when_not_supplied() {
        let rendered = render(&fact_config()).unwrap();
        let meta = rendered.schema_entry.get("meta").unwrap();
        assert!(meta.get("cdc_config").is_none());
        assert!(meta.get("scd_type").is_none());

        // watermark defaults to updated_at
        assert!(rendered.model_sql.contains(
            "where updated_at > (select max(_transaction_time) from {{ this }})"
        ));
    }

    #[test]
    fn columns_render_rename_or_bare() {
        let rendered = render(&dimension_config()).unwrap();
        assert!(rendered.model_sql.contains("    cust_id as customer_id,\n"));
        assert!(rendered.model_sql.contains("    cust_name,\n"));
        assert!(rendered.model_sql.contains("    segment\n"));
        assert!(rendered
            .model_sql
            .contains("from {{ source('platform_demo', 'raw_customers') }}"));
    }

    #[test]
    fn relationships_become_comment_lines_only() {
        let rendered = render(&fact_config()).unwrap();
        assert!(rendered
            .model_sql
            .contains("-- customer_id -> dim_customer (many_to_one)"));
        assert!(!rendered.model_sql.to_lowercase().contains("join "));
    }

    #[test]
    fn control_fields_follow_user_columns() {
        let rendered = render(&dimension_config()).unwrap();
        let columns = rendered.schema_entry.get("columns").unwrap().as_sequence().unwrap();
        let names: Vec<_> = columns
            .iter()
            .filter_map(|c| c.get("name").and_then(|n| n.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                "customer_id",
                "cust_name",
                "segment",
                "_surrogate_key",
                "_valid_from",
                "_valid_to",
                "_is_current",
                "_loaded_at",
                "_source_schema",
                "_model_name",
                "_dbt_run_id",
            ]
        );

        // control fields never enter the select list
        assert!(!rendered.model_sql.contains("_surrogate_key"));
    }

    #[test]
    fn primary_key_column_gets_validation_tests() {
        let rendered = render(&dimension_config()).unwrap();
        let columns = rendered.schema_entry.get("columns").unwrap().as_sequence().unwrap();

        let pk = &columns[0];
        let tests: Vec<_> = pk
            .get("tests")
            .unwrap()
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(tests, vec!["unique", "not_null"]);
        assert!(columns[1].get("tests").is_none());
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let mut config = dimension_config();
        config.entity_type = "cube".to_owned();
        assert!(render(&config).is_err());
    }

    #[test]
    fn missing_fields_are_named() {
        let config = PlatformEntityConfig::default();
        assert_eq!(
            config.missing_fields(),
            vec!["modelName", "entityType", "sourceTable", "primaryKey"]
        );
    }
}
