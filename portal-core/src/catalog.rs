use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::error::CoreError;

/// The five platform entity shapes. Each carries a fixed set of
/// platform-injected control fields that the execution engine populates;
/// users never map or edit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum EntityType {
    #[serde(rename = "dimension")]
    Dimension,
    #[serde(rename = "fact")]
    Fact,
    #[serde(rename = "bridge")]
    Bridge,
    #[serde(rename = "snapshot")]
    Snapshot,
    #[serde(rename = "staging")]
    Staging,
}

impl EntityType {
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Dimension,
            EntityType::Fact,
            EntityType::Bridge,
            EntityType::Snapshot,
            EntityType::Staging,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            EntityType::Dimension => "dimension",
            EntityType::Fact => "fact",
            EntityType::Bridge => "bridge",
            EntityType::Snapshot => "snapshot",
            EntityType::Staging => "staging",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EntityType::Dimension => "Dimension",
            EntityType::Fact => "Fact Table",
            EntityType::Bridge => "Bridge Table",
            EntityType::Snapshot => "Snapshot",
            EntityType::Staging => "Staging",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EntityType::Dimension => "Slowly Changing Dimension (SCD Type 2) with automatic surrogate keys and validity tracking",
            EntityType::Fact => "Transactional fact table with CDC tracking and incremental processing support",
            EntityType::Bridge => "Many-to-many relationship bridge with link validity tracking",
            EntityType::Snapshot => "Point-in-time snapshot for tracking historical state",
            EntityType::Staging => "Minimal transformation layer with basic lineage tracking",
        }
    }

    /// Reserved column names injected into the schema entry for this
    /// entity type, in a fixed append order.
    pub fn control_fields(&self) -> &'static [&'static str] {
        match self {
            EntityType::Dimension => &[
                "_surrogate_key",
                "_valid_from",
                "_valid_to",
                "_is_current",
                "_loaded_at",
                "_source_schema",
                "_model_name",
                "_dbt_run_id",
            ],
            EntityType::Fact => &[
                "_transaction_time",
                "_ingestion_time",
                "_source_system",
                "_loaded_at",
                "_source_schema",
                "_model_name",
                "_dbt_run_id",
            ],
            EntityType::Bridge => &[
                "_relationship_created_at",
                "_is_active",
                "_loaded_at",
                "_source_schema",
                "_model_name",
                "_dbt_run_id",
            ],
            EntityType::Snapshot => &[
                "_snapshot_date",
                "_snapshot_timestamp",
                "_loaded_at",
                "_source_schema",
                "_model_name",
                "_dbt_run_id",
            ],
            EntityType::Staging => &[
                "_layer",
                "_loaded_at",
                "_source_schema",
                "_model_name",
                "_dbt_run_id",
            ],
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EntityType::Dimension => "\u{1F4CA}",
            EntityType::Fact => "\u{1F4C8}",
            EntityType::Bridge => "\u{1F517}",
            EntityType::Snapshot => "\u{1F4F8}",
            EntityType::Staging => "\u{1F4E5}",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            EntityType::Dimension => "#4F46E5",
            EntityType::Fact => "#059669",
            EntityType::Bridge => "#D97706",
            EntityType::Snapshot => "#7C3AED",
            EntityType::Staging => "#6B7280",
        }
    }
}

impl FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dimension" => Ok(EntityType::Dimension),
            "fact" => Ok(EntityType::Fact),
            "bridge" => Ok(EntityType::Bridge),
            "snapshot" => Ok(EntityType::Snapshot),
            "staging" => Ok(EntityType::Staging),
            _ => Err(CoreError::UnknownEntityType(s.to_owned())),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Catalog row for the entity-types endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EntityTypeInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "controlFields")]
    pub control_fields: &'static [&'static str],
    pub icon: &'static str,
    pub color: &'static str,
}

pub fn entity_type_catalog() -> Vec<EntityTypeInfo> {
    EntityType::all()
        .iter()
        .map(|t| EntityTypeInfo {
            key: t.key(),
            name: t.display_name(),
            description: t.description(),
            control_fields: t.control_fields(),
            icon: t.icon(),
            color: t.color(),
        })
        .collect()
}

/// Relationship cardinality between two entities. Metadata only; the
/// renderer never emits join SQL from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Cardinality {
    #[serde(rename = "one_to_one")]
    OneToOne,
    #[serde(rename = "one_to_many")]
    OneToMany,
    #[serde(rename = "many_to_one")]
    ManyToOne,
    #[serde(rename = "many_to_many")]
    ManyToMany,
}

impl Cardinality {
    pub fn all() -> &'static [Cardinality] {
        &[
            Cardinality::OneToOne,
            Cardinality::OneToMany,
            Cardinality::ManyToOne,
            Cardinality::ManyToMany,
        ]
    }

    pub fn value(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one_to_one",
            Cardinality::OneToMany => "one_to_many",
            Cardinality::ManyToOne => "many_to_one",
            Cardinality::ManyToMany => "many_to_many",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "One-to-One (1:1)",
            Cardinality::OneToMany => "One-to-Many (1:N)",
            Cardinality::ManyToOne => "Many-to-One (N:1)",
            Cardinality::ManyToMany => "Many-to-Many (N:M)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "Each record in A relates to exactly one record in B",
            Cardinality::OneToMany => "Each record in A can relate to multiple records in B",
            Cardinality::ManyToOne => "Multiple records in A relate to one record in B",
            Cardinality::ManyToMany => "Multiple records in A relate to multiple records in B (requires bridge table)",
        }
    }
}

/// Catalog row for the cardinality-types endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CardinalityInfo {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub fn cardinality_catalog() -> Vec<CardinalityInfo> {
    Cardinality::all()
        .iter()
        .map(|c| CardinalityInfo {
            value: c.value(),
            label: c.label(),
            description: c.description(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn entity_type_round_trip() {
        for t in EntityType::all() {
            assert_eq!(*t, t.key().parse::<EntityType>().unwrap());
        }
        assert!("cube".parse::<EntityType>().is_err());
    }

    #[test]
    fn catalog_covers_all_types() {
        let catalog = entity_type_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog[0].key, "dimension");
        assert_eq!(catalog[1].control_fields[0], "_transaction_time");
    }

    #[test]
    fn cardinality_serde_values() {
        let json = serde_json::to_string(&Cardinality::ManyToOne).unwrap();
        assert_eq!(json, "\"many_to_one\"");
    }
}
