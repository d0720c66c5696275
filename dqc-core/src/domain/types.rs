// dqc-core/src/domain/types.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Where an entity physically lives. Only the warehouse-native system is
/// implemented today; unknown tags fail loudly instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSystem {
    BigQuery,
}

impl SourceSystem {
    pub fn parse(tag: &str) -> Result<Self, DomainError> {
        match tag.to_uppercase().as_str() {
            "BIGQUERY" => Ok(SourceSystem::BigQuery),
            other => Err(DomainError::NotImplemented(format!(
                "source system '{other}' is not supported"
            ))),
        }
    }

    /// Static locator field-name mapping for this system (design: one small
    /// table looked up once, not branching scattered through the normalizer).
    pub fn field_mapping(self) -> &'static FieldMapping {
        match self {
            SourceSystem::BigQuery => &BIGQUERY_FIELDS,
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSystem::BigQuery => write!(f, "BIGQUERY"),
        }
    }
}

/// Expected document keys for the three locator fields, each with an
/// optional legacy alias accepted (with a deprecation warning) when the
/// specific key is absent.
#[derive(Debug)]
pub struct FieldMapping {
    pub instance: LocatorField,
    pub database: LocatorField,
    pub table: LocatorField,
}

#[derive(Debug)]
pub struct LocatorField {
    pub name: &'static str,
    pub legacy_alias: Option<&'static str>,
}

static BIGQUERY_FIELDS: FieldMapping = FieldMapping {
    instance: LocatorField {
        name: "project_name",
        legacy_alias: Some("instance_name"),
    },
    database: LocatorField {
        name: "dataset_name",
        legacy_alias: Some("database_name"),
    },
    table: LocatorField {
        name: "table_name",
        legacy_alias: None,
    },
};

/// Canonical SQL types every declared column type collapses to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalType {
    String,
    Integer,
    Float,
    Numeric,
    Boolean,
    Timestamp,
    Datetime,
    Date,
    Time,
}

impl CanonicalType {
    /// Table-driven mapping from a declared column type token to its
    /// canonical type. Case-insensitive on the token. Three outcomes:
    /// mapped, explicitly unsupported (no canonical equivalent), unknown.
    pub fn resolve(
        source_system: SourceSystem,
        declared: &str,
        entity_id: &str,
        column_id: &str,
    ) -> Result<Self, DomainError> {
        match source_system {
            SourceSystem::BigQuery => match declared.to_uppercase().as_str() {
                "STRING" | "VARCHAR" | "CHAR" => Ok(CanonicalType::String),
                "INTEGER" | "INT" | "INT64" | "SMALLINT" | "BIGINT" => Ok(CanonicalType::Integer),
                "FLOAT" | "FLOAT64" | "DOUBLE" => Ok(CanonicalType::Float),
                "NUMERIC" | "DECIMAL" => Ok(CanonicalType::Numeric),
                "BOOLEAN" | "BOOL" => Ok(CanonicalType::Boolean),
                "TIMESTAMP" => Ok(CanonicalType::Timestamp),
                "DATETIME" => Ok(CanonicalType::Datetime),
                "DATE" => Ok(CanonicalType::Date),
                "TIME" => Ok(CanonicalType::Time),
                // BYTES has no canonical equivalent for quality predicates
                "BYTES" => Err(DomainError::NotImplemented(format!(
                    "column '{column_id}' of entity '{entity_id}': declared type 'BYTES' \
                     has no canonical equivalent for source system {source_system}"
                ))),
                _ => Err(DomainError::UnmappedColumnType {
                    entity_id: entity_id.to_string(),
                    column_id: column_id.to_string(),
                    declared: declared.to_string(),
                    source_system: source_system.to_string(),
                }),
            },
        }
    }

    /// Canonical types accepted for the incremental time filter column.
    pub fn is_temporal_filter(self) -> bool {
        matches!(self, CanonicalType::Timestamp | CanonicalType::Datetime)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanonicalType::String => "STRING",
            CanonicalType::Integer => "INTEGER",
            CanonicalType::Float => "FLOAT",
            CanonicalType::Numeric => "NUMERIC",
            CanonicalType::Boolean => "BOOLEAN",
            CanonicalType::Timestamp => "TIMESTAMP",
            CanonicalType::Datetime => "DATETIME",
            CanonicalType::Date => "DATE",
            CanonicalType::Time => "TIME",
        };
        write!(f, "{s}")
    }
}
