// dqc-core/src/domain/model/entity.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::warn;

use crate::domain::error::DomainError;
use crate::domain::types::{CanonicalType, FieldMapping, LocatorField, SourceSystem};

/// One declared (or discovered) column. Owned exclusively by its entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub declared_type: String,
    pub canonical_type: CanonicalType,
    pub description: Option<String>,
}

/// Insertion-ordered column store with a case-insensitive lookup index.
/// Original case is preserved in the stored columns; the index is keyed by
/// the upper-cased id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ColumnMap {
    columns: Vec<Column>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn insert(&mut self, column: Column) {
        let key = column.id.to_uppercase();
        match self.index.get(&key) {
            Some(&pos) => self.columns[pos] = column,
            None => {
                self.index.insert(key, self.columns.len());
                self.columns.push(column);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Column> {
        self.index
            .get(&id.to_uppercase())
            .map(|&pos| &self.columns[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Locator override for one named target environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentOverride {
    pub environment: String,
    pub instance_name: String,
    pub database_name: String,
    pub table_name: String,
}

/// A table-like data source subject to validation. Constructed once from a
/// declarative document or a metadata-registry fetch, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub source_system: SourceSystem,
    pub instance_name: String,
    pub database_name: String,
    pub table_name: String,
    pub columns: ColumnMap,
    pub environment_overrides: BTreeMap<String, EnvironmentOverride>,
}

/// Raw declarative entity body as it appears in a config document. The
/// locator fields stay untyped because their names depend on the source
/// system's field mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDocument {
    pub source_database: String,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnDocument>,
    #[serde(default)]
    pub environment_override: BTreeMap<String, OverrideDocument>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverrideDocument {
    pub environment: String,
    #[serde(rename = "override")]
    pub fields: BTreeMap<String, Value>,
}

impl Entity {
    /// Normalize a declarative entity body: extract the three locator
    /// fields through the source system's field mapping (with legacy
    /// aliasing), map every declared column type to its canonical type,
    /// and validate environment overrides.
    pub fn from_document(id: &str, doc: &EntityDocument) -> Result<Self, DomainError> {
        let id = id.to_uppercase();
        let source_system = SourceSystem::parse(&doc.source_database)?;
        let mapping = source_system.field_mapping();

        let instance_name = extract_locator_field(&id, &doc.fields, &mapping.instance)?;
        let database_name = extract_locator_field(&id, &doc.fields, &mapping.database)?;
        let table_name = extract_locator_field(&id, &doc.fields, &mapping.table)?;

        let mut columns = ColumnMap::default();
        for (column_id, column) in &doc.columns {
            columns.insert(build_column(source_system, &id, column_id, column)?);
        }

        let mut environment_overrides = BTreeMap::new();
        for (key, block) in &doc.environment_override {
            let ov = resolve_override(&id, mapping, key, block, &table_name)?;
            environment_overrides.insert(key.to_uppercase(), ov);
        }

        Ok(Entity {
            id,
            source_system,
            instance_name,
            database_name,
            table_name,
            columns,
            environment_overrides,
        })
    }

    /// Locator override for `environment`, if one was declared.
    pub fn override_for(&self, environment: &str) -> Option<&EnvironmentOverride> {
        self.environment_overrides.get(&environment.to_uppercase())
    }
}

fn build_column(
    source_system: SourceSystem,
    entity_id: &str,
    column_id: &str,
    doc: &ColumnDocument,
) -> Result<Column, DomainError> {
    let canonical_type =
        CanonicalType::resolve(source_system, &doc.data_type, entity_id, column_id)?;
    Ok(Column {
        id: column_id.to_string(),
        name: doc.name.clone().unwrap_or_else(|| column_id.to_string()),
        declared_type: doc.data_type.clone(),
        canonical_type,
        description: doc.description.clone(),
    })
}

/// Pulls one locator field out of the raw field map. The specific name
/// wins; the legacy alias is accepted in its absence with a deprecation
/// warning.
fn extract_locator_field(
    entity_id: &str,
    fields: &BTreeMap<String, Value>,
    field: &LocatorField,
) -> Result<String, DomainError> {
    if let Some(value) = non_empty_str(fields.get(field.name)) {
        if let Some(alias) = field.legacy_alias {
            if fields.contains_key(alias) {
                warn!(
                    entity = entity_id,
                    field = field.name,
                    alias,
                    "both specific and legacy locator fields declared; using the specific one"
                );
            }
        }
        return Ok(value.to_string());
    }
    if let Some(alias) = field.legacy_alias {
        if let Some(value) = non_empty_str(fields.get(alias)) {
            warn!(
                entity = entity_id,
                alias,
                field = field.name,
                "legacy locator field name is deprecated; rename it"
            );
            return Ok(value.to_string());
        }
    }
    Err(DomainError::MissingLocatorField {
        entity_id: entity_id.to_string(),
        field: field.name.to_string(),
    })
}

fn resolve_override(
    entity_id: &str,
    mapping: &FieldMapping,
    key: &str,
    block: &OverrideDocument,
    base_table_name: &str,
) -> Result<EnvironmentOverride, DomainError> {
    if !key.eq_ignore_ascii_case(&block.environment) {
        return Err(DomainError::EnvironmentMismatch {
            entity_id: entity_id.to_string(),
            key: key.to_string(),
            label: block.environment.clone(),
        });
    }

    let instance_name = extract_locator_field(entity_id, &block.fields, &mapping.instance)?;
    let database_name = extract_locator_field(entity_id, &block.fields, &mapping.database)?;
    // The table override is optional and defaults to the base table.
    let table_name = match extract_locator_field(entity_id, &block.fields, &mapping.table) {
        Ok(name) => name,
        Err(DomainError::MissingLocatorField { .. }) => base_table_name.to_string(),
        Err(other) => return Err(other),
    };

    Ok(EnvironmentOverride {
        environment: block.environment.clone(),
        instance_name,
        database_name,
        table_name,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn doc(yaml: &str) -> EntityDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    const BASE: &str = r#"
source_database: BIGQUERY
project_name: my-project
dataset_name: quality
table_name: contact_details
columns:
  email:
    name: email
    data_type: STRING
    description: contact email
  signup_ts:
    data_type: TIMESTAMP
"#;

    #[test]
    fn test_normalize_declared_entity() -> Result<()> {
        let entity = Entity::from_document("contact_details", &doc(BASE))?;
        assert_eq!(entity.id, "CONTACT_DETAILS");
        assert_eq!(entity.instance_name, "my-project");
        assert_eq!(entity.database_name, "quality");
        assert_eq!(entity.table_name, "contact_details");
        assert_eq!(entity.columns.len(), 2);

        let email = entity.columns.get("EMAIL").unwrap();
        assert_eq!(email.id, "email");
        assert_eq!(email.canonical_type, CanonicalType::String);
        assert_eq!(email.description.as_deref(), Some("contact email"));

        // name defaults to the column id
        let ts = entity.columns.get("signup_ts").unwrap();
        assert_eq!(ts.name, "signup_ts");
        assert_eq!(ts.canonical_type, CanonicalType::Timestamp);
        Ok(())
    }

    #[test]
    fn test_legacy_locator_aliases_accepted() -> Result<()> {
        let entity = Entity::from_document(
            "t",
            &doc(r#"
source_database: BIGQUERY
instance_name: my-project
database_name: quality
table_name: t
columns: {}
"#),
        )?;
        assert_eq!(entity.instance_name, "my-project");
        assert_eq!(entity.database_name, "quality");
        Ok(())
    }

    #[test]
    fn test_missing_locator_field_names_entity_and_field() {
        let err = Entity::from_document(
            "t",
            &doc("source_database: BIGQUERY\ntable_name: t\ncolumns: {}\n"),
        )
        .unwrap_err();
        match err {
            DomainError::MissingLocatorField { entity_id, field } => {
                assert_eq!(entity_id, "T");
                assert_eq!(field, "project_name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_environment_override_resolution() -> Result<()> {
        let yaml = format!(
            "{BASE}environment_override:\n  TEST:\n    environment: test\n    override:\n      project_name: test-project\n      dataset_name: quality_test\n"
        );
        let entity = Entity::from_document("contact_details", &doc(&yaml))?;
        let ov = entity.override_for("test").unwrap();
        assert_eq!(ov.instance_name, "test-project");
        assert_eq!(ov.database_name, "quality_test");
        // table name defaults to the base table when omitted
        assert_eq!(ov.table_name, "contact_details");
        Ok(())
    }

    #[test]
    fn test_environment_key_label_mismatch() {
        let yaml = format!(
            "{BASE}environment_override:\n  TEST:\n    environment: prod\n    override:\n      project_name: p\n      dataset_name: d\n"
        );
        let err = Entity::from_document("contact_details", &doc(&yaml)).unwrap_err();
        assert!(matches!(err, DomainError::EnvironmentMismatch { .. }));
    }

    #[test]
    fn test_unmapped_column_type_is_hard_error() {
        let err = Entity::from_document(
            "t",
            &doc(r#"
source_database: BIGQUERY
project_name: p
dataset_name: d
table_name: t
columns:
  geo:
    data_type: GEOGRAPHY
"#),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::UnmappedColumnType { .. }));
    }

    #[test]
    fn test_column_lookup_is_case_insensitive_case_preserving() {
        let mut columns = ColumnMap::default();
        columns.insert(Column {
            id: "MixedCase".to_string(),
            name: "MixedCase".to_string(),
            declared_type: "STRING".to_string(),
            canonical_type: CanonicalType::String,
            description: None,
        });
        assert_eq!(columns.get("mixedcase").unwrap().id, "MixedCase");
        assert_eq!(columns.get("MIXEDCASE").unwrap().id, "MixedCase");
    }
}
