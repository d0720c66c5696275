// dqc-core/src/ports/registry.rs

use crate::domain::uri::EntityUri;
use crate::error::DqcError;

/// A remote metadata-registry entity, shaped so the entity normalizer can
/// consume it like a locally declared one.
#[derive(Debug, Clone)]
pub struct RemoteEntity {
    pub source_system: String,
    pub instance_name: String,
    pub database_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

/// One column as reported by a registry or a live warehouse schema.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub description: Option<String>,
}

/// Fetches entity definitions held in the external metadata registry.
pub trait MetadataRegistry {
    /// `Ok(None)` is the not-found signal; errors are transport failures.
    fn fetch_entity(&self, uri: &EntityUri) -> Result<Option<RemoteEntity>, DqcError>;
}

/// Fetches the live column list of an entity whose columns are not
/// declared locally.
pub trait WarehouseSchema {
    fn fetch_columns(
        &self,
        instance_name: &str,
        database_name: &str,
        table_name: &str,
    ) -> Result<Vec<ColumnSchema>, DqcError>;
}
