// dqc-core/src/application/resolver.rs

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::application::cache::ConfigCache;
use crate::domain::error::DomainError;
use crate::domain::model::entity::{Column, ColumnMap, Entity};
use crate::domain::model::{RowFilter, Rule, RuleBinding};
use crate::domain::sql;
use crate::domain::types::{CanonicalType, SourceSystem};
use crate::domain::uri::EntityUri;
use crate::error::DqcError;
use crate::ports::{MetadataRegistry, RemoteEntity, WarehouseSchema};

/// The fully resolved, placeholder-free configuration emitted for one rule
/// binding, ready for the downstream SQL-rendering step.
#[derive(Debug, Clone, Serialize)]
pub struct RuleBindingViewModel {
    pub rule_binding_id: String,
    pub entity: EntityView,
    pub column: ColumnView,
    pub row_filter: RowFilterView,
    pub rules: Vec<ResolvedRule>,
    pub rule_ids: Vec<String>,
    pub reference_columns: Option<Vec<String>>,
    pub incremental_time_filter_column: Option<String>,
    pub metadata: BTreeMap<String, Value>,
    /// Content hash over everything above, for downstream idempotence
    /// bookkeeping. Not part of its own preimage.
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: String,
    pub source_system: SourceSystem,
    pub instance_name: String,
    pub database_name: String,
    pub table_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub id: String,
    pub name: String,
    pub canonical_type: CanonicalType,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFilterView {
    pub id: String,
    pub filter_sql_expr: String,
}

/// One rule bound to a concrete column: no open placeholders remain in
/// `sql_expr`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRule {
    pub id: String,
    pub rule_type: String,
    pub dimension: Option<String>,
    pub sql_expr: String,
}

/// Resolves rule bindings against a populated configuration cache.
/// Remote entity fetches and live-schema discovery go through the
/// injected ports; the resolver treats each call as one atomic
/// request/response.
pub struct Resolver<'a> {
    cache: &'a mut ConfigCache,
    registry: Option<&'a dyn MetadataRegistry>,
    warehouse: Option<&'a dyn WarehouseSchema>,
}

impl<'a> Resolver<'a> {
    pub fn new(cache: &'a mut ConfigCache) -> Self {
        Resolver {
            cache,
            registry: None,
            warehouse: None,
        }
    }

    pub fn with_metadata_registry(mut self, registry: &'a dyn MetadataRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_warehouse_schema(mut self, warehouse: &'a dyn WarehouseSchema) -> Self {
        self.warehouse = Some(warehouse);
        self
    }

    /// Resolves every rule binding in declaration order, stopping at the
    /// first failure (all-or-nothing per binding, fail-fast overall).
    pub fn resolve_all(&mut self) -> Result<Vec<RuleBindingViewModel>, DqcError> {
        let ids: Vec<String> = self.cache.rule_binding_ids().to_vec();
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            resolved.push(self.resolve(&id)?);
        }
        info!(count = resolved.len(), "All rule bindings resolved");
        Ok(resolved)
    }

    /// Resolves one rule binding into its view model. Any failure aborts
    /// the whole binding without emitting a partial result.
    pub fn resolve(&mut self, binding_id: &str) -> Result<RuleBindingViewModel, DqcError> {
        let binding = self.cache.rule_binding(binding_id)?.clone();
        binding.validate_entity_target()?;
        debug!(binding = %binding.id, "Resolving rule binding");

        // 1. Target entity: direct id or locator-driven remote lookup.
        let entity = self.resolve_entity(&binding)?;

        // 2. The bound column.
        let column = entity
            .columns
            .get(&binding.column_id)
            .ok_or_else(|| {
                DomainError::not_found_in("Column", &binding.column_id, format!(
                    "entity '{}', rule binding '{}'",
                    entity.id, binding.id
                ))
            })?
            .clone();

        // 3. Incremental time filter column must be temporal.
        let incremental_time_filter_column =
            self.resolve_incremental_column(&binding, &entity)?;

        // 4. Rules, in declaration order, each bound to the column.
        let (rules, rule_ids) = self.resolve_rules(&binding, &column)?;
        if rules.is_empty() {
            return Err(DomainError::EmptyRuleList {
                binding_id: binding.id.clone(),
            }
            .into());
        }

        // 5. Row filter.
        let row_filter = self.cache.row_filter(&binding.row_filter_id)?.clone();

        let reference_columns = match &binding.reference_columns_id {
            Some(id) => Some(
                self.cache
                    .reference_columns(id)?
                    .include_reference_columns
                    .clone(),
            ),
            None => None,
        };

        // 6. Emit the view model with its content hash.
        Ok(build_view_model(
            &binding,
            &entity,
            &column,
            &row_filter,
            rules,
            rule_ids,
            reference_columns,
            incremental_time_filter_column,
        ))
    }

    fn resolve_entity(&mut self, binding: &RuleBinding) -> Result<Entity, DqcError> {
        if let Some(entity_id) = &binding.entity_id {
            let entity = self.cache.entity(entity_id)?.clone();
            return self.with_discovered_columns(entity);
        }

        // Locator path: parse, then cache lookup by compound key, then the
        // registry collaborator on a miss.
        let uri = binding
            .entity_uri
            .as_deref()
            .ok_or_else(|| DomainError::AmbiguousEntityTarget {
                binding_id: binding.id.clone(),
            })?;
        let uri = EntityUri::parse(uri)?;
        let key = uri.compound_primary_key();

        if let Some(entity) = self.cache.remote_entity(&key) {
            return self.with_discovered_columns(entity.clone());
        }

        let registry = self.registry.ok_or_else(|| {
            DqcError::InternalError(format!(
                "rule binding '{}' needs a metadata registry to resolve '{}'",
                binding.id, uri.uri
            ))
        })?;
        let remote = registry.fetch_entity(&uri)?.ok_or_else(|| {
            DomainError::not_found_in("Entity", &uri.entity_id, format!(
                "metadata registry, uri '{}'",
                uri.uri
            ))
        })?;

        let entity = entity_from_remote(&uri.entity_id, &remote)?;
        let entity = self.with_discovered_columns(entity)?;
        self.cache.upsert_remote_entity(&key, entity.clone());
        Ok(entity)
    }

    /// Column discovery: an entity declared without columns gets its live
    /// schema from the warehouse collaborator.
    fn with_discovered_columns(&self, mut entity: Entity) -> Result<Entity, DqcError> {
        if !entity.columns.is_empty() {
            return Ok(entity);
        }
        let warehouse = match self.warehouse {
            Some(w) => w,
            None => return Ok(entity),
        };
        debug!(entity = %entity.id, "Discovering columns from live warehouse schema");
        let discovered = warehouse.fetch_columns(
            &entity.instance_name,
            &entity.database_name,
            &entity.table_name,
        )?;
        let mut columns = ColumnMap::default();
        for col in discovered {
            let canonical =
                CanonicalType::resolve(entity.source_system, &col.data_type, &entity.id, &col.name)?;
            columns.insert(Column {
                id: col.name.clone(),
                name: col.name,
                declared_type: col.data_type,
                canonical_type: canonical,
                description: col.description,
            });
        }
        entity.columns = columns;
        Ok(entity)
    }

    fn resolve_incremental_column(
        &self,
        binding: &RuleBinding,
        entity: &Entity,
    ) -> Result<Option<String>, DqcError> {
        let Some(column_id) = &binding.incremental_time_filter_column_id else {
            return Ok(None);
        };
        let column = entity.columns.get(column_id).ok_or_else(|| {
            DomainError::not_found_in("Column", column_id, format!(
                "entity '{}', incremental time filter of rule binding '{}'",
                entity.id, binding.id
            ))
        })?;
        if !column.canonical_type.is_temporal_filter() {
            return Err(DomainError::NonTemporalIncrementalColumn {
                binding_id: binding.id.clone(),
                column_id: column.id.clone(),
                canonical: column.canonical_type.to_string(),
            }
            .into());
        }
        Ok(Some(column.name.clone()))
    }

    fn resolve_rules(
        &self,
        binding: &RuleBinding,
        column: &Column,
    ) -> Result<(Vec<ResolvedRule>, Vec<String>), DqcError> {
        let mut resolved = Vec::with_capacity(binding.rule_ids.len());
        let mut rule_ids = Vec::with_capacity(binding.rule_ids.len());

        for rule_ref in &binding.rule_ids {
            let (rule_id, arguments) = rule_ref.resolve_parts(&binding.id)?;
            let canonical: &Rule = self.cache.rule(&rule_id)?;
            // Per-binding derived copy; the cached rule stays untouched.
            let rule = match arguments {
                Some(args) => canonical.with_binding_arguments(args),
                None => canonical.clone(),
            };

            let template = sql::compile(&rule)?;
            let sql_expr = template.bind_column(&column.name);

            resolved.push(ResolvedRule {
                id: rule.id.clone(),
                rule_type: rule.rule_type.to_string(),
                dimension: rule.dimension.clone(),
                sql_expr,
            });
            rule_ids.push(rule_id);
        }
        Ok((resolved, rule_ids))
    }
}

/// Translates a metadata-registry response into a normalized entity,
/// applying the same source-system and type-mapping rules as declared
/// entities.
fn entity_from_remote(entity_id: &str, remote: &RemoteEntity) -> Result<Entity, DqcError> {
    let source_system = SourceSystem::parse(&remote.source_system)?;
    let mut columns = ColumnMap::default();
    for col in &remote.columns {
        let canonical =
            CanonicalType::resolve(source_system, &col.data_type, entity_id, &col.name)?;
        columns.insert(Column {
            id: col.name.clone(),
            name: col.name.clone(),
            declared_type: col.data_type.clone(),
            canonical_type: canonical,
            description: col.description.clone(),
        });
    }
    Ok(Entity {
        id: entity_id.to_uppercase(),
        source_system,
        instance_name: remote.instance_name.clone(),
        database_name: remote.database_name.clone(),
        table_name: remote.table_name.clone(),
        columns,
        environment_overrides: BTreeMap::new(),
    })
}

#[allow(clippy::too_many_arguments)]
fn build_view_model(
    binding: &RuleBinding,
    entity: &Entity,
    column: &Column,
    row_filter: &RowFilter,
    rules: Vec<ResolvedRule>,
    rule_ids: Vec<String>,
    reference_columns: Option<Vec<String>>,
    incremental_time_filter_column: Option<String>,
) -> RuleBindingViewModel {
    let mut view = RuleBindingViewModel {
        rule_binding_id: binding.id.clone(),
        entity: EntityView {
            id: entity.id.clone(),
            source_system: entity.source_system,
            instance_name: entity.instance_name.clone(),
            database_name: entity.database_name.clone(),
            table_name: entity.table_name.clone(),
        },
        column: ColumnView {
            id: column.id.clone(),
            name: column.name.clone(),
            canonical_type: column.canonical_type,
        },
        row_filter: RowFilterView {
            id: row_filter.id.clone(),
            filter_sql_expr: row_filter.filter_sql_expr.clone(),
        },
        rules,
        rule_ids,
        reference_columns,
        incremental_time_filter_column,
        metadata: binding.metadata.clone(),
        content_hash: String::new(),
    };
    view.content_hash = content_hash(&view);
    view
}

/// Sha256 over the canonical JSON serialization of the view model (with
/// the hash field itself still empty).
fn content_hash(view: &RuleBindingViewModel) -> String {
    let serialized = serde_json::to_string(view).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}
