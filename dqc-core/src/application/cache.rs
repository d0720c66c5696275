// dqc-core/src/application/cache.rs

use std::collections::{HashMap, HashSet};

use serde_yaml::Value;
use tracing::{debug, info};

use crate::domain::error::DomainError;
use crate::domain::model::{Entity, EntityDocument, ReferenceColumns, RowFilter, Rule, RuleBinding};
use crate::error::DqcError;
use crate::infrastructure::config::RawConfig;
use crate::infrastructure::error::InfrastructureError;

/// Id-indexed store over all loaded and derived configs, one partition
/// per config type. Holds no state across runs. Ids are stored and probed
/// upper-cased; entities normalized here keep their original column case
/// behind the case-insensitive column index.
#[derive(Debug, Default)]
pub struct ConfigCache {
    entities: HashMap<String, Entity>,
    /// Remotely-resolved entities, keyed by the URI compound primary key.
    remote_entities: HashMap<String, Entity>,
    rules: HashMap<String, Rule>,
    row_filters: HashMap<String, RowFilter>,
    reference_columns: HashMap<String, ReferenceColumns>,
    rule_dimensions: Vec<String>,
    rule_bindings: HashMap<String, RuleBinding>,
    binding_order: Vec<String>,
}

fn parse_typed<T: serde::de::DeserializeOwned>(
    category: &'static str,
    id: &str,
    value: &Value,
) -> Result<T, InfrastructureError> {
    serde_yaml::from_value(value.clone()).map_err(|e| InfrastructureError::ConfigShape {
        category,
        id: id.to_string(),
        reason: e.to_string(),
    })
}

impl ConfigCache {
    /// Bulk-load from a merged loader output. Entities are normalized
    /// immediately; rule dimension membership is validated here, the
    /// first moment rules and the dimension list coexist.
    pub fn from_raw(raw: RawConfig) -> Result<Self, DqcError> {
        let mut cache = ConfigCache {
            rule_dimensions: raw.rule_dimensions,
            binding_order: raw.rule_binding_order,
            ..ConfigCache::default()
        };

        for (id, value) in &raw.entities {
            let doc: EntityDocument = parse_typed("entity", id, value)?;
            let entity = Entity::from_document(id, &doc)?;
            cache.entities.insert(entity.id.clone(), entity);
        }

        let dimensions: HashSet<&str> =
            cache.rule_dimensions.iter().map(String::as_str).collect();
        for (id, value) in &raw.rules {
            let mut rule: Rule = parse_typed("rule", id, value)?;
            rule.id = id.clone();
            if let Some(dimension) = &rule.dimension {
                if !dimensions.contains(dimension.as_str()) {
                    return Err(DomainError::UnknownDimension {
                        rule_id: rule.id,
                        dimension: dimension.clone(),
                    }
                    .into());
                }
            }
            cache.rules.insert(rule.id.clone(), rule);
        }

        for (id, value) in &raw.row_filters {
            let mut filter: RowFilter = parse_typed("row filter", id, value)?;
            filter.id = id.clone();
            cache.row_filters.insert(id.clone(), filter);
        }

        for (id, value) in &raw.reference_columns {
            let mut columns: ReferenceColumns = parse_typed("reference columns", id, value)?;
            columns.id = id.clone();
            cache.reference_columns.insert(id.clone(), columns);
        }

        for (id, value) in &raw.rule_bindings {
            let mut binding: RuleBinding = parse_typed("rule binding", id, value)?;
            binding.id = id.clone();
            cache.rule_bindings.insert(id.clone(), binding);
        }

        info!(
            entities = cache.entities.len(),
            rules = cache.rules.len(),
            row_filters = cache.row_filters.len(),
            rule_bindings = cache.rule_bindings.len(),
            "Configuration cache loaded"
        );
        Ok(cache)
    }

    // --- POINT LOOKUPS (case-insensitive probes) ---

    pub fn entity(&self, id: &str) -> Result<&Entity, DomainError> {
        self.entities
            .get(&id.to_uppercase())
            .ok_or_else(|| DomainError::not_found("Entity", id))
    }

    pub fn remote_entity(&self, compound_key: &str) -> Option<&Entity> {
        self.remote_entities.get(compound_key)
    }

    pub fn rule(&self, id: &str) -> Result<&Rule, DomainError> {
        self.rules
            .get(&id.to_uppercase())
            .ok_or_else(|| DomainError::not_found("Rule", id))
    }

    pub fn row_filter(&self, id: &str) -> Result<&RowFilter, DomainError> {
        self.row_filters
            .get(&id.to_uppercase())
            .ok_or_else(|| DomainError::not_found("Row filter", id))
    }

    pub fn reference_columns(&self, id: &str) -> Result<&ReferenceColumns, DomainError> {
        self.reference_columns
            .get(&id.to_uppercase())
            .ok_or_else(|| DomainError::not_found("Reference columns", id))
    }

    pub fn rule_binding(&self, id: &str) -> Result<&RuleBinding, DomainError> {
        self.rule_bindings
            .get(&id.to_uppercase())
            .ok_or_else(|| DomainError::not_found("Rule binding", id))
    }

    /// Rule binding ids in declaration order.
    pub fn rule_binding_ids(&self) -> &[String] {
        &self.binding_order
    }

    pub fn rule_dimensions(&self) -> &[String] {
        &self.rule_dimensions
    }

    // --- REMOTE ENTITY UPSERT ---

    /// Inserts a remotely-resolved entity under its compound primary key.
    /// Re-inserting identical content is a no-op (returns false); within a
    /// run the registry is assumed stable, so divergent content replaces
    /// the cached entry.
    pub fn upsert_remote_entity(&mut self, compound_key: &str, entity: Entity) -> bool {
        match self.remote_entities.get(compound_key) {
            Some(existing) if *existing == entity => false,
            Some(_) => {
                debug!(key = compound_key, "Replacing remote entity with divergent content");
                self.remote_entities.insert(compound_key.to_string(), entity);
                true
            }
            None => {
                self.remote_entities.insert(compound_key.to_string(), entity);
                true
            }
        }
    }

    // --- MEMBERSHIP / COUNTS ---

    pub fn entity_count(&self) -> usize {
        self.entities.len() + self.remote_entities.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_binding_count(&self) -> usize {
        self.rule_bindings.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::BTreeMap;

    fn raw_from_yaml(yaml: &str) -> RawConfig {
        let doc: crate::infrastructure::config::ConfigDocument =
            serde_yaml::from_str(yaml).unwrap();
        let mut raw = RawConfig {
            entities: doc
                .entities
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect(),
            row_filters: doc
                .row_filters
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect(),
            rule_dimensions: doc.rule_dimensions,
            rules: doc
                .rules
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect(),
            reference_columns: BTreeMap::new(),
            rule_bindings: BTreeMap::new(),
            rule_binding_order: Vec::new(),
        };
        for (k, v) in doc.rule_bindings {
            let id = k.as_str().unwrap().to_uppercase();
            raw.rule_binding_order.push(id.clone());
            raw.rule_bindings.insert(id, v);
        }
        raw
    }

    const CONFIG: &str = r#"
entities:
  sales:
    source_database: BIGQUERY
    project_name: p
    dataset_name: d
    table_name: sales
    columns:
      amount:
        data_type: NUMERIC
rules:
  amount_not_null:
    rule_type: NOT_NULL
    dimension: completeness
row_filters:
  none:
    filter_sql_expr: "True"
rule_dimensions:
  - completeness
rule_bindings:
  sales_amount_check:
    entity_id: SALES
    column_id: amount
    row_filter_id: NONE
    rule_ids:
      - AMOUNT_NOT_NULL
"#;

    #[test]
    fn test_bulk_load_and_lookups() -> Result<()> {
        let cache = ConfigCache::from_raw(raw_from_yaml(CONFIG))?;
        assert_eq!(cache.entity_count(), 1);
        assert_eq!(cache.rule_count(), 1);
        assert_eq!(cache.rule_binding_count(), 1);

        // probes are case-insensitive
        assert_eq!(cache.entity("sales")?.table_name, "sales");
        assert_eq!(cache.rule("Amount_Not_Null")?.id, "AMOUNT_NOT_NULL");
        assert_eq!(cache.row_filter("none")?.filter_sql_expr, "True");
        assert_eq!(cache.rule_binding_ids(), ["SALES_AMOUNT_CHECK"]);
        Ok(())
    }

    #[test]
    fn test_missing_id_is_a_named_error() -> Result<()> {
        let cache = ConfigCache::from_raw(raw_from_yaml(CONFIG))?;
        let err = cache.rule("NO_SUCH_RULE").unwrap_err();
        assert!(err.to_string().contains("NO_SUCH_RULE"));
        Ok(())
    }

    #[test]
    fn test_unknown_dimension_rejected_at_load() {
        let bad = CONFIG.replace("dimension: completeness", "dimension: accuracy");
        let err = ConfigCache::from_raw(raw_from_yaml(&bad)).unwrap_err();
        assert!(err.to_string().contains("accuracy"));
    }

    #[test]
    fn test_remote_entity_upsert_is_idempotent() -> Result<()> {
        let mut cache = ConfigCache::from_raw(raw_from_yaml(CONFIG))?;
        let entity = cache.entity("SALES")?.clone();
        let key = "projects/p/locations/l/lakes/lk/zones/z/entities/sales";

        assert!(cache.upsert_remote_entity(key, entity.clone()));
        assert!(!cache.upsert_remote_entity(key, entity.clone()));
        assert!(cache.remote_entity(key).is_some());
        assert_eq!(cache.entity_count(), 2);
        Ok(())
    }
}
