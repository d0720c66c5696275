// dqc-core/tests/resolution_tests.rs
//
// End-to-end: write a multi-file YAML config tree to disk, load and merge
// it, build the cache, and resolve every rule binding against a mock
// metadata registry.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use dqc_core::domain::uri::EntityUri;
use dqc_core::ports::{ColumnSchema, MetadataRegistry, RemoteEntity, WarehouseSchema};
use dqc_core::{ConfigCache, DqcError, Resolver};

/// Test environment holding a config tree on disk.
struct ConfigTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl ConfigTestEnv {
    fn new(files: &[(&str, &str)]) -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("configs");
        fs::create_dir_all(&root)?;
        for (name, content) in files {
            fs::write(root.join(name), content)?;
        }
        Ok(Self { _tmp: tmp, root })
    }

    fn cache(&self) -> Result<ConfigCache> {
        let raw = dqc_core::infrastructure::config::load_configs(&self.root)?;
        Ok(ConfigCache::from_raw(raw)?)
    }
}

struct StaticRegistry;

impl MetadataRegistry for StaticRegistry {
    fn fetch_entity(&self, uri: &EntityUri) -> Result<Option<RemoteEntity>, DqcError> {
        if !uri.entity_id.eq_ignore_ascii_case("orders") {
            return Ok(None);
        }
        Ok(Some(RemoteEntity {
            source_system: "BIGQUERY".to_string(),
            instance_name: "analytics-prod".to_string(),
            database_name: "orders_zone".to_string(),
            table_name: "orders".to_string(),
            columns: vec![
                ColumnSchema {
                    name: "order_id".to_string(),
                    data_type: "STRING".to_string(),
                    description: Some("primary key".to_string()),
                },
                ColumnSchema {
                    name: "placed_at".to_string(),
                    data_type: "TIMESTAMP".to_string(),
                    description: None,
                },
            ],
        }))
    }
}

/// Registry whose entities carry no schema, forcing column discovery
/// through the warehouse port.
struct SchemalessRegistry;

impl MetadataRegistry for SchemalessRegistry {
    fn fetch_entity(&self, uri: &EntityUri) -> Result<Option<RemoteEntity>, DqcError> {
        if !uri.entity_id.eq_ignore_ascii_case("leads") {
            return Ok(None);
        }
        Ok(Some(RemoteEntity {
            source_system: "BIGQUERY".to_string(),
            instance_name: "analytics-prod".to_string(),
            database_name: "sales_zone".to_string(),
            table_name: "leads".to_string(),
            columns: Vec::new(),
        }))
    }
}

struct StaticWarehouse;

impl WarehouseSchema for StaticWarehouse {
    fn fetch_columns(
        &self,
        _instance_name: &str,
        _database_name: &str,
        _table_name: &str,
    ) -> Result<Vec<ColumnSchema>, DqcError> {
        Ok(vec![
            ColumnSchema {
                name: "email".to_string(),
                data_type: "STRING".to_string(),
                description: None,
            },
            ColumnSchema {
                name: "signed_up_at".to_string(),
                data_type: "TIMESTAMP".to_string(),
                description: None,
            },
        ])
    }
}

const ENTITIES: &str = r#"
entities:
  CUSTOMERS:
    source_database: BIGQUERY
    project_name: analytics-prod
    dataset_name: crm
    table_name: customers
    columns:
      email:
        data_type: STRING
        description: contact email
      created_at:
        data_type: TIMESTAMP
"#;

const RULES: &str = r#"
rules:
  VALID_EMAIL:
    rule_type: REGEX
    dimension: conformance
    params:
      pattern: '^[^@]+@[^@]+$'
  NOT_NULL_SIMPLE:
    rule_type: NOT_NULL
    dimension: completeness
rule_dimensions:
  - completeness
  - conformance
"#;

const FILTERS_AND_BINDINGS: &str = r#"
row_filters:
  NONE:
    filter_sql_expr: "True"
rule_bindings:
  CUSTOMER_EMAIL_CHECK:
    entity_id: CUSTOMERS
    column_id: email
    row_filter_id: NONE
    incremental_time_filter_column_id: created_at
    rule_ids:
      - NOT_NULL_SIMPLE
      - VALID_EMAIL
  REMOTE_ORDER_CHECK:
    entity_uri: dataplex://projects/analytics-prod/locations/eu/lakes/sales/zones/raw/entities/orders
    column_id: order_id
    row_filter_id: NONE
    rule_ids:
      - NOT_NULL_SIMPLE
"#;

const DISCOVERY_CONFIG: &str = r#"
entities:
  PROSPECTS:
    source_database: BIGQUERY
    project_name: analytics-prod
    dataset_name: crm
    table_name: prospects
row_filters:
  NONE:
    filter_sql_expr: "True"
rules:
  NOT_NULL_SIMPLE:
    rule_type: NOT_NULL
rule_bindings:
  PROSPECT_EMAIL_CHECK:
    entity_id: PROSPECTS
    column_id: email
    row_filter_id: NONE
    rule_ids:
      - NOT_NULL_SIMPLE
  REMOTE_LEAD_CHECK:
    entity_uri: dataplex://projects/analytics-prod/locations/eu/lakes/sales/zones/raw/entities/leads
    column_id: email
    row_filter_id: NONE
    rule_ids:
      - NOT_NULL_SIMPLE
"#;

#[test]
fn test_full_pipeline_resolves_all_bindings_in_order() -> Result<()> {
    let env = ConfigTestEnv::new(&[
        ("entities.yaml", ENTITIES),
        ("rules.yaml", RULES),
        ("bindings.yaml", FILTERS_AND_BINDINGS),
    ])?;
    let mut cache = env.cache()?;
    let registry = StaticRegistry;

    let views = Resolver::new(&mut cache)
        .with_metadata_registry(&registry)
        .resolve_all()?;

    assert_eq!(views.len(), 2);
    // declaration order, not alphabetical
    assert_eq!(views[0].rule_binding_id, "CUSTOMER_EMAIL_CHECK");
    assert_eq!(views[1].rule_binding_id, "REMOTE_ORDER_CHECK");

    let email_check = &views[0];
    assert_eq!(email_check.rules[0].sql_expr, "email IS NOT NULL");
    assert_eq!(
        email_check.rules[1].sql_expr,
        "REGEXP_CONTAINS(CAST(email AS STRING), '^[^@]+@[^@]+$')"
    );
    assert_eq!(
        email_check.incremental_time_filter_column.as_deref(),
        Some("created_at")
    );
    assert!(!email_check.content_hash.is_empty());

    let remote_check = &views[1];
    assert_eq!(remote_check.entity.id, "ORDERS");
    assert_eq!(remote_check.entity.database_name, "orders_zone");
    assert_eq!(remote_check.rules[0].sql_expr, "order_id IS NOT NULL");
    Ok(())
}

#[test]
fn test_remote_entity_lands_in_the_cache() -> Result<()> {
    let env = ConfigTestEnv::new(&[
        ("entities.yaml", ENTITIES),
        ("rules.yaml", RULES),
        ("bindings.yaml", FILTERS_AND_BINDINGS),
    ])?;
    let mut cache = env.cache()?;
    let registry = StaticRegistry;

    Resolver::new(&mut cache)
        .with_metadata_registry(&registry)
        .resolve("REMOTE_ORDER_CHECK")?;

    let key = "projects/analytics-prod/locations/eu/lakes/sales/zones/raw/entities/orders";
    let cached = cache.remote_entity(key).expect("remote entity cached");
    assert_eq!(cached.id, "ORDERS");
    assert_eq!(cache.entity_count(), 2);
    Ok(())
}

#[test]
fn test_registry_not_found_aborts_the_binding() -> Result<()> {
    let bindings = FILTERS_AND_BINDINGS.replace("entities/orders", "entities/unknown");
    let env = ConfigTestEnv::new(&[
        ("entities.yaml", ENTITIES),
        ("rules.yaml", RULES),
        ("bindings.yaml", &bindings),
    ])?;
    let mut cache = env.cache()?;
    let registry = StaticRegistry;

    let err = Resolver::new(&mut cache)
        .with_metadata_registry(&registry)
        .resolve("REMOTE_ORDER_CHECK")
        .unwrap_err();
    assert!(err.to_string().contains("unknown"));
    Ok(())
}

#[test]
fn test_undeclared_local_columns_come_from_the_warehouse() -> Result<()> {
    let env = ConfigTestEnv::new(&[("discovery.yaml", DISCOVERY_CONFIG)])?;
    let mut cache = env.cache()?;
    let warehouse = StaticWarehouse;

    let view = Resolver::new(&mut cache)
        .with_warehouse_schema(&warehouse)
        .resolve("PROSPECT_EMAIL_CHECK")?;

    assert_eq!(view.entity.id, "PROSPECTS");
    assert_eq!(view.column.name, "email");
    assert_eq!(view.rules[0].sql_expr, "email IS NOT NULL");
    Ok(())
}

#[test]
fn test_schemaless_remote_entity_is_discovered_and_cached() -> Result<()> {
    let env = ConfigTestEnv::new(&[("discovery.yaml", DISCOVERY_CONFIG)])?;
    let mut cache = env.cache()?;
    let registry = SchemalessRegistry;
    let warehouse = StaticWarehouse;

    let view = Resolver::new(&mut cache)
        .with_metadata_registry(&registry)
        .with_warehouse_schema(&warehouse)
        .resolve("REMOTE_LEAD_CHECK")?;

    assert_eq!(view.entity.id, "LEADS");
    assert_eq!(view.rules[0].sql_expr, "email IS NOT NULL");

    // the discovered schema is what lands in the cache partition
    let key = "projects/analytics-prod/locations/eu/lakes/sales/zones/raw/entities/leads";
    let cached = cache.remote_entity(key).expect("remote entity cached");
    assert!(cached.columns.get("email").is_some());
    assert!(cached.columns.get("signed_up_at").is_some());
    Ok(())
}

#[test]
fn test_conflicting_files_abort_the_whole_load() -> Result<()> {
    let divergent = RULES.replace("rule_type: REGEX", "rule_type: NOT_BLANK");
    let env = ConfigTestEnv::new(&[
        ("rules_a.yaml", RULES),
        ("rules_b.yaml", &divergent),
    ])?;
    let err = env.cache().unwrap_err();
    assert!(err.to_string().contains("VALID_EMAIL"));
    Ok(())
}

#[test]
fn test_duplicate_identical_files_merge_cleanly() -> Result<()> {
    let env = ConfigTestEnv::new(&[
        ("entities.yaml", ENTITIES),
        ("rules_a.yaml", RULES),
        ("rules_b.yaml", RULES),
        ("bindings.yaml", FILTERS_AND_BINDINGS),
    ])?;
    let cache = env.cache()?;
    assert_eq!(cache.rule_count(), 2);
    Ok(())
}
