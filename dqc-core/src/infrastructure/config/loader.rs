// dqc-core/src/infrastructure/config/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::infrastructure::config::document::{ConfigDocument, RawConfig};
use crate::infrastructure::error::InfrastructureError;

/// Loads every `.yml`/`.yaml` document under `path` (a directory tree or
/// a single file) and merges them category-wise. Duplicate ids across
/// files are tolerated only when the two definitions are deeply
/// identical; any divergence aborts the load.
#[instrument(skip(path))]
pub fn load_configs(path: &Path) -> Result<RawConfig, InfrastructureError> {
    let files = discover_config_files(path)?;
    if files.is_empty() {
        return Err(InfrastructureError::ConfigNotFound(
            path.display().to_string(),
        ));
    }
    info!(count = files.len(), root = %path.display(), "Loading config documents");

    let mut merged = RawConfig::default();
    for file in files {
        let content = fs::read_to_string(&file)?;
        let doc: ConfigDocument = serde_yaml::from_str(&content)?;
        debug!(file = %file.display(), "Merging config document");
        merge_document(&mut merged, doc)?;
    }
    Ok(merged)
}

fn discover_config_files(path: &Path) -> Result<Vec<PathBuf>, InfrastructureError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            )
        })
        .collect();
    // Deterministic merge order regardless of directory traversal quirks
    files.sort();
    Ok(files)
}

fn merge_document(merged: &mut RawConfig, doc: ConfigDocument) -> Result<(), InfrastructureError> {
    merge_category(&mut merged.entities, doc.entities, "entity")?;
    merge_category(&mut merged.row_filters, doc.row_filters, "row filter")?;
    merge_category(&mut merged.rules, doc.rules, "rule")?;
    merge_category(
        &mut merged.reference_columns,
        doc.reference_columns,
        "reference columns",
    )?;
    merge_dimensions(merged, doc.rule_dimensions)?;

    for (key, value) in doc.rule_bindings {
        let id = key
            .as_str()
            .map(str::to_uppercase)
            .ok_or_else(|| InfrastructureError::ConfigShape {
                category: "rule binding",
                id: format!("{key:?}"),
                reason: "id must be a string".to_string(),
            })?;
        match merged.rule_bindings.get(&id) {
            Some(existing) if *existing == value => {}
            Some(_) => {
                return Err(InfrastructureError::ConfigConflict {
                    category: "rule binding",
                    ids: id,
                });
            }
            None => {
                merged.rule_binding_order.push(id.clone());
                merged.rule_bindings.insert(id, value);
            }
        }
    }
    Ok(())
}

/// Id-keyed merge step: intersecting ids must be deeply identical.
fn merge_category(
    seen: &mut BTreeMap<String, Value>,
    incoming: BTreeMap<String, Value>,
    category: &'static str,
) -> Result<(), InfrastructureError> {
    let mut conflicts: Vec<String> = Vec::new();
    for (id, value) in incoming {
        let id = id.to_uppercase();
        match seen.get(&id) {
            Some(existing) if *existing == value => {} // identical duplicate: no-op
            Some(_) => conflicts.push(id),
            None => {
                seen.insert(id, value);
            }
        }
    }
    if !conflicts.is_empty() {
        return Err(InfrastructureError::ConfigConflict {
            category,
            ids: conflicts.join(", "),
        });
    }
    Ok(())
}

/// Dimensions are a flat list: a duplicate declaration is accepted when
/// the sorted lists agree, rejected otherwise.
fn merge_dimensions(
    merged: &mut RawConfig,
    incoming: Vec<String>,
) -> Result<(), InfrastructureError> {
    if incoming.is_empty() {
        return Ok(());
    }
    if merged.rule_dimensions.is_empty() {
        merged.rule_dimensions = incoming;
        return Ok(());
    }
    let mut a = merged.rule_dimensions.clone();
    let mut b = incoming;
    a.sort();
    b.sort();
    if a != b {
        return Err(InfrastructureError::ConfigConflict {
            category: "rule dimensions",
            ids: b.join(", "),
        });
    }
    Ok(())
}
