// dqc-core/src/infrastructure/config/document.rs

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

/// One declarative config file as written by a data engineer. Every
/// category is optional; a file may declare any mix of them.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    #[serde(default)]
    pub entities: BTreeMap<String, Value>,
    #[serde(default)]
    pub row_filters: BTreeMap<String, Value>,
    #[serde(default)]
    pub rule_dimensions: Vec<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, Value>,
    #[serde(default)]
    pub reference_columns: BTreeMap<String, Value>,
    /// Kept as a YAML mapping so in-file declaration order survives;
    /// bindings are resolved in that order.
    #[serde(default)]
    pub rule_bindings: serde_yaml::Mapping,
}

/// All config files of a run merged category-wise, ids upper-cased,
/// definitions still raw. The configuration cache turns this into typed
/// models.
#[derive(Debug, Default)]
pub struct RawConfig {
    pub entities: BTreeMap<String, Value>,
    pub row_filters: BTreeMap<String, Value>,
    pub rule_dimensions: Vec<String>,
    pub rules: BTreeMap<String, Value>,
    pub reference_columns: BTreeMap<String, Value>,
    pub rule_bindings: BTreeMap<String, Value>,
    /// Rule binding ids in declaration order (first file wins a slot).
    pub rule_binding_order: Vec<String>,
}
