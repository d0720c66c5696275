// dqc-core/src/domain/model/filter.rs

use serde::{Deserialize, Serialize};

/// Reusable boolean SQL predicate narrowing the rows a binding validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    #[serde(skip, default)]
    pub id: String,
    pub filter_sql_expr: String,
}

/// Named group of columns used by reference-integrity style rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceColumns {
    #[serde(skip, default)]
    pub id: String,
    pub include_reference_columns: Vec<String>,
}
