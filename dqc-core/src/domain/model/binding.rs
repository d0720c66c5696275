// dqc-core/src/domain/model/binding.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::domain::error::DomainError;

/// One rule reference inside a rule binding: either a bare rule id or a
/// single-entry mapping of rule id to binding arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleRef {
    Id(String),
    WithArguments(BTreeMap<String, BTreeMap<String, Value>>),
}

impl RuleRef {
    /// Normalized (rule id, optional arguments). A mapping carrying more
    /// than one entry is malformed.
    pub fn resolve_parts(
        &self,
        binding_id: &str,
    ) -> Result<(String, Option<BTreeMap<String, Value>>), DomainError> {
        match self {
            RuleRef::Id(id) => Ok((id.to_uppercase(), None)),
            RuleRef::WithArguments(map) => {
                let mut entries = map.iter();
                let (id, arguments) = entries.next().ok_or_else(|| {
                    DomainError::MalformedRuleReference {
                        binding_id: binding_id.to_string(),
                        rule_id: "<empty>".to_string(),
                    }
                })?;
                if entries.next().is_some() {
                    return Err(DomainError::MalformedRuleReference {
                        binding_id: binding_id.to_string(),
                        rule_id: id.clone(),
                    });
                }
                Ok((id.to_uppercase(), Some(arguments.clone())))
            }
        }
    }
}

/// Declaration tying one entity, one column, one row filter, and an
/// ordered list of rules into an executable check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBinding {
    #[serde(skip, default)]
    pub id: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub entity_uri: Option<String>,
    pub column_id: String,
    pub row_filter_id: String,
    #[serde(default)]
    pub reference_columns_id: Option<String>,
    #[serde(default)]
    pub incremental_time_filter_column_id: Option<String>,
    pub rule_ids: Vec<RuleRef>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl RuleBinding {
    /// Entity id and entity uri are mutually exclusive; exactly one must
    /// be present.
    pub fn validate_entity_target(&self) -> Result<(), DomainError> {
        match (&self.entity_id, &self.entity_uri) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(DomainError::AmbiguousEntityTarget {
                binding_id: self.id.clone(),
            }),
        }
    }
}
