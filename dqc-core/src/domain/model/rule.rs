// dqc-core/src/domain/model/rule.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// The closed set of rule kinds the SQL compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    NotNull,
    NotBlank,
    Regex,
    CustomSqlExpr,
    CustomSqlStatement,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleType::NotNull => "NOT_NULL",
            RuleType::NotBlank => "NOT_BLANK",
            RuleType::Regex => "REGEX",
            RuleType::CustomSqlExpr => "CUSTOM_SQL_EXPR",
            RuleType::CustomSqlStatement => "CUSTOM_SQL_STATEMENT",
        };
        write!(f, "{s}")
    }
}

/// A named, typed check template. The cached canonical rule is immutable;
/// `rule_binding_arguments` only ever appears on a per-binding clone
/// (value-copy-on-bind), never on the cached instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(skip, default)]
    pub id: String,
    pub rule_type: RuleType,
    #[serde(default)]
    pub dimension: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    #[serde(skip, default)]
    pub rule_binding_arguments: Option<BTreeMap<String, Value>>,
}

impl Rule {
    /// Derived copy carrying per-binding arguments.
    pub fn with_binding_arguments(&self, arguments: BTreeMap<String, Value>) -> Rule {
        let mut bound = self.clone();
        bound.rule_binding_arguments = Some(arguments);
        bound
    }

    /// Non-empty string parameter, if present.
    pub fn string_param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Declared `custom_sql_arguments` names, in declaration order.
    pub fn custom_sql_arguments(&self) -> Vec<String> {
        self.params
            .get("custom_sql_arguments")
            .and_then(Value::as_sequence)
            .map(|seq| {
                seq.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
