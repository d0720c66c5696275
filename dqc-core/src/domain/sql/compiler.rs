// dqc-core/src/domain/sql/compiler.rs

use std::collections::BTreeMap;

use regex::Regex;
use serde_yaml::Value;

use crate::domain::error::DomainError;
use crate::domain::model::rule::{Rule, RuleType};
use crate::domain::sql::guard::reject_forbidden_tokens;
use crate::domain::sql::template::{
    escape_dollars, references_placeholder, substitute_partial, SqlTemplate,
};

/// Converts a typed rule into a parameterized SQL template whose single
/// remaining open placeholder is `$column`.
///
/// Argument substitution is split in two passes on purpose: the rule-level
/// pass here (independent of any table) resolves `rule_binding_arguments`,
/// and the column-level pass (`SqlTemplate::bind_column`) runs once the
/// rule is attached to a binding. One rule definition thereby serves many
/// bindings against different columns, and injected SQL arriving through
/// argument values is caught before the column stage.
pub fn compile(rule: &Rule) -> Result<SqlTemplate, DomainError> {
    match rule.rule_type {
        RuleType::NotNull => Ok(SqlTemplate::new("$column IS NOT NULL")),
        RuleType::NotBlank => Ok(SqlTemplate::new("TRIM($column) != ''")),
        RuleType::Regex => compile_regex(rule),
        RuleType::CustomSqlExpr => compile_custom_sql(rule, "custom_sql_expr", false),
        RuleType::CustomSqlStatement => compile_custom_sql(rule, "custom_sql_statement", true),
    }
}

fn compile_regex(rule: &Rule) -> Result<SqlTemplate, DomainError> {
    let pattern = rule
        .string_param("pattern")
        .ok_or_else(|| DomainError::MissingRuleParam {
            rule_id: rule.id.clone(),
            param: "pattern".to_string(),
        })?;

    Regex::new(pattern).map_err(|e| DomainError::InvalidPattern {
        rule_id: rule.id.clone(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    reject_forbidden_tokens(&rule.id, pattern)?;

    // Literal '$' in the pattern must not be misread by the column pass.
    let escaped = escape_dollars(pattern);
    Ok(SqlTemplate::new(format!(
        "REGEXP_CONTAINS(CAST($column AS STRING), '{escaped}')"
    )))
}

fn compile_custom_sql(
    rule: &Rule,
    param: &'static str,
    is_statement: bool,
) -> Result<SqlTemplate, DomainError> {
    let sql = rule
        .string_param(param)
        .ok_or_else(|| DomainError::MissingRuleParam {
            rule_id: rule.id.clone(),
            param: param.to_string(),
        })?;

    if is_statement && !sql.to_lowercase().contains("from data") {
        return Err(DomainError::StatementMissingDataAlias {
            rule_id: rule.id.clone(),
        });
    }

    let binding_arguments = rule.rule_binding_arguments.clone().unwrap_or_default();
    let mut vars: BTreeMap<String, String> = BTreeMap::new();
    for name in rule.custom_sql_arguments() {
        if !references_placeholder(sql, &name) {
            return Err(DomainError::UnusedRuleArgument {
                rule_id: rule.id.clone(),
                argument: name,
            });
        }
        let value = binding_arguments
            .get(&name)
            .ok_or_else(|| DomainError::MissingRuleArgument {
                rule_id: rule.id.clone(),
                argument: name.clone(),
            })?;
        // Literal '$' in a value must stay literal through the column pass.
        vars.insert(name, escape_dollars(&yaml_scalar_to_string(value)));
    }

    // Rule-level pass keeps '$$' escapes intact for the column pass; the
    // post-substitution injection check catches forbidden tokens smuggled
    // through argument values.
    let substituted = substitute_partial(sql, &vars);
    reject_forbidden_tokens(&rule.id, &substituted)?;

    Ok(SqlTemplate::new(substituted))
}

fn yaml_scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}
