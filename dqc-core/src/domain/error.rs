// dqc-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    // --- VALIDATION ---
    #[error("Entity '{entity_id}': missing required field '{field}'")]
    #[diagnostic(
        code(dqc::domain::missing_field),
        help("Declare '{field}' on the entity, or use the documented legacy alias.")
    )]
    MissingLocatorField { entity_id: String, field: String },

    #[error(
        "Entity '{entity_id}': environment_override key '{key}' does not match \
         its 'environment' label '{label}'"
    )]
    #[diagnostic(code(dqc::domain::environment_mismatch))]
    EnvironmentMismatch {
        entity_id: String,
        key: String,
        label: String,
    },

    #[error(
        "Entity '{entity_id}', column '{column_id}': declared type '{declared}' \
         has no canonical mapping for source system '{source_system}'"
    )]
    #[diagnostic(code(dqc::domain::unmapped_type))]
    UnmappedColumnType {
        entity_id: String,
        column_id: String,
        declared: String,
        source_system: String,
    },

    #[error("Rule binding '{binding_id}': rule reference '{rule_id}' must carry at most one argument map entry")]
    #[diagnostic(
        code(dqc::domain::malformed_rule_reference),
        help("Write either a bare rule id or a single-entry mapping 'RULE_ID: {{arg: value}}'.")
    )]
    MalformedRuleReference {
        binding_id: String,
        rule_id: String,
    },

    #[error("Rule binding '{binding_id}' resolved to an empty rule list")]
    #[diagnostic(
        code(dqc::domain::empty_rule_list),
        help("A rule binding with no checks is meaningless; declare at least one rule id.")
    )]
    EmptyRuleList { binding_id: String },

    #[error("Rule binding '{binding_id}' must declare exactly one of 'entity_id' or 'entity_uri'")]
    #[diagnostic(code(dqc::domain::entity_target))]
    AmbiguousEntityTarget { binding_id: String },

    #[error("Rule '{rule_id}': dimension '{dimension}' is not a declared rule dimension")]
    #[diagnostic(code(dqc::domain::unknown_dimension))]
    UnknownDimension { rule_id: String, dimension: String },

    #[error(
        "Rule binding '{binding_id}': incremental time-filter column '{column_id}' \
         has canonical type {canonical}; expected TIMESTAMP or DATETIME"
    )]
    #[diagnostic(code(dqc::domain::non_temporal_filter))]
    NonTemporalIncrementalColumn {
        binding_id: String,
        column_id: String,
        canonical: String,
    },

    // --- ENTITY URI ---
    #[error("Invalid entity URI '{uri}': {reason}")]
    #[diagnostic(code(dqc::domain::invalid_uri))]
    InvalidUri { uri: String, reason: String },

    // --- SQL COMPILATION ---
    #[error("Rule '{rule_id}': missing or empty required parameter '{param}'")]
    #[diagnostic(code(dqc::domain::missing_rule_param))]
    MissingRuleParam { rule_id: String, param: String },

    #[error("Rule '{rule_id}': invalid regex pattern '{pattern}': {reason}")]
    #[diagnostic(code(dqc::domain::invalid_pattern))]
    InvalidPattern {
        rule_id: String,
        pattern: String,
        reason: String,
    },

    #[error("Rule '{rule_id}': argument '{argument}' is declared in custom_sql_arguments but never appears as '${argument}' in the SQL")]
    #[diagnostic(code(dqc::domain::unused_argument))]
    UnusedRuleArgument { rule_id: String, argument: String },

    #[error("Rule '{rule_id}': no value supplied for argument '{argument}' in rule_binding_arguments")]
    #[diagnostic(code(dqc::domain::missing_argument_value))]
    MissingRuleArgument { rule_id: String, argument: String },

    #[error("Rule '{rule_id}': forbidden token '{token}' detected in SQL parameter")]
    #[diagnostic(
        code(dqc::domain::injection_rejected),
        help("Statement separators and comment markers (';', '#', '--', '/*', '*/') are never allowed in rule parameters or argument values.")
    )]
    InjectionRejected { rule_id: String, token: String },

    #[error("Rule '{rule_id}': custom_sql_statement must select from the pre-filtered row set alias 'data'")]
    #[diagnostic(
        code(dqc::domain::statement_alias),
        help("The statement composes with a generated scaffold, e.g.:\n  select a\n  from data\n  where a is not null")
    )]
    StatementMissingDataAlias { rule_id: String },

    // --- UNSUPPORTED FEATURES ---
    #[error("Not implemented: {0}")]
    #[diagnostic(code(dqc::domain::not_implemented))]
    NotImplemented(String),

    // --- REFERENCE RESOLUTION ---
    #[error("{kind} '{id}' not found{context}")]
    #[diagnostic(code(dqc::domain::not_found))]
    NotFound {
        kind: &'static str,
        id: String,
        context: String,
    },
}

impl DomainError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound {
            kind,
            id: id.into(),
            context: String::new(),
        }
    }

    pub fn not_found_in(kind: &'static str, id: impl Into<String>, context: impl Into<String>) -> Self {
        DomainError::NotFound {
            kind,
            id: id.into(),
            context: format!(" ({})", context.into()),
        }
    }
}
