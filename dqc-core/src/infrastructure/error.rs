// dqc-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(dqc::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(dqc::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    Yaml(#[from] serde_yaml::Error),

    #[error("No configuration documents found under '{0}'")]
    #[diagnostic(code(dqc::infra::config_missing))]
    ConfigNotFound(String),

    // --- MERGE CONFLICTS ---
    #[error("Conflicting duplicate {category} id(s) across config files: {ids}")]
    #[diagnostic(
        code(dqc::infra::config_conflict),
        help("The same id may appear in several files only when the definitions are identical.")
    )]
    ConfigConflict { category: &'static str, ids: String },

    #[error("Failed to parse {category} '{id}': {reason}")]
    #[diagnostic(code(dqc::infra::config_shape))]
    ConfigShape {
        category: &'static str,
        id: String,
        reason: String,
    },
}
