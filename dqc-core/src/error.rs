// dqc-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DqcError {
    // --- DOMAIN (validation, URI grammar, SQL compilation, resolution) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, YAML, merge conflicts) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATIVE ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementation to avoid a duplicate enum variant but keep ergonomics
impl From<std::io::Error> for DqcError {
    fn from(err: std::io::Error) -> Self {
        DqcError::Infrastructure(InfrastructureError::Io(err))
    }
}
