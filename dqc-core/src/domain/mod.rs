pub mod error;
pub mod model;
pub mod sql;
pub mod types;
pub mod uri;

pub use error::DomainError;
