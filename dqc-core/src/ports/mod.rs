// dqc-core/src/ports/mod.rs

// Contracts for the external collaborators. The core resolves
// single-threaded and synchronous; retries and backoff belong to the
// implementations behind these traits, not here.

pub mod registry;

pub use registry::{ColumnSchema, MetadataRegistry, RemoteEntity, WarehouseSchema};
