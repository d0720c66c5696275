// dqc-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts for the external collaborators (metadata registry, warehouse schema).
pub mod ports;

// 2. Domain
// Config models, canonical type mapping, entity URI grammar, rule SQL compiler.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure
// YAML document decoding and the multi-file loader/merger.
pub mod infrastructure;

// 4. Application (Use Cases)
// Configuration cache and the rule binding resolver.
pub mod application;

// --- ERRORS ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::cache::ConfigCache;
pub use application::resolver::{Resolver, RuleBindingViewModel};
pub use domain::uri::EntityUri;
pub use error::DqcError;
