pub mod binding;
pub mod entity;
pub mod filter;
pub mod rule;

// Re-exports pratiques
pub use binding::{RuleBinding, RuleRef};
pub use entity::{Column, ColumnDocument, ColumnMap, Entity, EntityDocument};
pub use filter::{ReferenceColumns, RowFilter};
pub use rule::{Rule, RuleType};
