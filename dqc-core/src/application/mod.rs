pub mod cache;
pub mod resolver;

pub use cache::ConfigCache;
pub use resolver::{Resolver, RuleBindingViewModel};
