pub mod document;
pub mod loader;

pub use document::{ConfigDocument, RawConfig};
pub use loader::load_configs;
