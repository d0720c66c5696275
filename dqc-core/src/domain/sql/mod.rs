pub mod compiler;
pub mod guard;
pub mod template;

pub use compiler::compile;
pub use template::SqlTemplate;
