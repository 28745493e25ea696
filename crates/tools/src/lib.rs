pub mod price;
pub mod registry;
pub mod semantic;
pub mod stores;
pub mod summarize;
pub mod types;

pub use registry::{ToolOutput, ToolRegistry};
