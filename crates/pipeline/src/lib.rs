pub mod analyzer;
pub mod executor;
pub mod pipeline;
pub mod planner;
pub mod router;
pub mod scripter;

pub use analyzer::Analyzer;
pub use executor::{Executor, ExecutorConfig};
pub use pipeline::Pipeline;
pub use planner::Planner;
pub use router::{AskOutcome, EntryRouter, Path};
pub use scripter::Scripter;
