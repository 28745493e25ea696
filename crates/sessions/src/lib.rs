pub mod cache;

pub use cache::{ContextPatch, SessionCache};
