pub mod anthropic;
pub mod mock;
pub mod traits;

pub use traits::{ChatMessage, ChatRequest, ChatResponse, ChatRole, EmbeddingRequest, EmbeddingResponse, LlmClient};
