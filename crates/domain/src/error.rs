/// Shared error type used across all coinq crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("query too long: {len} chars (max {max})")]
    QueryTooLong { len: usize, max: usize },

    #[error("unknown intent")]
    UnknownIntent,

    #[error("tool {tool_name}: {cause}")]
    ToolFailure { tool_name: String, cause: String },

    #[error("upstream {provider}: {message}")]
    UpstreamFailure { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("internal: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
