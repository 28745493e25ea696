use std::sync::Arc;

use coinq_domain::plan::ToolCall;
use coinq_domain::{Error, Result};
use coinq_llm::LlmClient;

use crate::price;
use crate::semantic;
use crate::stores::{PriceStore, VectorStore};
use crate::summarize;
use crate::types::{NewsPassage, PricePoint};

pub const GET_COIN_PRICE: &str = "get_coin_price";
pub const MAKE_SEMANTIC_QUERY: &str = "make_semantic_query";
pub const SEMANTIC_SEARCH: &str = "semantic_search";
pub const SUMMARIZE_PRICE_DATA: &str = "summarize_price_data";
pub const SUMMARIZE_NEWS_CHUNKS: &str = "summarize_news_chunks";

/// A tool's typed output. The Executor routes on the variant to bucket
/// results; tool bodies never see each other's buckets.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Prices(Vec<PricePoint>),
    QueryString(String),
    Passages(Vec<NewsPassage>),
    Summary(String),
}

/// The registry through which the Executor dispatches every tool call.
/// Handlers hold no mutable state of their own; the registry's only
/// state is its read-only collaborators.
pub struct ToolRegistry {
    price_store: Arc<dyn PriceStore>,
    vector_store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
}

impl ToolRegistry {
    pub fn new(price_store: Arc<dyn PriceStore>, vector_store: Arc<dyn VectorStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            price_store,
            vector_store,
            llm,
        }
    }

    /// Dispatch `call` by name against its meta-stripped arguments.
    /// Failures are reported as a typed error carrying `tool_name` and
    /// `cause`, never a panic.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput> {
        let body = call.body_arguments();
        match call.tool_name.as_str() {
            GET_COIN_PRICE => {
                let prices = price::get_coin_price(self.price_store.as_ref(), body).await?;
                Ok(ToolOutput::Prices(prices))
            }
            MAKE_SEMANTIC_QUERY => {
                let query = semantic::make_semantic_query(self.llm.as_ref(), body).await?;
                Ok(ToolOutput::QueryString(query))
            }
            SEMANTIC_SEARCH => {
                let passages = semantic::semantic_search(self.llm.as_ref(), self.vector_store.as_ref(), body).await?;
                Ok(ToolOutput::Passages(passages))
            }
            SUMMARIZE_PRICE_DATA => {
                let summary = summarize::summarize_price_data(self.llm.as_ref(), body).await?;
                Ok(ToolOutput::Summary(summary))
            }
            SUMMARIZE_NEWS_CHUNKS => {
                let summary = summarize::summarize_news_chunks(self.llm.as_ref(), body).await?;
                Ok(ToolOutput::Summary(summary))
            }
            other => Err(Error::ToolFailure {
                tool_name: other.to_string(),
                cause: "unknown tool".to_string(),
            }),
        }
    }

    /// Convenience for auto-chaining: dispatch a `semantic_search` from
    /// the meta parameters carried on the `make_semantic_query` call
    /// that produced `query`, without allocating a new `ToolCall`.
    pub async fn semantic_search_with(&self, query: String, search_params: serde_json::Value) -> Result<Vec<NewsPassage>> {
        let mut args = search_params;
        if let serde_json::Value::Object(map) = &mut args {
            map.insert("query".to_string(), serde_json::Value::String(query));
        }
        semantic::semantic_search(self.llm.as_ref(), self.vector_store.as_ref(), args).await
    }
}
