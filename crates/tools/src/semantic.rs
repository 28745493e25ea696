use coinq_domain::{Error, Result};
use coinq_llm::{ChatMessage, ChatRequest, EmbeddingRequest, LlmClient};
use serde::Deserialize;
use serde_json::Value;

use crate::stores::VectorStore;
use crate::types::{DateRange, NewsPassage};

#[derive(Debug, Deserialize)]
struct MakeSemanticQueryArgs {
    coin_names: Vec<String>,
    intent_type: String,
    event_keywords: Vec<String>,
    #[serde(default)]
    event_magnitude: Option<String>,
    custom_context: String,
}

/// `make_semantic_query(...)` — condenses the plan's perspective
/// parameters into a short keyword query (3-8 tokens, no sentence
/// form) via a single LLM call.
pub async fn make_semantic_query(llm: &dyn LlmClient, args: Value) -> Result<String> {
    let args: MakeSemanticQueryArgs = serde_json::from_value(args).map_err(|e| Error::ToolFailure {
        tool_name: "make_semantic_query".to_string(),
        cause: e.to_string(),
    })?;

    let system = "Condense the given parameters into a short search query of 3 to 8 \
        keywords. Respond with the keywords only, space separated, no sentence \
        form and no punctuation.";
    let user = format!(
        "coins: {}\nintent: {}\nevent keywords: {}\nmagnitude: {}\nperspective: {}",
        args.coin_names.join(", "),
        args.intent_type,
        args.event_keywords.join(", "),
        args.event_magnitude.as_deref().unwrap_or("none"),
        args.custom_context,
    );

    let resp = llm
        .chat(ChatRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.0),
            max_tokens: Some(64),
            json_mode: false,
            model: None,
        })
        .await
        .map_err(|e| Error::ToolFailure {
            tool_name: "make_semantic_query".to_string(),
            cause: e.to_string(),
        })?;

    Ok(resp.content.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct SemanticSearchArgs {
    query: String,
    top_k: usize,
    similarity_threshold: f64,
    #[serde(default)]
    pivot_date: Option<i64>,
    #[serde(default)]
    date_range: Option<DateRange>,
    #[serde(default)]
    source: Option<String>,
}

/// `semantic_search(...)` — embeds the query, nearest-neighbour
/// searches the vector store, filters by date window and source,
/// drops hits below `similarity_threshold`, returns up to `top_k`
/// sorted by similarity descending.
pub async fn semantic_search(
    llm: &dyn LlmClient,
    store: &dyn VectorStore,
    args: Value,
) -> Result<Vec<NewsPassage>> {
    let args: SemanticSearchArgs = serde_json::from_value(args).map_err(|e| Error::ToolFailure {
        tool_name: "semantic_search".to_string(),
        cause: e.to_string(),
    })?;

    let embedded = llm
        .embed(EmbeddingRequest {
            input: vec![args.query.clone()],
            model: None,
        })
        .await
        .map_err(|e| Error::ToolFailure {
            tool_name: "semantic_search".to_string(),
            cause: e.to_string(),
        })?;

    let embedding = embedded.embeddings.into_iter().next().unwrap_or_default();

    let date_window = match (args.pivot_date, args.date_range) {
        (Some(pivot), Some(range)) => {
            let offset = range.offset_seconds();
            Some((pivot - offset, pivot + offset))
        }
        _ => None,
    };

    let mut passages = store
        .nearest(&embedding, args.top_k, date_window, args.source.as_deref())
        .await
        .map_err(|e| Error::ToolFailure {
            tool_name: "semantic_search".to_string(),
            cause: e.to_string(),
        })?;

    passages.retain(|p| p.similarity >= args.similarity_threshold);
    passages.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    passages.truncate(args.top_k);

    Ok(passages)
}
