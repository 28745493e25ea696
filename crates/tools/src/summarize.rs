use coinq_domain::{Error, Result};
use coinq_llm::{ChatMessage, ChatRequest, LlmClient};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{NewsPassage, PricePoint};

#[derive(Debug, Deserialize)]
struct SummarizePriceDataArgs {
    coin_name: String,
    price_data: Vec<PricePoint>,
    #[serde(default)]
    focus: Option<String>,
}

/// `summarize_price_data(coin_name, price_data[], focus?) -> string`.
pub async fn summarize_price_data(llm: &dyn LlmClient, args: Value) -> Result<String> {
    let args: SummarizePriceDataArgs = serde_json::from_value(args).map_err(|e| Error::ToolFailure {
        tool_name: "summarize_price_data".to_string(),
        cause: e.to_string(),
    })?;

    if args.price_data.is_empty() {
        return Ok(format!("No price data available for {}.", args.coin_name));
    }

    let series: String = args
        .price_data
        .iter()
        .map(|p| format!("{}: close {:.2}", p.epoch, p.close))
        .collect::<Vec<_>>()
        .join("; ");

    let system = "Summarize the given price series in two to four sentences, \
        noting the overall direction and any notable moves.";
    let user = format!(
        "coin: {}\nfocus: {}\nseries: {}",
        args.coin_name,
        args.focus.as_deref().unwrap_or("none"),
        series,
    );

    let resp = llm
        .chat(ChatRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.2),
            max_tokens: Some(256),
            json_mode: false,
            model: None,
        })
        .await
        .map_err(|e| Error::ToolFailure {
            tool_name: "summarize_price_data".to_string(),
            cause: e.to_string(),
        })?;

    Ok(resp.content.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct SummarizeNewsChunksArgs {
    news_chunks: Vec<NewsPassage>,
    #[serde(default)]
    focus: Option<String>,
}

/// `summarize_news_chunks(news_chunks[], focus?) -> string`.
pub async fn summarize_news_chunks(llm: &dyn LlmClient, args: Value) -> Result<String> {
    let args: SummarizeNewsChunksArgs = serde_json::from_value(args).map_err(|e| Error::ToolFailure {
        tool_name: "summarize_news_chunks".to_string(),
        cause: e.to_string(),
    })?;

    if args.news_chunks.is_empty() {
        return Ok("No relevant news found.".to_string());
    }

    let chunks: String = args
        .news_chunks
        .iter()
        .map(|c| format!("[{}] {}: {}", c.source, c.title, c.text))
        .collect::<Vec<_>>()
        .join("\n");

    let system = "Summarize the given news passages in three to five sentences, \
        covering the most important and recurring themes.";
    let user = format!("focus: {}\npassages:\n{}", args.focus.as_deref().unwrap_or("none"), chunks);

    let resp = llm
        .chat(ChatRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.2),
            max_tokens: Some(384),
            json_mode: false,
            model: None,
        })
        .await
        .map_err(|e| Error::ToolFailure {
            tool_name: "summarize_news_chunks".to_string(),
            cause: e.to_string(),
        })?;

    Ok(resp.content.trim().to_string())
}
