use std::sync::Arc;

use coinq_domain::result::PlanResult;
use coinq_domain::{Error, Result};
use coinq_llm::{ChatMessage, ChatRequest, LlmClient};

const SYSTEM_PROMPT: &str = "You are a cryptocurrency market analyst. Using only the supplied \
    price summary and news summary, answer the user's question. Never guess or speculate beyond \
    the given data. Structure the answer as: (1) a direct two-to-three sentence answer, (2) a \
    price analysis paragraph if price data is available, (3) a news/issues paragraph if news is \
    available, (4) a short conclusion. Be concise.";

/// Turns a `PlanResult` into the final answer text.
pub struct Scripter {
    llm: Arc<dyn LlmClient>,
}

impl Scripter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, result: &PlanResult) -> Result<String> {
        let coins = if result.coin_names.is_empty() {
            "none".to_string()
        } else {
            result.coin_names.join(", ")
        };

        let user = format!(
            "Original question:\n{}\n\nAnalysis type: {:?}\n\nCoins: {}\n\nPrice analysis:\n{}\n\nNews analysis:\n{}\n\n\
            Using only the information above, answer the original question.",
            result.original_query,
            result.intent_type,
            coins,
            result.price_summary.as_deref().unwrap_or("No price data available."),
            result.news_summary.as_deref().unwrap_or("No relevant news found."),
        );

        let resp = self
            .llm
            .chat(ChatRequest {
                messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
                temperature: Some(0.3),
                max_tokens: Some(1024),
                json_mode: false,
                model: None,
            })
            .await
            .map_err(|e| Error::UpstreamFailure {
                provider: "scripter-llm".to_string(),
                message: e.to_string(),
            })?;

        Ok(resp.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinq_domain::query::IntentType;
    use coinq_domain::result::ExecutionError;
    use coinq_llm::mock::MockLlmClient;

    fn result_with(price: Option<&str>, news: Option<&str>) -> PlanResult {
        PlanResult {
            original_query: "why did BTC drop?".to_string(),
            intent_type: IntentType::PriceReason,
            coin_names: vec!["BTC".to_string()],
            price_summary: price.map(|s| s.to_string()),
            news_summary: news.map(|s| s.to_string()),
            total_actions: 2,
            successful_actions: 2,
            failed_actions: 0,
            errors: Vec::<ExecutionError>::new(),
        }
    }

    #[tokio::test]
    async fn missing_summaries_still_produce_an_answer() {
        let llm = Arc::new(MockLlmClient::fixed("a concise answer"));
        let scripter = Scripter::new(llm.clone());
        let answer = scripter.generate(&result_with(None, None)).await.unwrap();
        assert_eq!(answer, "a concise answer");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_carries_both_summaries_when_present() {
        let captured = Arc::new(std::sync::Mutex::new(String::new()));
        let captured_clone = Arc::clone(&captured);
        let llm = Arc::new(MockLlmClient::new(move |req| {
            let user = req.messages.last().unwrap().content.clone();
            *captured_clone.lock().unwrap() = user.clone();
            "answer".to_string()
        }));
        let scripter = Scripter::new(llm);
        scripter
            .generate(&result_with(Some("price went down"), Some("regulatory crackdown")))
            .await
            .unwrap();
        let prompt = captured.lock().unwrap().clone();
        assert!(prompt.contains("price went down"));
        assert!(prompt.contains("regulatory crackdown"));
    }
}
