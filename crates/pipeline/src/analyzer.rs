use std::sync::Arc;

use coinq_domain::clock::Clock;
use coinq_domain::query::NormalizedQuery;
use coinq_domain::{Error, Result};
use coinq_llm::{ChatMessage, ChatRequest, LlmClient};

const SYSTEM_PROMPT_TEMPLATE: &str = "You classify a cryptocurrency-related question into a \
    structured query. Today's date is {date} ({year}); last year was {last_year}. Resolve \
    relative dates (\"yesterday\", \"last week\") against today's date. If the question is \
    ambiguous, unrelated to crypto, or chit-chat, set intent_type to \"unknown\" rather than \
    guessing. Respond with a single JSON object matching the NormalizedQuery schema and nothing \
    else.";

/// Converts an utterance into a `NormalizedQuery`. Stateless; the
/// length check happens before any model call.
pub struct Analyzer {
    llm: Arc<dyn LlmClient>,
    clock: Arc<dyn Clock>,
    max_query_chars: usize,
}

impl Analyzer {
    pub fn new(llm: Arc<dyn LlmClient>, clock: Arc<dyn Clock>, max_query_chars: usize) -> Self {
        Self {
            llm,
            clock,
            max_query_chars,
        }
    }

    pub async fn analyze(&self, utterance: &str) -> Result<NormalizedQuery> {
        let len = utterance.chars().count();
        if len > self.max_query_chars {
            return Err(Error::QueryTooLong {
                len,
                max: self.max_query_chars,
            });
        }

        let now = self.clock.now();
        let system = SYSTEM_PROMPT_TEMPLATE
            .replace("{date}", &now.format("%Y-%m-%d").to_string())
            .replace("{year}", &now.format("%Y").to_string())
            .replace("{last_year}", &(now.format("%Y").to_string().parse::<i32>().unwrap_or(0) - 1).to_string());

        let resp = self
            .llm
            .chat(ChatRequest {
                messages: vec![ChatMessage::system(system), ChatMessage::user(utterance.to_string())],
                temperature: Some(0.0),
                max_tokens: Some(512),
                json_mode: true,
                model: None,
            })
            .await
            .map_err(|e| Error::UpstreamFailure {
                provider: "analyzer-llm".to_string(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&resp.content)
            .map_err(|e| Error::Internal(format!("analyzer response did not parse as NormalizedQuery: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinq_domain::clock::FixedClock;
    use coinq_llm::mock::MockLlmClient;
    use chrono::{TimeZone, Utc};

    fn query_json(intent: &str) -> String {
        format!(
            r#"{{"intent_type":"{intent}","target":{{"coin":["BTC"],"entity":null}},
            "event":{{"magnitude":"any","keywords":[]}},
            "goal":{{"task":"summarize","depth":"medium"}},
            "time_range":{{"pivot_time":"today","relative":"1m"}},
            "filters":{{"sentiment":"any","category":"unknown"}}}}"#,
            intent = intent
        )
    }

    #[tokio::test]
    async fn rejects_overlong_utterance_before_calling_the_model() {
        let llm = Arc::new(MockLlmClient::new(|_| panic!("must not call the model")));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let analyzer = Analyzer::new(llm, clock, 5);
        let result = analyzer.analyze("123456").await;
        assert!(matches!(result, Err(Error::QueryTooLong { len: 6, max: 5 })));
    }

    #[tokio::test]
    async fn two_hundred_chars_accepted_two_hundred_one_rejected() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let ok_llm = Arc::new(MockLlmClient::fixed(query_json("unknown")));
        let ok_analyzer = Analyzer::new(ok_llm, clock.clone(), 200);
        assert!(ok_analyzer.analyze(&"a".repeat(200)).await.is_ok());

        let reject_llm = Arc::new(MockLlmClient::new(|_| panic!("must not call the model")));
        let reject_analyzer = Analyzer::new(reject_llm, clock, 200);
        let result = reject_analyzer.analyze(&"a".repeat(201)).await;
        assert!(matches!(result, Err(Error::QueryTooLong { len: 201, max: 200 })));
    }

    #[tokio::test]
    async fn parses_model_output_into_normalized_query() {
        let reply = query_json("market_trend");
        let llm = Arc::new(MockLlmClient::fixed(reply));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let analyzer = Analyzer::new(llm, clock, 200);
        let query = analyzer.analyze("how's the market?").await.unwrap();
        assert!(!query.is_unknown());
    }
}
