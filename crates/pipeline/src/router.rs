use std::sync::Arc;

use chrono::Utc;
use coinq_domain::clock::Clock;
use coinq_domain::query::NormalizedQuery;
use coinq_domain::result::PlanResult;
use coinq_domain::session::MessageRole;
use coinq_domain::trace::TraceEvent;
use coinq_domain::Error;
use coinq_llm::{ChatMessage, ChatRequest, LlmClient};
use coinq_sessions::{ContextPatch, SessionCache};

use crate::analyzer::Analyzer;
use crate::executor::Executor;
use crate::planner::Planner;
use crate::scripter::Scripter;

const DECISION_SYSTEM_PROMPT: &str = "You route a user's cryptocurrency question to one of four \
    execution paths. Respond with a line `PATH: <name>` where <name> is one of DIRECT, \
    REUSE_RESULT, REUSE_ANALYSIS, FULL_PIPELINE. Use DIRECT for chit-chat, greetings, or anything \
    unrelated to crypto prices or news. Use REUSE_RESULT only when the new message is a rephrase \
    of, or a presentation-only follow-up to, the previous result (same coins, same intent). Use \
    REUSE_ANALYSIS when the prior analysis is still valid but fresh data is wanted. Otherwise use \
    FULL_PIPELINE.";

/// The four execution paths a turn can take, plus the `ERROR_<path>`
/// family surfaced on stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Direct,
    ReuseResult,
    ReuseAnalysis,
    FullPipeline,
}

impl Path {
    fn as_str(self) -> &'static str {
        match self {
            Path::Direct => "DIRECT",
            Path::ReuseResult => "REUSE_RESULT",
            Path::ReuseAnalysis => "REUSE_ANALYSIS",
            Path::FullPipeline => "FULL_PIPELINE",
        }
    }

    fn parse(line: &str) -> Path {
        match line.trim().to_uppercase().as_str() {
            "DIRECT" => Path::Direct,
            "REUSE_RESULT" => Path::ReuseResult,
            "REUSE_ANALYSIS" => Path::ReuseAnalysis,
            _ => Path::FullPipeline,
        }
    }
}

pub struct AskOutcome {
    pub answer: String,
    pub path: String,
    pub errors: Vec<String>,
}

/// Chooses and runs the path for a turn, reading and writing the
/// session's context as a side effect.
pub struct EntryRouter {
    llm: Arc<dyn LlmClient>,
    analyzer: Analyzer,
    planner: Planner,
    executor: Executor,
    scripter: Scripter,
    sessions: Arc<SessionCache>,
    clock: Arc<dyn Clock>,
}

impl EntryRouter {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        analyzer: Analyzer,
        planner: Planner,
        executor: Executor,
        scripter: Scripter,
        sessions: Arc<SessionCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            llm,
            analyzer,
            planner,
            executor,
            scripter,
            sessions,
            clock,
        }
    }

    pub async fn ask(&self, session_id: &str, utterance: &str) -> AskOutcome {
        let now = self.clock.now();
        let context = self.sessions.load(session_id, now);

        let has_reusable = context.last_normalized_query.is_some() && context.last_plan_result.is_some();
        let previous_summary = context
            .last_plan_result
            .as_ref()
            .map(|r| {
                let price: String = r.price_summary.as_deref().unwrap_or("").chars().take(200).collect();
                let news: String = r.news_summary.as_deref().unwrap_or("").chars().take(200).collect();
                format!("price: {price}... / news: {news}...")
            })
            .unwrap_or_else(|| "none".to_string());

        let decision_prompt = format!(
            "User message: {utterance}\nHas reusable context: {has_reusable}\nPrevious coins: {:?}\n\
            Previous intent: {:?}\nHas previous result: {}\nPrevious result summary: {previous_summary}",
            context.coins,
            context.last_normalized_query.as_ref().map(|q| q.intent_type),
            context.last_plan_result.is_some(),
        );

        let path = match self
            .llm
            .chat(ChatRequest {
                messages: vec![ChatMessage::system(DECISION_SYSTEM_PROMPT), ChatMessage::user(decision_prompt)],
                temperature: Some(0.0),
                max_tokens: Some(64),
                json_mode: false,
                model: None,
            })
            .await
        {
            Ok(resp) => {
                let parsed = resp
                    .content
                    .lines()
                    .find(|l| l.to_uppercase().contains("PATH:"))
                    .and_then(|l| l.to_uppercase().split("PATH:").nth(1).map(|s| s.trim().to_string()));
                match parsed {
                    Some(token) => Path::parse(&token),
                    None => Path::FullPipeline,
                }
            }
            Err(_) => Path::FullPipeline,
        };
        TraceEvent::RouterDecision {
            session_key: session_id.to_string(),
            chosen_path: path.as_str().to_string(),
            fallback_applied: false,
        }
        .emit();

        let outcome = match path {
            Path::Direct => self.run_direct(utterance).await,
            Path::ReuseResult if context.last_plan_result.is_some() => {
                self.run_reuse_result(context.last_plan_result.as_ref().unwrap(), utterance).await
            }
            Path::ReuseAnalysis if context.last_normalized_query.is_some() => {
                self.run_reuse_analysis(context.last_normalized_query.as_ref().unwrap(), utterance, session_id, now)
                    .await
            }
            _ => self.run_full_pipeline(utterance, session_id, now).await,
        };

        match outcome {
            Ok((answer, ran_path, errors)) => {
                self.sessions.append_message(session_id, MessageRole::User, utterance.to_string(), now);
                self.sessions.append_message(session_id, MessageRole::Assistant, answer.clone(), now);
                AskOutcome {
                    answer,
                    path: ran_path.as_str().to_string(),
                    errors,
                }
            }
            Err((failed_path, message)) => AskOutcome {
                answer: message,
                path: format!("ERROR_{}", failed_path.as_str()),
                errors: vec![],
            },
        }
    }

    async fn run_direct(&self, utterance: &str) -> Result<(String, Path, Vec<String>), (Path, String)> {
        let resp = self
            .llm
            .chat(ChatRequest {
                messages: vec![ChatMessage::user(format!("Reply briefly to: {utterance}"))],
                temperature: Some(0.3),
                max_tokens: Some(256),
                json_mode: false,
                model: None,
            })
            .await
            .map_err(|e| (Path::Direct, e.to_string()))?;
        Ok((resp.content.trim().to_string(), Path::Direct, vec![]))
    }

    async fn run_reuse_result(&self, cached: &PlanResult, utterance: &str) -> Result<(String, Path, Vec<String>), (Path, String)> {
        let mut result = cached.clone();
        result.original_query = utterance.to_string();
        let answer = self
            .scripter
            .generate(&result)
            .await
            .map_err(|e| (Path::ReuseResult, e.to_string()))?;
        Ok((answer, Path::ReuseResult, vec![]))
    }

    async fn run_reuse_analysis(
        &self,
        query: &NormalizedQuery,
        utterance: &str,
        session_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<(String, Path, Vec<String>), (Path, String)> {
        let plan = self.planner.make_plan(query).map_err(|e| (Path::ReuseAnalysis, e.to_string()))?;
        let result = self.executor.execute(&plan, utterance).await;
        let errors = result.errors.iter().map(|e| format!("{}: {}", e.tool_name, e.cause)).collect();
        let answer = self
            .scripter
            .generate(&result)
            .await
            .map_err(|e| (Path::ReuseAnalysis, e.to_string()))?;

        self.sessions.update_context(
            session_id,
            ContextPatch {
                last_plan_result: Some(Some(result)),
                ..Default::default()
            },
            now,
        );
        Ok((answer, Path::ReuseAnalysis, errors))
    }

    async fn run_full_pipeline(
        &self,
        utterance: &str,
        session_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<(String, Path, Vec<String>), (Path, String)> {
        let query = self.analyzer.analyze(utterance).await.map_err(|e| (Path::FullPipeline, e.to_string()))?;

        if matches!(query.intent_type, coinq_domain::query::IntentType::Unknown) {
            return self.run_direct(utterance).await.map(|(answer, _, errors)| (answer, Path::Direct, errors));
        }

        let plan = self.planner.make_plan(&query);
        let plan = match plan {
            Ok(p) => p,
            Err(Error::UnknownIntent) => {
                return self.run_direct(utterance).await.map(|(answer, _, errors)| (answer, Path::Direct, errors));
            }
            Err(e) => return Err((Path::FullPipeline, e.to_string())),
        };

        let result = self.executor.execute(&plan, utterance).await;
        let errors = result.errors.iter().map(|e| format!("{}: {}", e.tool_name, e.cause)).collect();
        let answer = self
            .scripter
            .generate(&result)
            .await
            .map_err(|e| (Path::FullPipeline, e.to_string()))?;

        self.sessions.update_context(
            session_id,
            ContextPatch {
                last_normalized_query: Some(Some(query)),
                last_plan_result: Some(Some(result.clone())),
                coins: Some(result.coin_names.clone()),
            },
            now,
        );
        Ok((answer, Path::FullPipeline, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinq_domain::clock::FixedClock;
    use coinq_domain::config::{PipelineConfig, PlannerConfig};
    use coinq_llm::mock::MockLlmClient;
    use coinq_tools::registry::ToolRegistry;
    use coinq_tools::stores::{InMemoryPriceStore, InMemoryVectorStore};
    use crate::executor::ExecutorConfig;
    use std::time::Duration;

    fn router_with(llm: Arc<MockLlmClient>) -> EntryRouter {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap()));
        let price_store = Arc::new(InMemoryPriceStore::empty());
        let vector_store = Arc::new(InMemoryVectorStore::empty());
        let registry = Arc::new(ToolRegistry::new(price_store, vector_store, llm.clone()));
        let analyzer = Analyzer::new(llm.clone(), clock.clone(), PipelineConfig::default().max_query_chars);
        let planner = Planner::new(PlannerConfig::default(), clock.clone());
        let executor = Executor::new(
            registry,
            ExecutorConfig {
                fan_out_ceiling: 8,
                per_call_timeout: Duration::from_secs(5),
                turn_timeout: Duration::from_secs(5),
            },
        );
        let scripter = Scripter::new(llm.clone());
        let sessions = Arc::new(SessionCache::new(1800));
        EntryRouter::new(llm, analyzer, planner, executor, scripter, sessions, clock)
    }

    use chrono::TimeZone;

    #[tokio::test]
    async fn unparseable_decision_defaults_to_full_pipeline() {
        let llm = Arc::new(MockLlmClient::new(|req| {
            if req.messages.iter().any(|m| m.content.contains("User message")) {
                "no path here".to_string()
            } else if req.messages.iter().any(|m| m.content.contains("structured query")) {
                r#"{"intent_type":"unknown","target":{"coin":["BTC"],"entity":null},
                "event":{"magnitude":"any","keywords":[]},
                "goal":{"task":"summarize","depth":"medium"},
                "time_range":{"pivot_time":"today","relative":"none"},
                "filters":{"sentiment":"any","category":"unknown"}}"#
                    .to_string()
            } else {
                "a direct reply".to_string()
            }
        }));
        let router = router_with(llm);
        let outcome = router.ask("s1", "hello there").await;
        assert_eq!(outcome.path, "DIRECT");
    }
}
