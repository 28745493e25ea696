use std::sync::Arc;
use std::time::Duration;

use coinq_domain::clock::Clock;
use coinq_domain::config::Config;
use coinq_llm::LlmClient;
use coinq_sessions::SessionCache;
use coinq_tools::registry::ToolRegistry;
use coinq_tools::stores::{PriceStore, VectorStore};

use crate::analyzer::Analyzer;
use crate::executor::{Executor, ExecutorConfig};
use crate::planner::Planner;
use crate::router::{AskOutcome, EntryRouter};
use crate::scripter::Scripter;

/// Wires the five stages and the session cache from a `Config` and a
/// set of collaborators, and exposes the single inbound operation.
pub struct Pipeline {
    router: EntryRouter,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        price_store: Arc<dyn PriceStore>,
        vector_store: Arc<dyn VectorStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(ToolRegistry::new(price_store, vector_store, Arc::clone(&llm)));
        let analyzer = Analyzer::new(Arc::clone(&llm), Arc::clone(&clock), config.pipeline.max_query_chars);
        let planner = Planner::new(config.planner.clone(), Arc::clone(&clock));
        let executor = Executor::new(
            registry,
            ExecutorConfig {
                fan_out_ceiling: config.pipeline.fan_out_ceiling,
                per_call_timeout: Duration::from_millis(config.pipeline.per_call_timeout_ms),
                turn_timeout: Duration::from_millis(config.pipeline.turn_timeout_ms),
            },
        );
        let scripter = Scripter::new(Arc::clone(&llm));
        let sessions = Arc::new(SessionCache::new(config.sessions.ttl_seconds));

        let router = EntryRouter::new(llm, analyzer, planner, executor, scripter, sessions, clock);
        Self { router }
    }

    pub async fn ask(&self, session_id: &str, utterance: &str) -> AskOutcome {
        self.router.ask(session_id, utterance).await
    }
}
