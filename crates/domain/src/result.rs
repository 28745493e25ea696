use serde::{Deserialize, Serialize};

use crate::query::IntentType;

/// One recorded tool or summarizer failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    pub tool_name: String,
    pub cause: String,
}

/// What the Executor returns and the Scripter consumes. Carries only
/// summaries; raw price rows and news chunks never leave the Executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub original_query: String,
    pub intent_type: IntentType,
    pub coin_names: Vec<String>,
    pub price_summary: Option<String>,
    pub news_summary: Option<String>,
    pub total_actions: usize,
    pub successful_actions: usize,
    pub failed_actions: usize,
    pub errors: Vec<ExecutionError>,
}

impl PlanResult {
    pub fn succeeded(&self) -> bool {
        self.failed_actions < self.total_actions || self.total_actions == 0
    }
}
