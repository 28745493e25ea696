use serde::{Deserialize, Serialize};

use crate::query::NormalizedQuery;
use crate::result::PlanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Mutable state owned by one session. Created on first turn, mutated
/// only at end of turn, destroyed on TTL expiry or explicit reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub last_normalized_query: Option<NormalizedQuery>,
    pub last_plan_result: Option<PlanResult>,
    pub coins: Vec<String>,
    pub message_count: u64,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
}

impl SessionContext {
    pub fn fresh() -> Self {
        Self::default()
    }

    pub fn append_message(&mut self, role: MessageRole, content: String, now: chrono::DateTime<chrono::Utc>) {
        self.messages.push(SessionMessage {
            role,
            content,
            timestamp: now,
        });
        self.message_count += 1;
    }

    /// Trailing N messages, most recent last.
    pub fn history(&self, n: usize) -> &[SessionMessage] {
        let len = self.messages.len();
        &self.messages[len.saturating_sub(n)..]
    }
}
