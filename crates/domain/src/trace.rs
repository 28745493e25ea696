use serde::Serialize;

/// Structured trace events emitted across the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TurnStarted {
        session_key: String,
        utterance_chars: usize,
    },
    TurnCompleted {
        session_key: String,
        path: String,
        duration_ms: u64,
        error: Option<String>,
    },
    RouterDecision {
        session_key: String,
        chosen_path: String,
        fallback_applied: bool,
    },
    ToolDispatched {
        tool_name: String,
        duration_ms: u64,
        success: bool,
    },
    AutoChained {
        from_tool: String,
        to_tool: String,
    },
    LlmRequest {
        role: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    SessionResolved {
        session_key: String,
        is_new: bool,
    },
    SessionExpired {
        session_key: String,
        idle_seconds: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "coinq_event");
    }
}
