use serde::{Deserialize, Serialize};

fn d_fan_out_ceiling() -> usize {
    8
}
fn d_per_call_timeout_ms() -> u64 {
    15_000
}
fn d_turn_timeout_ms() -> u64 {
    60_000
}
fn d_session_ttl_seconds() -> u64 {
    1_800
}
fn d_max_query_chars() -> usize {
    200
}
fn d_llm_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn d_llm_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}
fn d_llm_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}
fn d_llm_timeout_ms() -> u64 {
    30_000
}

/// Executor concurrency and deadline tunables. See the Concurrency &
/// Resource Model: the fan-out ceiling bounds simultaneous outstanding
/// tool calls per turn; timeouts bound individual calls and the turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "d_fan_out_ceiling")]
    pub fan_out_ceiling: usize,
    #[serde(default = "d_per_call_timeout_ms")]
    pub per_call_timeout_ms: u64,
    #[serde(default = "d_turn_timeout_ms")]
    pub turn_timeout_ms: u64,
    #[serde(default = "d_max_query_chars")]
    pub max_query_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fan_out_ceiling: d_fan_out_ceiling(),
            per_call_timeout_ms: d_per_call_timeout_ms(),
            turn_timeout_ms: d_turn_timeout_ms(),
            max_query_chars: d_max_query_chars(),
        }
    }
}

/// Session cache TTL. Every SessionCache operation refreshes expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "d_session_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: d_session_ttl_seconds(),
        }
    }
}

/// Per-depth search parameters. Defaults are the original system's
/// constants; threshold decreases (more permissive) as depth deepens
/// because the underlying metric is L2 distance, not cosine similarity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepthParams {
    pub top_k: usize,
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_depth_short")]
    pub depth_short: DepthParams,
    #[serde(default = "default_depth_medium")]
    pub depth_medium: DepthParams,
    #[serde(default = "default_depth_deep")]
    pub depth_deep: DepthParams,
}

fn default_depth_short() -> DepthParams {
    DepthParams {
        top_k: 10,
        similarity_threshold: 0.1,
    }
}
fn default_depth_medium() -> DepthParams {
    DepthParams {
        top_k: 15,
        similarity_threshold: 0.0,
    }
}
fn default_depth_deep() -> DepthParams {
    DepthParams {
        top_k: 25,
        similarity_threshold: -0.2,
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            depth_short: default_depth_short(),
            depth_medium: default_depth_medium(),
            depth_deep: default_depth_deep(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_llm_base_url")]
    pub base_url: String,
    #[serde(default = "d_llm_model")]
    pub model: String,
    #[serde(default = "d_llm_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_llm_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_llm_base_url(),
            model: d_llm_model(),
            api_key_env: d_llm_api_key_env(),
            timeout_ms: d_llm_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}
