use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use coinq_domain::plan::{QueryPlan, ToolCall};
use coinq_domain::result::{ExecutionError, PlanResult};
use coinq_tools::registry::{ToolOutput, ToolRegistry, GET_COIN_PRICE, MAKE_SEMANTIC_QUERY};
use coinq_tools::types::{NewsPassage, PricePoint};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

/// Executor tunables: fan-out ceiling and per-call/per-turn deadlines.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub fan_out_ceiling: usize,
    pub per_call_timeout: Duration,
    pub turn_timeout: Duration,
}

struct Buckets {
    price_points: HashMap<String, Vec<PricePoint>>,
    /// (declared-call index, passage) — the index orders ties by the
    /// plan's declared order, matching the source perspective's
    /// position, not completion order.
    news_passages: Vec<(usize, NewsPassage)>,
    errors: Vec<ExecutionError>,
}

impl Buckets {
    fn new() -> Self {
        Self {
            price_points: HashMap::new(),
            news_passages: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Executes a `QueryPlan`: dispatches its declared `ToolCall`s,
/// auto-chains `make_semantic_query` into `semantic_search`, ranks and
/// truncates results, invokes the summarizer tools, and assembles a
/// `PlanResult`.
pub struct Executor {
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    pub async fn execute(&self, plan: &QueryPlan, original_query: &str) -> PlanResult {
        let deadline = Instant::now() + self.config.turn_timeout;
        let total_actions = plan.calls.len();
        let successful = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let buckets = Arc::new(Mutex::new(Buckets::new()));
        let semaphore = Arc::new(Semaphore::new(self.config.fan_out_ceiling.max(1)));

        // ── Phase A: Collection ─────────────────────────────────────
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(plan.calls.len());
        for (index, call) in plan.calls.iter().enumerate() {
            let registry = Arc::clone(&self.registry);
            let buckets = Arc::clone(&buckets);
            let semaphore = Arc::clone(&semaphore);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let call = call.clone();
            let per_call_timeout = self.config.per_call_timeout;

            handles.push(tokio::spawn(async move {
                run_collection_call(index, call, registry, buckets, semaphore, successful, failed, per_call_timeout)
                    .await;
            }));
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if tokio::time::timeout(remaining, join_all(&mut handles)).await.is_err() {
            // Overall deadline exceeded: abort whatever is still running
            // rather than letting it finish detached in the background.
            for h in &handles {
                h.abort();
            }
        }

        // ── Phase B: Summarization ──────────────────────────────────
        let (price_summary, news_summary) = if Instant::now() < deadline {
            self.summarize(&buckets, deadline).await
        } else {
            let mut b = buckets.lock().await;
            b.errors.push(ExecutionError {
                tool_name: "summarize".to_string(),
                cause: "turn deadline exceeded before summarization".to_string(),
            });
            (None, None)
        };

        // ── Phase C: Assembly ────────────────────────────────────────
        let b = buckets.lock().await;

        let mut coin_names: Vec<String> = plan
            .calls
            .iter()
            .filter(|c| c.tool_name == GET_COIN_PRICE)
            .filter_map(|c| c.arguments.get("coin_name").and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .collect();
        coin_names.sort();
        coin_names.dedup();

        PlanResult {
            original_query: original_query.to_string(),
            intent_type: plan.intent_type,
            coin_names,
            price_summary,
            news_summary,
            total_actions,
            successful_actions: successful.load(Ordering::SeqCst),
            failed_actions: failed.load(Ordering::SeqCst),
            errors: b.errors.clone(),
        }
    }

    async fn summarize(&self, buckets: &Arc<Mutex<Buckets>>, deadline: Instant) -> (Option<String>, Option<String>) {
        let (price_data, news_data) = {
            let mut b = buckets.lock().await;
            b.news_passages.sort_by(|a, b| {
                b.1.similarity
                    .partial_cmp(&a.1.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            (b.price_points.clone(), b.news_passages.iter().map(|(_, p)| p.clone()).collect::<Vec<_>>())
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let registry = Arc::clone(&self.registry);

        let price_fut = async {
            if price_data.is_empty() {
                return None;
            }
            let mut parts = Vec::new();
            for (coin, points) in &price_data {
                let args = serde_json::json!({
                    "coin_name": coin,
                    "price_data": points,
                    "focus": serde_json::Value::Null,
                });
                let call = ToolCall::new("summarize_price_data", args);
                match tokio::time::timeout(self.config.per_call_timeout, registry.dispatch(&call)).await {
                    Ok(Ok(ToolOutput::Summary(s))) => parts.push(s),
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        buckets.lock().await.errors.push(ExecutionError {
                            tool_name: "summarize_price_data".to_string(),
                            cause: e.to_string(),
                        });
                    }
                    Err(_) => {
                        buckets.lock().await.errors.push(ExecutionError {
                            tool_name: "summarize_price_data".to_string(),
                            cause: "timeout".to_string(),
                        });
                    }
                }
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("\n\n"))
            }
        };

        let news_fut = async {
            if news_data.is_empty() {
                return None;
            }
            let args = serde_json::json!({
                "news_chunks": news_data,
                "focus": serde_json::Value::Null,
            });
            let call = ToolCall::new("summarize_news_chunks", args);
            match tokio::time::timeout(self.config.per_call_timeout, registry.dispatch(&call)).await {
                Ok(Ok(ToolOutput::Summary(s))) => Some(s),
                Ok(Ok(_)) => None,
                Ok(Err(e)) => {
                    buckets.lock().await.errors.push(ExecutionError {
                        tool_name: "summarize_news_chunks".to_string(),
                        cause: e.to_string(),
                    });
                    None
                }
                Err(_) => {
                    buckets.lock().await.errors.push(ExecutionError {
                        tool_name: "summarize_news_chunks".to_string(),
                        cause: "timeout".to_string(),
                    });
                    None
                }
            }
        };

        let (price_summary, news_summary) =
            tokio::time::timeout(remaining, futures_join(price_fut, news_fut))
                .await
                .unwrap_or((None, None));

        (price_summary, news_summary)
    }
}

async fn futures_join<A, B>(a: A, b: B) -> (A::Output, B::Output)
where
    A: std::future::Future,
    B: std::future::Future,
{
    tokio::join!(a, b)
}

#[allow(clippy::too_many_arguments)]
async fn run_collection_call(
    index: usize,
    call: ToolCall,
    registry: Arc<ToolRegistry>,
    buckets: Arc<Mutex<Buckets>>,
    semaphore: Arc<Semaphore>,
    successful: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    per_call_timeout: Duration,
) {
    let permit = semaphore.acquire_owned().await.expect("semaphore not closed");
    let outcome = tokio::time::timeout(per_call_timeout, registry.dispatch(&call)).await;
    drop(permit);

    match outcome {
        Ok(Ok(output)) => {
            successful.fetch_add(1, Ordering::SeqCst);
            handle_output(index, &call, output, &registry, &buckets, &semaphore, per_call_timeout).await;
        }
        Ok(Err(e)) => {
            failed.fetch_add(1, Ordering::SeqCst);
            buckets.lock().await.errors.push(ExecutionError {
                tool_name: call.tool_name.clone(),
                cause: e.to_string(),
            });
        }
        Err(_) => {
            failed.fetch_add(1, Ordering::SeqCst);
            buckets.lock().await.errors.push(ExecutionError {
                tool_name: call.tool_name.clone(),
                cause: "timeout".to_string(),
            });
        }
    }
}

async fn handle_output(
    index: usize,
    call: &ToolCall,
    output: ToolOutput,
    registry: &Arc<ToolRegistry>,
    buckets: &Arc<Mutex<Buckets>>,
    semaphore: &Arc<Semaphore>,
    per_call_timeout: Duration,
) {
    match output {
        ToolOutput::Prices(points) => {
            if let Some(coin) = call.arguments.get("coin_name").and_then(|v| v.as_str()) {
                buckets.lock().await.price_points.entry(coin.to_string()).or_default().extend(points);
            }
        }
        ToolOutput::QueryString(query) if call.tool_name == MAKE_SEMANTIC_QUERY => {
            // Auto-chain: dispatch semantic_search using the query's
            // own `_search_params` meta. Counted toward concurrency,
            // never toward declared-action counters.
            let Some(search_params) = call.meta("_search_params").cloned() else {
                return;
            };
            let _permit = semaphore.acquire().await.expect("semaphore not closed");
            let result =
                tokio::time::timeout(per_call_timeout, registry.semantic_search_with(query, search_params)).await;
            match result {
                Ok(Ok(mut passages)) => {
                    passages.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
                    passages.truncate(3);
                    let mut b = buckets.lock().await;
                    for p in passages {
                        b.news_passages.push((index, p));
                    }
                }
                Ok(Err(e)) => {
                    buckets.lock().await.errors.push(ExecutionError {
                        tool_name: "semantic_search".to_string(),
                        cause: e.to_string(),
                    });
                }
                Err(_) => {
                    buckets.lock().await.errors.push(ExecutionError {
                        tool_name: "semantic_search".to_string(),
                        cause: "timeout".to_string(),
                    });
                }
            }
        }
        _ => {}
    }
}

async fn join_all(handles: &mut [JoinHandle<()>]) {
    for h in handles.iter_mut() {
        let _ = h.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinq_domain::plan::QueryPlan;
    use coinq_domain::query::IntentType;
    use coinq_llm::mock::MockLlmClient;
    use coinq_tools::stores::{InMemoryPriceStore, InMemoryVectorStore};
    use coinq_tools::types::{NewsPassage, PricePoint};
    use std::collections::HashMap as Map;

    fn test_executor() -> (Executor, Arc<ToolRegistry>) {
        let mut series = Map::new();
        series.insert(
            "BTC".to_string(),
            vec![PricePoint {
                coin_name: "BTC".to_string(),
                epoch: 0,
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
            }],
        );
        let price_store = Arc::new(InMemoryPriceStore::new(series));
        let passage = |title: &str, key: f32| {
            (
                key,
                NewsPassage {
                    title: title.to_string(),
                    source: "wire".to_string(),
                    date_epoch: 0,
                    text: "text".to_string(),
                    similarity: 0.0,
                },
            )
        };
        let vector_store = Arc::new(InMemoryVectorStore::new(vec![
            passage("a", 0.0),
            passage("b", 0.1),
            passage("c", 0.2),
            passage("d", 0.3),
        ]));
        let llm = Arc::new(MockLlmClient::new(|_| "keyword query".to_string()));
        let registry = Arc::new(ToolRegistry::new(price_store, vector_store, llm));
        let executor = Executor::new(
            Arc::clone(&registry),
            ExecutorConfig {
                fan_out_ceiling: 8,
                per_call_timeout: Duration::from_secs(5),
                turn_timeout: Duration::from_secs(5),
            },
        );
        (executor, registry)
    }

    #[tokio::test]
    async fn declared_counters_exclude_auto_chained_search() {
        let (executor, _registry) = test_executor();
        let plan = QueryPlan {
            intent_type: IntentType::PriceReason,
            pivot_time_epoch: 0,
            calls: vec![
                ToolCall::new(
                    GET_COIN_PRICE,
                    serde_json::json!({"coin_name": "BTC", "pivot_date_epoch": 0, "range_type": "day", "direction": "before"}),
                ),
                ToolCall::new(
                    MAKE_SEMANTIC_QUERY,
                    serde_json::json!({
                        "coin_names": ["BTC"], "intent_type": "price_reason", "event_keywords": [],
                        "event_magnitude": serde_json::Value::Null, "custom_context": "x",
                        "_search_params": {"top_k": 10, "similarity_threshold": -1.0, "pivot_date": 0, "date_range": "month"}
                    }),
                ),
            ],
        };

        let result = executor.execute(&plan, "utterance").await;
        assert_eq!(result.total_actions, 2);
        assert_eq!(result.successful_actions, 2);
        assert_eq!(result.failed_actions, 0);
        assert_eq!(result.coin_names, vec!["BTC".to_string()]);
    }

    #[tokio::test]
    async fn caps_passages_per_perspective_at_three() {
        let (executor, _registry) = test_executor();
        let plan = QueryPlan {
            intent_type: IntentType::NewsSummary,
            pivot_time_epoch: 0,
            calls: vec![ToolCall::new(
                MAKE_SEMANTIC_QUERY,
                serde_json::json!({
                    "coin_names": ["BTC"], "intent_type": "news_summary", "event_keywords": [],
                    "event_magnitude": serde_json::Value::Null, "custom_context": "x",
                    "_search_params": {"top_k": 10, "similarity_threshold": -1.0, "pivot_date": 0, "date_range": "month"}
                }),
            )],
        };
        let result = executor.execute(&plan, "utterance").await;
        assert!(result.news_summary.is_some());
    }
}
