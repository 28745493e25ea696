use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use coinq_domain::clock::Clock;
use coinq_domain::config::{DepthParams, PlannerConfig};
use coinq_domain::plan::{QueryPlan, ToolCall};
use coinq_domain::query::{IntentType, Magnitude, NormalizedQuery, PivotTime, RelativeRange};
use coinq_domain::{Error, Result};
use coinq_tools::registry::{GET_COIN_PRICE, MAKE_SEMANTIC_QUERY};
use coinq_tools::types::{DateRange, Direction, RangeType};
use serde_json::json;

/// A named search angle: a label plus extra keywords, emitted as one
/// `make_semantic_query` call.
#[derive(Debug, Clone)]
struct Perspective {
    custom_context: &'static str,
    event_keywords: &'static [&'static str],
}

/// Compiles a `NormalizedQuery` into a `QueryPlan`.
pub struct Planner {
    config: PlannerConfig,
    clock: Arc<dyn Clock>,
}

impl Planner {
    pub fn new(config: PlannerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn make_plan(&self, query: &NormalizedQuery) -> Result<QueryPlan> {
        if query.is_unknown() {
            return Err(Error::UnknownIntent);
        }

        let now = self.clock.now();
        let pivot_time_epoch = resolve_pivot_time(&query.time_range.pivot_time, now);

        let mut coins = query.target.coin.symbols();
        if coins.is_empty() {
            coins.push("BTC".to_string());
        }

        let range_type = relative_to_range_type(query.time_range.relative);
        let direction = if matches!(query.intent_type, IntentType::PriceReason) {
            Direction::Both
        } else {
            Direction::Before
        };

        let mut calls = Vec::new();

        // Step 1: price series, one call per coin — only for intents
        // that actually reason about price movement. A pure news query
        // has nothing to do with a price series.
        if matches!(query.intent_type, IntentType::PriceReason | IntentType::MarketTrend) {
            for coin in &coins {
                calls.push(ToolCall::new(
                    GET_COIN_PRICE,
                    json!({
                        "coin_name": coin,
                        "pivot_date_epoch": pivot_time_epoch,
                        "range_type": range_type_str(range_type),
                        "direction": direction_str(direction),
                    }),
                ));
            }
        }

        // Step 2: semantic-search perspective expansion.
        let perspectives = perspectives_for(query.intent_type);
        let depth_params = self.depth_params(query.goal.depth);
        let magnitude = magnitude_to_tool_vocab(query.event.magnitude);
        let date_range = relative_to_date_range(query.time_range.relative);

        for perspective in perspectives {
            let combined_keywords = union_keywords(&query.event.keywords, perspective.event_keywords);

            calls.push(ToolCall::new(
                MAKE_SEMANTIC_QUERY,
                json!({
                    "coin_names": coins,
                    "intent_type": intent_type_str(query.intent_type),
                    "event_keywords": combined_keywords,
                    "event_magnitude": magnitude,
                    "custom_context": perspective.custom_context,
                    "_search_params": {
                        "top_k": depth_params.top_k,
                        "similarity_threshold": depth_params.similarity_threshold,
                        "pivot_date": pivot_time_epoch,
                        "date_range": date_range_str(date_range),
                    },
                }),
            ));
        }

        Ok(QueryPlan {
            intent_type: query.intent_type,
            pivot_time_epoch,
            calls,
        })
    }

    fn depth_params(&self, depth: coinq_domain::query::Depth) -> DepthParams {
        use coinq_domain::query::Depth;
        match depth {
            Depth::Short => self.config.depth_short,
            Depth::Medium => self.config.depth_medium,
            Depth::Deep => self.config.depth_deep,
        }
    }
}

fn resolve_pivot_time(pivot: &PivotTime, now: DateTime<Utc>) -> i64 {
    match pivot {
        PivotTime::Today => utc_midnight(now).timestamp(),
        PivotTime::Date(s) => NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or_else(|| utc_midnight(now).timestamp()),
    }
}

fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_hms_opt(0, 0, 0).unwrap())
}

fn relative_to_range_type(relative: RelativeRange) -> RangeType {
    match relative {
        RelativeRange::Day => RangeType::Day,
        RelativeRange::Week => RangeType::Week,
        RelativeRange::Month => RangeType::Month,
        RelativeRange::Ytd => RangeType::Year,
        RelativeRange::All => RangeType::Year,
        RelativeRange::None => RangeType::Month,
    }
}

/// The vector store's date window only understands day/week/month; a
/// relative range wider than a month (ytd, all) falls back to the
/// widest window available, matching the original's dict-default
/// behavior rather than inventing a year-long window.
fn relative_to_date_range(relative: RelativeRange) -> DateRange {
    match relative {
        RelativeRange::Day => DateRange::Day,
        RelativeRange::Week => DateRange::Week,
        _ => DateRange::Month,
    }
}

fn magnitude_to_tool_vocab(magnitude: Magnitude) -> Option<String> {
    match magnitude {
        Magnitude::Big => Some("surge".to_string()),
        Magnitude::Small => Some("plunge".to_string()),
        Magnitude::Any | Magnitude::None => None,
    }
}

fn union_keywords(base: &[String], extra: &[&'static str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for k in base.iter().cloned().chain(extra.iter().map(|s| s.to_string())) {
        if !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

fn perspectives_for(intent: IntentType) -> Vec<Perspective> {
    match intent {
        IntentType::PriceReason => vec![
            Perspective {
                custom_context: "direct price-moving catalysts",
                event_keywords: &["surge", "plunge", "rally", "selloff"],
            },
            Perspective {
                custom_context: "macro and monetary market environment",
                event_keywords: &["market", "interest rates", "dollar", "liquidity"],
            },
            Perspective {
                custom_context: "positive catalyst events",
                event_keywords: &["ETF", "approval", "institutional adoption"],
            },
            Perspective {
                custom_context: "regulatory and policy changes",
                event_keywords: &["regulation", "SEC", "policy", "legislation"],
            },
            Perspective {
                custom_context: "technical network factors",
                event_keywords: &["halving", "mining", "hash rate", "network"],
            },
        ],
        IntentType::MarketTrend => vec![
            Perspective {
                custom_context: "overall market trend",
                event_keywords: &["market", "trend"],
            },
            Perspective {
                custom_context: "trading volume and investor activity",
                event_keywords: &["volume", "investors", "buying", "selling"],
            },
            Perspective {
                custom_context: "institutional and large-holder activity",
                event_keywords: &["institutional", "whale", "large holders"],
            },
        ],
        IntentType::NewsSummary | IntentType::Unknown => vec![
            Perspective {
                custom_context: "major news issues",
                event_keywords: &["news", "announcement"],
            },
            Perspective {
                custom_context: "project updates",
                event_keywords: &["update", "development", "roadmap"],
            },
            Perspective {
                custom_context: "partnerships and collaborations",
                event_keywords: &["partnership", "collaboration"],
            },
            Perspective {
                custom_context: "exchange listings",
                event_keywords: &["exchange", "listing", "deposit", "withdrawal"],
            },
        ],
    }
}

fn intent_type_str(intent: IntentType) -> &'static str {
    match intent {
        IntentType::MarketTrend => "market_trend",
        IntentType::NewsSummary => "news_summary",
        IntentType::PriceReason => "price_reason",
        IntentType::Unknown => "unknown",
    }
}

fn range_type_str(range: RangeType) -> &'static str {
    match range {
        RangeType::Hour => "hour",
        RangeType::Day => "day",
        RangeType::Week => "week",
        RangeType::Month => "month",
        RangeType::Year => "year",
    }
}

fn direction_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Before => "before",
        Direction::After => "after",
        Direction::Both => "both",
    }
}

fn date_range_str(range: DateRange) -> &'static str {
    match range {
        DateRange::Day => "day",
        DateRange::Week => "week",
        DateRange::Month => "month",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinq_domain::query::Category;
    use coinq_domain::query::{CoinTarget, Depth, Event, Filters, Goal, Sentiment, Target, Task, TimeRange};

    fn base_query(intent: IntentType) -> NormalizedQuery {
        NormalizedQuery {
            intent_type: intent,
            target: Target {
                coin: CoinTarget::Symbols(vec!["BTC".to_string()]),
                entity: None,
            },
            event: Event {
                magnitude: Magnitude::Big,
                keywords: vec!["halving".to_string()],
            },
            goal: Goal {
                task: Task::FindReasons,
                depth: Depth::Medium,
            },
            time_range: TimeRange {
                pivot_time: PivotTime::Today,
                relative: RelativeRange::Month,
            },
            filters: Filters {
                sentiment: Sentiment::Any,
                category: Category::Unknown,
            },
        }
    }

    fn planner() -> Planner {
        let now = Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap();
        Planner::new(PlannerConfig::default(), Arc::new(coinq_domain::clock::FixedClock(now)))
    }

    #[test]
    fn unknown_intent_is_refused() {
        let plan = planner().make_plan(&base_query(IntentType::Unknown));
        assert!(matches!(plan, Err(Error::UnknownIntent)));
    }

    #[test]
    fn price_reason_emits_at_least_five_perspectives_and_both_direction() {
        let plan = planner().make_plan(&base_query(IntentType::PriceReason)).unwrap();
        let price_calls: Vec<_> = plan.calls.iter().filter(|c| c.tool_name == GET_COIN_PRICE).collect();
        let query_calls: Vec<_> = plan.calls.iter().filter(|c| c.tool_name == MAKE_SEMANTIC_QUERY).collect();
        assert_eq!(price_calls.len(), 1);
        assert_eq!(price_calls[0].arguments["direction"], "both");
        assert!(query_calls.len() >= 4);
    }

    #[test]
    fn pivot_time_today_resolves_to_utc_midnight() {
        let plan = planner().make_plan(&base_query(IntentType::MarketTrend)).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 7, 26, 0, 0, 0).unwrap().timestamp();
        assert_eq!(plan.pivot_time_epoch, expected);
    }

    #[test]
    fn search_params_carry_depth_tunables() {
        let plan = planner().make_plan(&base_query(IntentType::NewsSummary)).unwrap();
        let call = plan.calls.iter().find(|c| c.tool_name == MAKE_SEMANTIC_QUERY).unwrap();
        let params = call.meta("_search_params").unwrap();
        assert_eq!(params["top_k"], 15);
    }

    #[test]
    fn news_summary_emits_no_price_calls() {
        let plan = planner().make_plan(&base_query(IntentType::NewsSummary)).unwrap();
        assert!(plan.calls.iter().all(|c| c.tool_name != GET_COIN_PRICE));
    }
}
