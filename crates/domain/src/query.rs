use serde::{Deserialize, Serialize};

/// The Analyzer's structured reading of a user utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub intent_type: IntentType,
    pub target: Target,
    pub event: Event,
    pub goal: Goal,
    pub time_range: TimeRange,
    pub filters: Filters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    MarketTrend,
    NewsSummary,
    PriceReason,
    Unknown,
}

/// `target.coin` may be an explicit set of symbols or the sentinel "all".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoinTarget {
    All,
    Symbols(Vec<String>),
}

impl CoinTarget {
    /// Concrete coin symbols for plan emission. The "all" sentinel
    /// travels as the literal string `"all"` inside the symbols array
    /// (it is never the untagged `All` unit variant, which only
    /// matches a JSON `null`), so it's detected by content, not shape,
    /// and resolves to an empty list (the Planner falls back to BTC,
    /// matching the original's default).
    pub fn symbols(&self) -> Vec<String> {
        match self {
            CoinTarget::All => Vec::new(),
            CoinTarget::Symbols(v) if v.iter().any(|s| s.eq_ignore_ascii_case("all")) => Vec::new(),
            CoinTarget::Symbols(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub coin: CoinTarget,
    #[serde(default)]
    pub entity: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    Big,
    Small,
    Any,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub magnitude: Magnitude,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Summarize,
    Analyze,
    ExplainImpact,
    FindReasons,
    Compare,
    Forecast,
    ExtractKeywords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Short,
    Medium,
    Deep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub task: Task,
    pub depth: Depth,
}

/// `time_range.pivot_time`: either the sentinel "today" or a YYYYMMDD string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PivotTime {
    Today,
    Date(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeRange {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "1m")]
    Month,
    Ytd,
    All,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub pivot_time: PivotTime,
    pub relative: RelativeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Macro,
    Altcoin,
    Defi,
    Layer2,
    Meme,
    Regulation,
    Exchange,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub sentiment: Sentiment,
    pub category: Category,
}

impl NormalizedQuery {
    pub fn is_unknown(&self) -> bool {
        matches!(self.intent_type, IntentType::Unknown)
    }
}
