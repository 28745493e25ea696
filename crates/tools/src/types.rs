use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeType {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl RangeType {
    /// Interval offset in seconds used to compute the query window.
    pub fn offset_seconds(self) -> i64 {
        match self {
            RangeType::Hour => 3_600,
            RangeType::Day => 86_400,
            RangeType::Week => 7 * 86_400,
            RangeType::Month => 30 * 86_400,
            RangeType::Year => 365 * 86_400,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Before,
    After,
    Both,
}

/// One OHLC/close point in a price series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub coin_name: String,
    pub epoch: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A retrieved unit from the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPassage {
    pub title: String,
    pub source: String,
    pub date_epoch: i64,
    pub text: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Day,
    Week,
    Month,
}

impl DateRange {
    pub fn offset_seconds(self) -> i64 {
        match self {
            DateRange::Day => 86_400,
            DateRange::Week => 7 * 86_400,
            DateRange::Month => 30 * 86_400,
        }
    }
}
