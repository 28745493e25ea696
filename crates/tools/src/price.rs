use coinq_domain::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::stores::PriceStore;
use crate::types::{Direction, PricePoint, RangeType};

#[derive(Debug, Deserialize)]
struct GetCoinPriceArgs {
    coin_name: String,
    pivot_date_epoch: i64,
    range_type: RangeType,
    direction: Direction,
}

/// `get_coin_price(coin_name, pivot_date_epoch, range_type, direction)`.
/// For `range_type = Hour`, returns a ±1h window around the pivot;
/// otherwise a daily series over the interval implied by
/// (range_type, direction).
pub async fn get_coin_price(store: &dyn PriceStore, args: Value) -> Result<Vec<PricePoint>> {
    let args: GetCoinPriceArgs = serde_json::from_value(args)
        .map_err(|e| Error::ToolFailure {
            tool_name: "get_coin_price".to_string(),
            cause: e.to_string(),
        })?;

    let (window_start, window_end) = price_window(args.pivot_date_epoch, args.range_type, args.direction);

    store
        .price_series(&args.coin_name, args.pivot_date_epoch, window_start, window_end)
        .await
        .map_err(|e| Error::ToolFailure {
            tool_name: "get_coin_price".to_string(),
            cause: e.to_string(),
        })
}

/// Compute the `[start, end]` epoch window for a price query.
pub fn price_window(pivot_epoch: i64, range_type: RangeType, direction: Direction) -> (i64, i64) {
    let offset = range_type.offset_seconds();
    match direction {
        Direction::Before => (pivot_epoch - offset, pivot_epoch),
        Direction::After => (pivot_epoch, pivot_epoch + offset),
        Direction::Both => (pivot_epoch - offset, pivot_epoch + offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_direction_spans_symmetric_window() {
        let (start, end) = price_window(1_000_000, RangeType::Week, Direction::Both);
        let week = 7 * 86_400;
        assert_eq!(start, 1_000_000 - week);
        assert_eq!(end, 1_000_000 + week);
    }

    #[test]
    fn before_direction_ends_at_pivot() {
        let (start, end) = price_window(1_000_000, RangeType::Day, Direction::Before);
        assert_eq!(end, 1_000_000);
        assert_eq!(start, 1_000_000 - 86_400);
    }
}
