use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Millisecond creation time, bumped past the previous id when the clock
/// would otherwise repeat or step back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub fn next_after(last: Option<OrderId>, at: OffsetDateTime) -> Self {
        let now_ms = u64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
        match last {
            Some(OrderId(prev)) if prev >= now_ms => OrderId(prev.saturating_add(1)),
            _ => OrderId(now_ms),
        }
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub quantity: f64,
    pub price: f64,
    pub symbol: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::{Order, OrderId, OrderSide};

    #[test]
    fn next_id_uses_clock_millis_when_ahead_of_last() {
        let at = datetime!(2026-01-02 03:04:05.678 UTC);

        let id = OrderId::next_after(Some(OrderId(1)), at);

        assert_eq!(id, OrderId(1_767_323_045_678));
    }

    #[test]
    fn next_id_stays_monotonic_when_clock_repeats() {
        let at = datetime!(2026-01-02 03:04:05.678 UTC);
        let first = OrderId::next_after(None, at);

        let second = OrderId::next_after(Some(first), at);
        let third = OrderId::next_after(Some(second), datetime!(2026-01-02 03:04:00 UTC));

        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn order_serializes_with_uppercase_side_and_rfc3339_timestamp() {
        let order = Order {
            id: OrderId(42),
            side: OrderSide::Sell,
            quantity: 5.0,
            price: 140.0,
            symbol: "AAPL".to_string(),
            timestamp: datetime!(2026-01-02 03:04:05 UTC),
        };

        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "id": 42,
                "side": "SELL",
                "quantity": 5.0,
                "price": 140.0,
                "symbol": "AAPL",
                "timestamp": "2026-01-02T03:04:05Z",
            })
        );
    }
}
