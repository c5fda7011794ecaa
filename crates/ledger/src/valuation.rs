use serde::Serialize;

use crate::position::Position;

/// Mark-to-market view of the ledger at one price. Pure; never mutates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Valuation {
    pub position_value: f64,
    /// Absent while no quote is loaded.
    pub unrealized_pnl: Option<f64>,
    pub total_equity: f64,
    /// Share of total equity held in the position, 0..=1.
    pub holdings_allocation: f64,
}

impl Valuation {
    pub fn compute(cash: f64, position: Position, price: Option<f64>) -> Self {
        let position_value = price.map_or(0.0, |px| position.quantity * px);
        let unrealized_pnl = price.map(|px| (px - position.avg_cost) * position.quantity);
        let total_equity = cash + position_value;
        let holdings_allocation = if total_equity == 0.0 {
            0.0
        } else {
            position_value / total_equity
        };

        Self {
            position_value,
            unrealized_pnl,
            total_equity,
            holdings_allocation,
        }
    }

    pub fn holdings_pct(&self) -> u32 {
        (self.holdings_allocation * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::Valuation;
    use crate::position::Position;

    #[test]
    fn values_open_position_at_current_price() {
        let position = Position { quantity: 20.0, avg_cost: 110.0 };

        let valuation = Valuation::compute(7_800.0, position, Some(120.0));

        assert_eq!(valuation.position_value, 2_400.0);
        assert_eq!(valuation.unrealized_pnl, Some(200.0));
        assert_eq!(valuation.total_equity, 10_200.0);
        assert_eq!(valuation.holdings_pct(), 24);
    }

    #[test]
    fn reports_loss_below_avg_cost() {
        let position = Position { quantity: 5.0, avg_cost: 110.0 };

        let valuation = Valuation::compute(0.0, position, Some(100.0));

        assert_eq!(valuation.unrealized_pnl, Some(-50.0));
        assert_eq!(valuation.holdings_allocation, 1.0);
    }

    #[test]
    fn without_quote_only_cash_counts() {
        let position = Position { quantity: 5.0, avg_cost: 110.0 };

        let valuation = Valuation::compute(9_000.0, position, None);

        assert_eq!(valuation.position_value, 0.0);
        assert_eq!(valuation.unrealized_pnl, None);
        assert_eq!(valuation.total_equity, 9_000.0);
        assert_eq!(valuation.holdings_pct(), 0);
    }

    #[test]
    fn zero_equity_has_zero_allocation() {
        let valuation = Valuation::compute(0.0, Position::flat(), Some(50.0));

        assert_eq!(valuation.holdings_allocation, 0.0);
    }
}
