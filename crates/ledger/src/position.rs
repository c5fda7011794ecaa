use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub quantity: f64,
    pub avg_cost: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    /// Volume-weighted average of the held lot and the new fill.
    pub fn after_buy(self, quantity: f64, price: f64) -> Self {
        let new_qty = self.quantity + quantity;
        if new_qty == 0.0 {
            return Self::flat();
        }

        Self {
            quantity: new_qty,
            avg_cost: (self.avg_cost * self.quantity + price * quantity) / new_qty,
        }
    }

    /// Sells leave the average cost alone until the position is closed.
    pub fn after_sell(self, quantity: f64) -> Self {
        let new_qty = (self.quantity - quantity).max(0.0);
        if new_qty == 0.0 {
            return Self::flat();
        }

        Self {
            quantity: new_qty,
            avg_cost: self.avg_cost,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.quantity.is_finite()
            && self.avg_cost.is_finite()
            && self.quantity >= 0.0
            && self.avg_cost >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Position;

    #[test]
    fn buy_into_flat_position_takes_fill_price() {
        let position = Position::flat().after_buy(10.0, 100.0);

        assert_eq!(position, Position { quantity: 10.0, avg_cost: 100.0 });
    }

    #[test]
    fn buy_averages_cost_by_volume() {
        let position = Position::flat().after_buy(10.0, 100.0).after_buy(30.0, 120.0);

        assert_eq!(position.quantity, 40.0);
        assert_eq!(position.avg_cost, 115.0);
    }

    #[test]
    fn partial_sell_keeps_avg_cost() {
        let position = Position { quantity: 20.0, avg_cost: 110.0 }.after_sell(15.0);

        assert_eq!(position, Position { quantity: 5.0, avg_cost: 110.0 });
    }

    #[test]
    fn closing_sell_resets_avg_cost() {
        let position = Position { quantity: 5.0, avg_cost: 110.0 }.after_sell(5.0);

        assert!(position.is_flat());
        assert_eq!(position.avg_cost, 0.0);
    }

    #[test]
    fn oversell_clamps_to_flat() {
        let position = Position { quantity: 3.0, avg_cost: 50.0 }.after_sell(10.0);

        assert_eq!(position, Position::flat());
    }

    #[test]
    fn serializes_avg_cost_in_camel_case() {
        let json = serde_json::to_value(Position { quantity: 5.0, avg_cost: 110.0 }).unwrap();

        assert_eq!(json, json!({ "quantity": 5.0, "avgCost": 110.0 }));
    }
}
