use serde::Serialize;

/// Last known symbol and price; the price every new order executes at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    symbol: String,
    price: f64,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price: f64) -> Option<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return None;
        }
        if !price.is_finite() || price <= 0.0 {
            return None;
        }

        Some(Self { symbol, price })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn price(&self) -> f64 {
        self.price
    }
}
