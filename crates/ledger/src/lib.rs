pub mod ledger;
pub mod order;
pub mod position;
pub mod quote;
pub mod store;
pub mod valuation;

pub use ledger::{Ledger, LedgerError, LedgerSnapshot};
pub use order::{Order, OrderId, OrderSide};
pub use position::Position;
pub use quote::Quote;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use valuation::Valuation;

pub const INITIAL_CASH: f64 = 10_000.0;
pub const ORDER_HISTORY_LIMIT: usize = 50;

pub const ORDERS_KEY: &str = "orders_v1";
pub const POSITION_KEY: &str = "position_v1";
pub const CASH_KEY: &str = "cash_v1";

pub fn module_ready() -> bool {
    true
}
