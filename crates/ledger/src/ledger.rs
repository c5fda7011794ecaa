use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    order::{Order, OrderId, OrderSide},
    position::Position,
    quote::Quote,
    store::{KeyValueStore, StoreError},
    valuation::Valuation,
    CASH_KEY, INITIAL_CASH, ORDERS_KEY, ORDER_HISTORY_LIMIT, POSITION_KEY,
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no active quote; load a company before trading")]
    NoActiveQuote,
    #[error("order quantity must be a positive number, got {quantity}")]
    InvalidQuantity { quantity: f64 },
    #[error("insufficient funds: order needs {required:.2} but cash is {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("failed to encode ledger state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to persist ledger state: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveQuote => "no_active_quote",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Encode(_) | Self::Storage(_) => "storage",
        }
    }

    /// Rejections caused by the request itself, as opposed to storage trouble.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NoActiveQuote | Self::InvalidQuantity { .. } | Self::InsufficientFunds { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub cash: f64,
    pub position: Position,
    /// Most recent first, at most `ORDER_HISTORY_LIMIT` entries.
    pub orders: Vec<Order>,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            cash: INITIAL_CASH,
            position: Position::flat(),
            orders: Vec::new(),
        }
    }
}

struct EncodedSnapshot {
    orders: String,
    position: String,
    cash: String,
}

impl EncodedSnapshot {
    fn encode(snapshot: &LedgerSnapshot) -> Result<Self, serde_json::Error> {
        Ok(Self {
            orders: serde_json::to_string(&snapshot.orders)?,
            position: serde_json::to_string(&snapshot.position)?,
            cash: serde_json::to_string(&snapshot.cash)?,
        })
    }

    fn entries(&self) -> [(&'static str, &str); 3] {
        [
            (ORDERS_KEY, self.orders.as_str()),
            (POSITION_KEY, self.position.as_str()),
            (CASH_KEY, self.cash.as_str()),
        ]
    }
}

/// Paper-trading book: cash, one net position, and recent orders.
///
/// The only way to obtain a `Ledger` is [`Ledger::hydrate`], so no order can
/// be placed before persisted state has been restored.
pub struct Ledger {
    store: Box<dyn KeyValueStore>,
    state: LedgerSnapshot,
    last_order_id: Option<OrderId>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("state", &self.state)
            .field("last_order_id", &self.last_order_id)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Restores each persisted key independently. Anything missing,
    /// unreadable or out of range falls back to its default.
    pub fn hydrate(store: Box<dyn KeyValueStore>) -> Self {
        let defaults = LedgerSnapshot::default();

        let mut orders = restore(
            store.as_ref(),
            ORDERS_KEY,
            defaults.orders,
            |orders: &Vec<Order>| orders.iter().all(order_is_valid),
        );
        orders.truncate(ORDER_HISTORY_LIMIT);

        let mut position = restore(
            store.as_ref(),
            POSITION_KEY,
            defaults.position,
            Position::is_valid,
        );
        if position.is_flat() {
            position = Position::flat();
        }

        let cash = restore(store.as_ref(), CASH_KEY, defaults.cash, |cash: &f64| {
            cash.is_finite() && *cash >= 0.0
        });

        let last_order_id = orders.iter().map(|order| order.id).max();
        info!(
            cash,
            position_qty = position.quantity,
            orders = orders.len(),
            "ledger hydrated"
        );

        Self {
            store,
            state: LedgerSnapshot {
                cash,
                position,
                orders,
            },
            last_order_id,
        }
    }

    pub fn cash(&self) -> f64 {
        self.state.cash
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn orders(&self) -> &[Order] {
        &self.state.orders
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.clone()
    }

    pub fn valuation(&self, quote: Option<&Quote>) -> Valuation {
        Valuation::compute(
            self.state.cash,
            self.state.position,
            quote.map(Quote::price),
        )
    }

    pub fn place_order(
        &mut self,
        side: OrderSide,
        quantity: f64,
        quote: Option<&Quote>,
    ) -> Result<Order, LedgerError> {
        self.place_order_at(side, quantity, quote, OffsetDateTime::now_utc())
    }

    /// Validates, persists, then commits. A failed persist leaves the
    /// in-memory ledger untouched.
    pub fn place_order_at(
        &mut self,
        side: OrderSide,
        quantity: f64,
        quote: Option<&Quote>,
        at: OffsetDateTime,
    ) -> Result<Order, LedgerError> {
        let quote = quote.ok_or(LedgerError::NoActiveQuote)?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(LedgerError::InvalidQuantity { quantity });
        }

        let price = quote.price();
        let notional = quantity * price;
        let current = &self.state;
        if side == OrderSide::Buy && notional > current.cash {
            return Err(LedgerError::InsufficientFunds {
                required: notional,
                available: current.cash,
            });
        }

        let (position, cash) = match side {
            OrderSide::Buy => (
                current.position.after_buy(quantity, price),
                current.cash - notional,
            ),
            OrderSide::Sell => {
                if quantity > current.position.quantity {
                    warn!(
                        symbol = quote.symbol(),
                        requested = quantity,
                        held = current.position.quantity,
                        "sell exceeds held quantity; position clamps to zero"
                    );
                }
                (
                    current.position.after_sell(quantity),
                    current.cash + notional,
                )
            }
        };

        let order = Order {
            id: OrderId::next_after(self.last_order_id, at),
            side,
            quantity,
            price,
            symbol: quote.symbol().to_owned(),
            timestamp: at,
        };

        let mut orders = Vec::with_capacity(ORDER_HISTORY_LIMIT);
        orders.push(order.clone());
        orders.extend(
            current
                .orders
                .iter()
                .take(ORDER_HISTORY_LIMIT - 1)
                .cloned(),
        );

        let next = LedgerSnapshot {
            cash,
            position,
            orders,
        };
        self.persist(&next)?;

        self.state = next;
        self.last_order_id = Some(order.id);
        info!(
            id = %order.id,
            side = %order.side,
            symbol = %order.symbol,
            quantity,
            price,
            cash = self.state.cash,
            position_qty = self.state.position.quantity,
            "order placed"
        );

        Ok(order)
    }

    fn persist(&self, next: &LedgerSnapshot) -> Result<(), LedgerError> {
        let encoded = EncodedSnapshot::encode(next)?;
        let previous = EncodedSnapshot::encode(&self.state)?;

        for (written, (key, value)) in encoded.entries().into_iter().enumerate() {
            if let Err(err) = self.store.set(key, value) {
                self.roll_back(&previous, written);
                return Err(err.into());
            }
        }

        Ok(())
    }

    /// Best effort: rewrites the keys that already took the new value.
    fn roll_back(&self, previous: &EncodedSnapshot, written: usize) {
        for (key, value) in previous.entries().into_iter().take(written) {
            if let Err(err) = self.store.set(key, value) {
                warn!(key, error = %err, "failed to roll back ledger key");
            }
        }
    }
}

fn order_is_valid(order: &Order) -> bool {
    order.quantity.is_finite()
        && order.quantity > 0.0
        && order.price.is_finite()
        && order.price > 0.0
}

fn restore<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    default: T,
    is_valid: impl Fn(&T) -> bool,
) -> T {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(err) => {
            warn!(key, error = %err, "could not read persisted ledger key; using default");
            return default;
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) if is_valid(&value) => value,
        Ok(_) => {
            warn!(key, "persisted ledger key out of range; using default");
            default
        }
        Err(err) => {
            warn!(key, error = %err, "malformed persisted ledger key; using default");
            default
        }
    }
}
