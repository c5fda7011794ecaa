use std::sync::Arc;

use ledger::Quote;
use tokio::sync::watch;

use crate::types::StockAnalysis;

/// Latest analysis for the company on screen.
///
/// Writers replace the whole value; readers take a snapshot. Trades read
/// the quote once, at the moment the order arrives.
#[derive(Debug, Clone)]
pub struct QuoteBoard {
    tx: Arc<watch::Sender<Option<StockAnalysis>>>,
}

impl Default for QuoteBoard {
    fn default() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }
}

impl QuoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, analysis: StockAnalysis) {
        self.tx.send_replace(Some(analysis));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<StockAnalysis> {
        self.tx.borrow().clone()
    }

    pub fn current_quote(&self) -> Option<Quote> {
        self.tx.borrow().as_ref().and_then(StockAnalysis::quote)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StockAnalysis>> {
        self.tx.subscribe()
    }
}
