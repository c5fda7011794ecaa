use std::{fmt, sync::Arc, time::Duration};

use ledger::{Ledger, LedgerError, Order, OrderSide, Position, Quote, Valuation};
use quotes::{PollerHandle, QuoteBoard, QuoteError, QuotePoller, QuoteSource, StockAnalysis};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DashboardEvent {
    Connected {
        symbol: Option<String>,
    },
    QuoteUpdated {
        symbol: String,
        price: Option<f64>,
    },
    OrderPlaced {
        order: Order,
    },
    OrderRejected {
        side: OrderSide,
        quantity: f64,
        code: &'static str,
        reason: String,
    },
}

impl DashboardEvent {
    pub fn connected(symbol: Option<String>) -> Self {
        Self::Connected { symbol }
    }

    pub fn quote_updated(analysis: &StockAnalysis) -> Self {
        Self::QuoteUpdated {
            symbol: analysis.symbol.clone(),
            price: analysis.price,
        }
    }

    pub fn order_placed(order: Order) -> Self {
        Self::OrderPlaced { order }
    }

    pub fn order_rejected(side: OrderSide, quantity: f64, err: &LedgerError) -> Self {
        Self::OrderRejected {
            side,
            quantity,
            code: err.code(),
            reason: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct PortfolioView {
    pub cash: f64,
    pub position: Position,
    pub quote: Option<Quote>,
    pub valuation: Valuation,
    pub holdings_pct: u32,
}

/// Shared handles behind every route. Ledger writes go through one mutex.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Mutex<Ledger>>,
    board: QuoteBoard,
    source: Arc<dyn QuoteSource>,
    poller: Arc<Mutex<Option<PollerHandle>>>,
    poll_interval: Duration,
    events_tx: broadcast::Sender<DashboardEvent>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("board", &self.board)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(ledger: Ledger, source: Arc<dyn QuoteSource>, poll_interval: Duration) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            board: QuoteBoard::new(),
            source,
            poller: Arc::new(Mutex::new(None)),
            poll_interval,
            events_tx,
        }
    }

    pub fn board(&self) -> &QuoteBoard {
        &self.board
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events_tx.subscribe()
    }

    pub fn publish_event(
        &self,
        event: DashboardEvent,
    ) -> Result<usize, broadcast::error::SendError<DashboardEvent>> {
        self.events_tx.send(event)
    }

    /// Foreground search: the previous quote disappears until the new one
    /// arrives, and polling follows the new company.
    pub async fn load_analysis(&self, company: &str) -> Result<StockAnalysis, QuoteError> {
        let mut poller = self.poller.lock().await;
        if let Some(previous) = poller.take() {
            previous.shutdown().await;
        }
        self.board.clear();

        let analysis = self.source.analyze(company).await?;
        self.board.publish(analysis.clone());
        *poller = Some(QuotePoller::spawn(
            Arc::clone(&self.source),
            company,
            self.board.clone(),
            self.poll_interval,
        ));

        info!(company, symbol = %analysis.symbol, "tracking company");
        Ok(analysis)
    }

    pub async fn stop_polling(&self) {
        if let Some(handle) = self.poller.lock().await.take() {
            handle.shutdown().await;
        }
    }

    /// Trades at whatever quote is on the board when the request arrives.
    /// Storage faults are not broadcast as rejections; the caller reports them.
    pub async fn place_order(&self, side: OrderSide, quantity: f64) -> Result<Order, LedgerError> {
        let quote = self.board.current_quote();
        let result = self
            .ledger
            .lock()
            .await
            .place_order(side, quantity, quote.as_ref());

        let event = match &result {
            Ok(order) => Some(DashboardEvent::order_placed(order.clone())),
            Err(err) if err.is_rejection() => {
                Some(DashboardEvent::order_rejected(side, quantity, err))
            }
            Err(_) => None,
        };
        if let Some(event) = event {
            let _ = self.publish_event(event);
        }

        result
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.ledger.lock().await.orders().to_vec()
    }

    pub async fn portfolio(&self) -> PortfolioView {
        let quote = self.board.current_quote();
        let ledger = self.ledger.lock().await;
        let valuation = ledger.valuation(quote.as_ref());

        PortfolioView {
            cash: ledger.cash(),
            position: ledger.position(),
            quote,
            holdings_pct: valuation.holdings_pct(),
            valuation,
        }
    }
}
