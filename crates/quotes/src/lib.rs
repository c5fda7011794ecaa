pub mod board;
pub mod client;
pub mod poller;
pub mod types;

pub use board::QuoteBoard;
pub use client::{PredictionClient, QuoteError, QuoteSource};
pub use poller::{PollerHandle, QuotePoller, DEFAULT_POLL_INTERVAL};
pub use types::{PricePoint, RawPrediction, Recommendation, SentimentBreakdown, StockAnalysis};

pub fn module_ready() -> bool {
    true
}
