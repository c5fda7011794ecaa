use std::{sync::Arc, time::Duration};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{board::QuoteBoard, client::QuoteSource};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background refresh of one company's analysis.
///
/// Only ever writes to the [`QuoteBoard`]; the first fetch happens one
/// interval after spawn because the caller has just loaded the analysis.
pub struct QuotePoller;

impl QuotePoller {
    pub fn spawn(
        source: Arc<dyn QuoteSource>,
        company: impl Into<String>,
        board: QuoteBoard,
        every: Duration,
    ) -> PollerHandle {
        let company = company.into();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let task_company = company.clone();

        let task = tokio::spawn(async move {
            let company = task_company;
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    _ = ticker.tick() => {}
                }

                debug!(company = %company, "refreshing quote");
                let result = tokio::select! {
                    _ = &mut cancel_rx => break,
                    result = source.analyze(&company) => result,
                };

                match result {
                    Ok(analysis) => board.publish(analysis),
                    Err(err) => {
                        warn!(company = %company, error = %err, "quote refresh failed; keeping last analysis");
                    }
                }
            }

            debug!(company = %company, "quote poller stopped");
        });

        PollerHandle {
            company,
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }
}

/// Stops the poller on [`PollerHandle::shutdown`] or drop.
#[derive(Debug)]
pub struct PollerHandle {
    company: String,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancels and waits, so nothing from this poller lands on the board
    /// after it returns.
    pub async fn shutdown(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
        time::Duration,
    };

    use async_trait::async_trait;

    use super::QuotePoller;
    use crate::{
        board::QuoteBoard,
        client::{QuoteError, QuoteSource},
        types::{Recommendation, SentimentBreakdown, StockAnalysis},
    };

    struct CountingSource {
        calls: AtomicU32,
        fail_after: Option<u32>,
        delay: Duration,
    }

    impl CountingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_after: None,
                delay: Duration::ZERO,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteSource for CountingSource {
        async fn analyze(&self, company: &str) -> Result<StockAnalysis, QuoteError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(QuoteError::Rejected {
                    company: company.to_owned(),
                    status: 503,
                    message: "upstream down".to_owned(),
                });
            }

            Ok(StockAnalysis {
                symbol: "ACME".to_owned(),
                name: company.to_owned(),
                price: Some(100.0 + f64::from(n)),
                recommendation: Recommendation::Hold,
                sentiments: SentimentBreakdown::default(),
                headlines: Vec::new(),
                history: Vec::new(),
                prediction: Vec::new(),
            })
        }
    }

    const EVERY: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn publishes_on_each_interval() {
        let source = CountingSource::new();
        let board = QuoteBoard::new();
        let mut rx = board.subscribe();
        let _handle = QuotePoller::spawn(source.clone(), "acme", board.clone(), EVERY);

        rx.changed().await.unwrap();
        assert_eq!(board.current_quote().unwrap().price(), 100.0);

        rx.changed().await.unwrap();
        assert_eq!(board.current_quote().unwrap().price(), 101.0);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_one_interval_before_first_fetch() {
        let source = CountingSource::new();
        let _handle = QuotePoller::spawn(source.clone(), "acme", QuoteBoard::new(), EVERY);

        tokio::time::sleep(EVERY - Duration::from_secs(1)).await;

        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_last_analysis() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
            fail_after: Some(1),
            delay: Duration::ZERO,
        });
        let board = QuoteBoard::new();
        let handle = QuotePoller::spawn(source.clone(), "acme", board.clone(), EVERY);

        tokio::time::sleep(EVERY * 3 + Duration::from_secs(1)).await;

        assert_eq!(source.calls(), 3);
        assert_eq!(board.current_quote().unwrap().price(), 100.0);
        assert!(!handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_in_flight_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
            fail_after: None,
            delay: Duration::from_secs(10),
        });
        let board = QuoteBoard::new();
        let handle = QuotePoller::spawn(source.clone(), "acme", board.clone(), EVERY);

        tokio::time::sleep(EVERY + Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 1);
        handle.shutdown().await;
        tokio::time::sleep(EVERY * 4).await;

        assert_eq!(source.calls(), 1);
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_polling() {
        let source = CountingSource::new();
        let handle = QuotePoller::spawn(source.clone(), "acme", QuoteBoard::new(), EVERY);
        assert_eq!(handle.company(), "acme");

        drop(handle);
        tokio::time::sleep(EVERY * 3).await;

        assert_eq!(source.calls(), 0);
    }
}
