use std::sync::Arc;

use api::AppState;
use axum::{routing::get, Router};
use ledger::{FileStore, Ledger, StoreError};
use quotes::{PredictionClient, QuoteError};
use thiserror::Error;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not open ledger store: {0}")]
    Store(#[from] StoreError),
    #[error("could not build prediction client: {0}")]
    Client(#[from] QuoteError),
}

/// Hydrates the ledger before anything can reach it.
pub fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let store = FileStore::open(&config.store_dir)?;
    info!(dir = %store.root().display(), "opening ledger store");
    let ledger = Ledger::hydrate(Box::new(store));

    let client = PredictionClient::new(&config.api_url, config.http_timeout)?;
    info!(url = %client.predict_url(), "prediction service configured");

    Ok(AppState::new(ledger, Arc::new(client), config.poll_interval))
}

pub fn build_app(state: AppState) -> Router {
    debug_assert!(ledger::module_ready());
    debug_assert!(quotes::module_ready());
    debug_assert!(api::module_ready());
    debug_assert!(ui::module_ready());

    api::app(state).route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
