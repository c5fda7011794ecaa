mod config;
mod logging;
mod wiring;

use std::error::Error;

use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init_logging();

    let config = config::Config::from_env()?;
    let state = wiring::build_state(&config)?;
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "dashboard listening");

    axum::serve(listener, wiring::build_app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.stop_polling().await;
    info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
