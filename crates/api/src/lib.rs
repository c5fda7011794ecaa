pub mod routes;
pub mod state;
mod ws;

use axum::Router;

pub use state::{AppState, DashboardEvent, PortfolioView};

pub fn module_ready() -> bool {
    true
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}
