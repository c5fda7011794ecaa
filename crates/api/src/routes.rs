use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger::{LedgerError, OrderSide};
use quotes::QuoteError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{state::AppState, ws};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/styles.css", get(styles))
        .route("/static/app.js", get(app_js))
        .route("/analysis", post(load_analysis))
        .route("/quote", get(current_quote))
        .route("/orders", get(list_orders).post(place_order))
        .route("/portfolio", get(portfolio))
        .route("/ws/events", get(ws::events_socket))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error,
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::NoActiveQuote => StatusCode::CONFLICT,
            LedgerError::InvalidQuantity { .. } | LedgerError::InsufficientFunds { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LedgerError::Encode(_) | LedgerError::Storage(_) => {
                warn!(error = %err, "order could not be persisted");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        warn!(error = %err, "analysis failed");
        let message = match &err {
            QuoteError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self::new(StatusCode::BAD_GATEWAY, "analysis_failed", message)
    }
}

async fn index() -> Html<&'static str> {
    Html(ui::index_html())
}

async fn styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], ui::styles_css())
}

async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], ui::app_js())
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    company: String,
}

async fn load_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let company = request.company.trim();
    if company.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_company",
            "company name must not be empty",
        ));
    }

    let analysis = state.load_analysis(company).await?;
    Ok(Json(analysis))
}

async fn current_quote(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.board().current().map(Json).ok_or_else(|| {
        ApiError::new(StatusCode::NOT_FOUND, "no_active_quote", "no company loaded")
    })
}

#[derive(Debug, Deserialize)]
struct PlaceOrderRequest {
    side: OrderSide,
    quantity: f64,
}

async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.place_order(request.side, request.quantity).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orders().await)
}

async fn portfolio(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.portfolio().await)
}
