use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::types::{PredictRequest, RawPrediction, StockAnalysis};

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("prediction service url {url:?} must be an absolute http(s) url")]
    InvalidBaseUrl { url: String },
    #[error("prediction request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("prediction service rejected {company:?} ({status}): {message}")]
    Rejected {
        company: String,
        status: u16,
        message: String,
    },
    #[error("could not decode prediction response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn a company name into an analysis with a price.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn analyze(&self, company: &str) -> Result<StockAnalysis, QuoteError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the external `/predict` endpoint.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    predict_url: Url,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let invalid = || QuoteError::InvalidBaseUrl {
            url: base_url.to_owned(),
        };
        let predict_url = Url::parse(&format!("{}/predict", base_url.trim_end_matches('/')))
            .map_err(|_| invalid())?;
        if !matches!(predict_url.scheme(), "http" | "https") {
            return Err(invalid());
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, predict_url })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}

#[async_trait]
impl QuoteSource for PredictionClient {
    async fn analyze(&self, company: &str) -> Result<StockAnalysis, QuoteError> {
        let response = self
            .http
            .post(self.predict_url.clone())
            .json(&PredictRequest { company })
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(QuoteError::Rejected {
                company: company.to_owned(),
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let raw: RawPrediction = serde_json::from_slice(&body)?;
        let analysis = raw.normalize().map_err(|message| QuoteError::Rejected {
            company: company.to_owned(),
            status: status.as_u16(),
            message,
        })?;

        info!(company, symbol = %analysis.symbol, price = ?analysis.price, "analysis loaded");
        Ok(analysis)
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match (parsed.detail, parsed.error) {
        (Some(serde_json::Value::String(detail)), _) => Some(detail),
        (Some(detail), _) => Some(detail.to_string()),
        (None, error) => error,
    }
}
