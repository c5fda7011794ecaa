use ledger::Quote;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictRequest<'a> {
    pub company: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    #[default]
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String,
    pub price: f64,
}

/// Whole-percent split of headline sentiment scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

impl SentimentBreakdown {
    /// Labels other than `positive` and `negative` count as neutral.
    pub fn from_scores(scores: &[(String, f64)]) -> Self {
        let mut positive = 0.0;
        let mut neutral = 0.0;
        let mut negative = 0.0;

        for (label, score) in scores {
            if !score.is_finite() {
                continue;
            }
            match label.to_ascii_lowercase().as_str() {
                "positive" => positive += score,
                "negative" => negative += score,
                _ => neutral += score,
            }
        }

        let total = positive + neutral + negative;
        let to_pct = |value: f64| -> u32 {
            if total == 0.0 {
                0
            } else {
                (value / total * 100.0).round().clamp(0.0, 100.0) as u32
            }
        };

        Self {
            positive: to_pct(positive),
            neutral: to_pct(neutral),
            negative: to_pct(negative),
        }
    }
}

/// Body of a `/predict` response as the service sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPrediction {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub headlines: Vec<String>,
    #[serde(default)]
    pub sentiments: Vec<(String, f64)>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub recommendation: Recommendation,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<PricePoint>>,
    #[serde(default)]
    pub prediction: Option<Vec<PricePoint>>,
}

impl RawPrediction {
    /// Returns the service's error message when the body reports one.
    pub fn normalize(self) -> Result<StockAnalysis, String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.symbol.trim().is_empty() {
            return Err("response carried no symbol".to_owned());
        }

        Ok(StockAnalysis {
            sentiments: SentimentBreakdown::from_scores(&self.sentiments),
            symbol: self.symbol,
            name: self.company,
            price: self.price.filter(|px| px.is_finite()),
            recommendation: self.recommendation,
            headlines: self.headlines,
            history: self.history.unwrap_or_default(),
            prediction: self.prediction.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAnalysis {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub recommendation: Recommendation,
    pub sentiments: SentimentBreakdown,
    pub headlines: Vec<String>,
    pub history: Vec<PricePoint>,
    pub prediction: Vec<PricePoint>,
}

impl StockAnalysis {
    /// Tradable quote, if the service returned a usable price.
    pub fn quote(&self) -> Option<Quote> {
        self.price.and_then(|px| Quote::new(self.symbol.as_str(), px))
    }
}
