//! # Sales Front
//!
//! Terminal client that asks the prediction service for one product at a
//! time and renders a one-line summary per product.

use reqwest::StatusCode;
use sales_forecast::{PredictionRequest, PredictionResponse};
use thiserror::Error;
use tracing::{debug, warn};

/// Stores offered by the client
pub const STORE_OPTIONS: [&str; 2] = [
    "1354820366865ba193741390bba9d17b",
    "c8c368f0311ea25b581cb3c704fe3a70",
];

/// Default address of the prediction service
pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Errors from reading user input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown store '{0}', pick 1-{n} or a listed id", n = STORE_OPTIONS.len())]
    UnknownStore(String),

    #[error("Horizon must be a positive integer, got '{0}'")]
    InvalidHorizon(String),

    #[error("Date must be YYYY-MM-DD, got '{0}'")]
    InvalidDate(String),
}

/// Resolve a store from its 1-based position in [`STORE_OPTIONS`] or its id
pub fn resolve_store(input: &str) -> Result<&'static str, InputError> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>() {
        if let Some(store) = index.checked_sub(1).and_then(|i| STORE_OPTIONS.get(i).copied()) {
            return Ok(store);
        }
    }
    STORE_OPTIONS
        .into_iter()
        .find(|store| *store == input)
        .ok_or_else(|| InputError::UnknownStore(input.to_string()))
}

pub fn parse_horizon(input: &str) -> Result<i64, InputError> {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|h| *h >= 1)
        .ok_or_else(|| InputError::InvalidHorizon(input.trim().to_string()))
}

/// Normalize a date to `YYYY-MM-DD`
pub fn parse_date(input: &str) -> Result<String, InputError> {
    sales_forecast::data::parse_date(input)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| InputError::InvalidDate(input.trim().to_string()))
}

/// Trimmed, non-empty sale ids of a comma-separated list
pub fn parse_sale_ids(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of one prediction request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The service answered with rows; `total` is their summed amount
    Predicted { name: String, total: f64 },
    /// The service answered without rows for the store
    Unavailable { name: String },
    /// The service does not know the product
    UnknownProduct,
    /// Any other failure
    Failed,
}

impl From<PredictionResponse> for Outcome {
    fn from(response: PredictionResponse) -> Self {
        let name = response.sale_name().to_string();
        if response.records().is_empty() {
            Outcome::Unavailable { name }
        } else {
            Outcome::Predicted {
                total: response.total_amount(),
                name,
            }
        }
    }
}

/// One display line for the outcome of `sale_id`
pub fn render_outcome(sale_id: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Predicted { name, total } => {
            let lo = total.floor() as i64;
            format!("{} : {}-{} units predicted", name, lo, lo + 1)
        }
        Outcome::Unavailable { name } => format!("{} : prediction unavailable for this store", name),
        Outcome::UnknownProduct => format!("{} : unknown product", sale_id),
        Outcome::Failed => format!("{} : Error in prediction", sale_id),
    }
}

/// HTTP client of `POST /predict`
#[derive(Debug, Clone)]
pub struct PredictClient {
    client: reqwest::Client,
    url: String,
}

impl PredictClient {
    pub fn new(server: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url: format!("{}/predict", server.trim_end_matches('/')),
        })
    }

    /// Send one request; failures become [`Outcome::Failed`] or
    /// [`Outcome::UnknownProduct`] and never abort the caller
    pub async fn predict(&self, request: &PredictionRequest) -> Outcome {
        let response = match self.client.post(&self.url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(sale_id = %request.sale_id, error = %e, "request failed");
                return Outcome::Failed;
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<PredictionResponse>().await {
                Ok(body) => {
                    debug!(sale_id = %request.sale_id, rows = body.records().len(), "prediction received");
                    Outcome::from(body)
                }
                Err(e) => {
                    warn!(sale_id = %request.sale_id, error = %e, "unreadable response");
                    Outcome::Failed
                }
            },
            StatusCode::NOT_FOUND => Outcome::UnknownProduct,
            status => {
                let message = response.text().await.unwrap_or_default();
                warn!(sale_id = %request.sale_id, %status, %message, "prediction rejected");
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use sales_forecast::PredictionRecord;

    fn record(amount: f64) -> PredictionRecord {
        PredictionRecord {
            unique_id: "a|s".to_string(),
            sale_date: NaiveDate::from_ymd_opt(2023, 12, 10).unwrap(),
            predicted_amount: amount,
            sale_id: "a".to_string(),
            store_id: "s".to_string(),
            sale_name: Some("Apple".to_string()),
            sub_family_name: None,
            family_name: None,
        }
    }

    #[test]
    fn test_render_predicted() {
        let response = PredictionResponse(vec![record(2.6), record(3.1)], "Apple".to_string());
        let outcome = Outcome::from(response);
        assert_eq!(render_outcome("a", &outcome), "Apple : 5-6 units predicted");
    }

    #[test]
    fn test_render_unavailable() {
        let outcome = Outcome::from(PredictionResponse(vec![], "Apple".to_string()));
        assert_eq!(
            render_outcome("a", &outcome),
            "Apple : prediction unavailable for this store"
        );
    }

    #[test]
    fn test_render_failures_use_own_sale_id() {
        assert_eq!(render_outcome("b", &Outcome::UnknownProduct), "b : unknown product");
        assert_eq!(render_outcome("c", &Outcome::Failed), "c : Error in prediction");
    }

    #[rstest]
    #[case("1", Ok(STORE_OPTIONS[0]))]
    #[case(" 2 ", Ok(STORE_OPTIONS[1]))]
    #[case("c8c368f0311ea25b581cb3c704fe3a70", Ok(STORE_OPTIONS[1]))]
    #[case("3", Err(InputError::UnknownStore("3".to_string())))]
    #[case("0", Err(InputError::UnknownStore("0".to_string())))]
    fn test_resolve_store(#[case] input: &str, #[case] expected: Result<&'static str, InputError>) {
        assert_eq!(resolve_store(input), expected);
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(parse_sale_ids(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_sale_ids(" , ").is_empty());

        assert_eq!(parse_horizon("7"), Ok(7));
        assert!(parse_horizon("0").is_err());
        assert!(parse_horizon("seven").is_err());

        assert_eq!(parse_date(" 2023-12-10 "), Ok("2023-12-10".to_string()));
        assert!(parse_date("10/12/2023").is_err());
    }
}
