//! Prediction sources
//!
//! The store talks to a [`PredictionSource`]; the front-ends inject
//! [`HttpPredictionSource`], tests inject scripted sources.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::api::{PREDICTION_PATH, PredictionRequest};

/// Why a prediction could not be obtained
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request never completed (DNS, connection, CORS, ...)
    #[error("transport failure: {0}")]
    Transport(String),
    /// Endpoint answered with a non-success status
    #[error("prediction endpoint returned HTTP {0}")]
    Status(u16),
    /// Success body was unparsable or had no usable prediction
    #[error("malformed prediction body: {0}")]
    Malformed(String),
}

/// Anything that can answer a prediction request.
///
/// Futures are not `Send`: the store lives on a single UI thread.
#[async_trait(?Send)]
pub trait PredictionSource {
    async fn predict(&self, request: &PredictionRequest) -> Result<String, FetchError>;
}

/// Lenient view of a success body; only `prediction` matters to the client
#[derive(Debug, Deserialize)]
struct PredictionBody {
    prediction: Option<String>,
}

/// Extract the prediction text from a raw success body
pub fn parse_prediction_body(body: &str) -> Result<String, FetchError> {
    let parsed: PredictionBody =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    match parsed.prediction {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(FetchError::Malformed("empty prediction".to_string())),
        None => Err(FetchError::Malformed("missing prediction".to_string())),
    }
}

/// Talks to the prediction endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpPredictionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPredictionSource {
    /// `base` is the server origin, e.g. `http://127.0.0.1:5000`
    pub fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}{}", base.trim_end_matches('/'), PREDICTION_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl PredictionSource for HttpPredictionSource {
    async fn predict(&self, request: &PredictionRequest) -> Result<String, FetchError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        parse_prediction_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prediction_body_ok() {
        let text = parse_prediction_body(
            r#"{"prediction":"Signs point to yes","timestamp":"t","source":"fallback"}"#,
        )
        .unwrap();
        assert_eq!(text, "Signs point to yes");
    }

    #[test]
    fn test_parse_prediction_body_rejects_missing_and_empty() {
        assert!(matches!(
            parse_prediction_body(r#"{"timestamp":"t"}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_prediction_body(r#"{"prediction":"   "}"#),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_prediction_body("<html>"),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let source = HttpPredictionSource::new("http://localhost:5000/");
        assert_eq!(
            source.url(),
            "http://localhost:5000/api/magic-8-ball/prediction"
        );
    }
}
