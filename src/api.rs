//! Wire types for the prediction endpoint
//!
//! Shared by the HTTP client and the axum server so both sides agree on the
//! camelCase JSON shapes.

use serde::{Deserialize, Serialize};

/// Path of the prediction route
pub const PREDICTION_PATH: &str = "/api/magic-8-ball/prediction";
/// Path of the health route
pub const HEALTH_PATH: &str = "/api/health";

/// Body of `POST /api/magic-8-ball/prediction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    /// Client clock in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Per-call session identifier
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// Where a prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSourceKind {
    Gemini,
    Fallback,
}

/// Successful prediction body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: String,
    /// RFC 3339 server time
    pub timestamp: String,
    pub source: PredictionSourceKind,
}

/// Body sent alongside HTTP 500; still carries a displayable prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub error: String,
    pub prediction: String,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub gemini_configured: bool,
}
