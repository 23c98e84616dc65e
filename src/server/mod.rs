//! Prediction server
//!
//! Routes:
//! - `POST /api/magic-8-ball/prediction`: one prediction, optional question
//! - `GET /api/health`: liveness and whether Gemini is configured
//!
//! Anything else falls through to the static front-end when a directory is
//! configured.

mod config;
mod divination;
mod gemini;

pub use config::{ServerSettings, load_settings};
pub use divination::{Divination, Oracle};
pub use gemini::{GeminiClient, OracleError, build_prompt};

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::api::{
    HEALTH_PATH, HealthResponse, PREDICTION_PATH, PredictionFailure, PredictionResponse,
};

/// Prediction carried in the 500 body so clients still have something to show
pub const CLOUDED_PREDICTION: &str =
    "The mystical energies are clouded... Ask again when the cosmic forces align.";

pub struct AppState {
    pub oracle: Oracle,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(oracle: Oracle) -> Self {
        Self {
            oracle,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }
}

/// Only the question matters; every other field is ignored
#[derive(Debug, Default, Deserialize)]
struct PredictionQuery {
    #[serde(default)]
    question: Option<String>,
}

impl PredictionQuery {
    /// Missing or unparsable bodies count as no question
    fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    fn question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route(PREDICTION_PATH, post(predict))
        .route(HEALTH_PATH, get(health));

    let router = match &state.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.with_state(state)
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, (StatusCode, Json<PredictionFailure>)> {
    let query = PredictionQuery::from_body(&body);
    log::info!(
        "Prediction requested (question: {})",
        if query.question().is_some() { "yes" } else { "no" }
    );

    match state.oracle.divine(query.question()).await {
        Ok(divination) => Ok(Json(PredictionResponse {
            prediction: divination.text,
            timestamp: now_rfc3339(),
            source: divination.source,
        })),
        Err(e) => {
            log::error!("Prediction generation error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PredictionFailure {
                    error: "Failed to generate prediction".to_string(),
                    prediction: CLOUDED_PREDICTION.to_string(),
                }),
            ))
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now_rfc3339(),
        gemini_configured: state.oracle.gemini_configured(),
    })
}
