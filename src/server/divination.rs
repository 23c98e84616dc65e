//! Prediction policy: Gemini when configured, the local pool otherwise

use std::sync::Mutex;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::config::ServerSettings;
use super::gemini::{GeminiClient, OracleError};
use crate::api::PredictionSourceKind;
use crate::oracle::ORACLE_FALLBACKS;

/// A prediction and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divination {
    pub text: String,
    pub source: PredictionSourceKind,
}

pub struct Oracle {
    gemini: Option<GeminiClient>,
    rng: Mutex<Pcg32>,
    fallback_on_upstream_error: bool,
}

impl Oracle {
    pub fn new(gemini: Option<GeminiClient>, seed: u64) -> Self {
        Self {
            gemini,
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
            fallback_on_upstream_error: true,
        }
    }

    pub fn with_fallback_on_upstream_error(mut self, fallback: bool) -> Self {
        self.fallback_on_upstream_error = fallback;
        self
    }

    /// Build from settings; no key means pool-only
    pub fn from_settings(settings: &ServerSettings, seed: u64) -> Result<Self, OracleError> {
        let gemini = match &settings.gemini_api_key {
            Some(key) => Some(GeminiClient::new(
                key,
                &settings.gemini_model,
                &settings.gemini_base_url,
            )?),
            None => None,
        };
        Ok(Self::new(gemini, seed)
            .with_fallback_on_upstream_error(settings.fallback_on_upstream_error))
    }

    pub fn gemini_configured(&self) -> bool {
        self.gemini.is_some()
    }

    /// Seeded pick from the mystical pool
    pub fn fallback(&self) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ORACLE_FALLBACKS.pick(&mut *rng)
    }

    fn from_pool(&self) -> Divination {
        Divination {
            text: self.fallback().to_string(),
            source: PredictionSourceKind::Fallback,
        }
    }

    /// Produce one prediction.
    ///
    /// Errors only when Gemini fails and upstream fallback is disabled.
    pub async fn divine(&self, question: Option<&str>) -> Result<Divination, OracleError> {
        let Some(gemini) = &self.gemini else {
            log::debug!("GEMINI_API_KEY not set, answering from the local pool");
            return Ok(self.from_pool());
        };

        match gemini.generate(question).await {
            Ok(text) => Ok(Divination {
                text,
                source: PredictionSourceKind::Gemini,
            }),
            Err(e) if self.fallback_on_upstream_error => {
                log::warn!("Gemini failed, answering from the local pool: {}", e);
                Ok(self.from_pool())
            }
            Err(e) => {
                log::error!("Gemini failed: {}", e);
                Err(e)
            }
        }
    }
}
