//! User preferences
//!
//! Persisted in LocalStorage on the web; native front-ends read the
//! endpoint from the environment instead.

use serde::{Deserialize, Serialize};

/// Environment variable naming the prediction server origin
pub const ENDPOINT_ENV: &str = "ORACLE_BALL_ENDPOINT";

/// Front-end settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Silence shake and reveal cues
    pub muted: bool,
    /// Minimize bobbing and shake jitter
    pub reduced_motion: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Prediction server origin; empty means the page's own origin
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            reduced_motion: false,
            master_volume: 0.8,
            endpoint: String::new(),
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "oracle_ball_settings";

    /// Volume after applying mute
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }

    /// Endpoint to use, falling back to `origin` when none is configured
    pub fn endpoint_or<'a>(&'a self, origin: &'a str) -> &'a str {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() { origin } else { endpoint }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Defaults plus the endpoint from the environment
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let mut settings = Self::default();
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            settings.endpoint = endpoint;
        }
        settings
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // Nothing to persist natively
    }
}
