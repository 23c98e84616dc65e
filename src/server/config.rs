use std::path::PathBuf;

/// Google's public generative-language endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    /// `None` when unset or blank
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Directory of the built web front-end, served as the fallback route
    pub static_dir: Option<PathBuf>,
    /// Answer from the local pool when Gemini fails instead of returning 500
    pub fallback_on_upstream_error: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            static_dir: None,
            fallback_on_upstream_error: true,
        }
    }
}

impl ServerSettings {
    /// Apply overrides from `lookup` (an environment) on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_blank("ORACLE_BALL_BIND") {
            settings.bind = v;
        }
        if let Some(v) = non_blank("GEMINI_API_KEY") {
            settings.gemini_api_key = Some(v.trim().to_string());
        }
        if let Some(v) = non_blank("GEMINI_MODEL") {
            settings.gemini_model = v;
        }
        if let Some(v) = non_blank("GEMINI_BASE_URL") {
            settings.gemini_base_url = v;
        }
        if let Some(v) = non_blank("ORACLE_BALL_STATIC_DIR") {
            settings.static_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = non_blank("ORACLE_BALL_STRICT_UPSTREAM") {
            settings.fallback_on_upstream_error = !is_truthy(&v);
        }

        settings
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

pub fn load_settings() -> ServerSettings {
    ServerSettings::from_lookup(|key| std::env::var(key).ok())
}
