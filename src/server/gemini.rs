//! Google Gemini client for oracle predictions

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Upstream request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROMPT_PREAMBLE: &str = "\
You are a mystical Magic 8-Ball oracle with ancient wisdom and a touch of modern personality.
Generate a unique, creative fortune response that feels both magical and personally relevant.
The response should be:
- Between 10-30 words
- Mysterious yet helpful
- Written in a mystical, oracle-like tone
- Avoid generic yes/no answers
- Make it feel personally meaningful
- Include a touch of cosmic wisdom

Examples of the style:
\"The stars whisper of new opportunities dancing on tomorrow's horizon...\"
\"Your inner strength shall illuminate paths yet unseen by mortal eyes...\"
\"The universe conspires to align favorable winds with your deepest desires...\"
";

const PROMPT_CLOSING: &str = "Generate a completely unique response now:";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingKey,
    #[error("Gemini request failed: {0}")]
    Transport(String),
    #[error("Gemini API error: HTTP {status}")]
    Upstream { status: u16 },
    #[error("Gemini returned no usable candidate")]
    EmptyCandidate,
}

/// Build the oracle prompt, weaving in the seeker's question when present
pub fn build_prompt(question: Option<&str>) -> String {
    let mut prompt = String::from(PROMPT_PREAMBLE);
    if let Some(q) = question.map(str::trim).filter(|q| !q.is_empty()) {
        prompt.push_str(&format!(
            "\nThe seeker asks: \"{q}\"\nLet your answer speak to this question.\n"
        ));
    }
    prompt.push('\n');
    prompt.push_str(PROMPT_CLOSING);
    prompt
}

/// Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self, OracleError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(OracleError::MissingKey);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
        })
    }

    /// Endpoint without the key
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask Gemini for one prediction
    pub async fn generate(&self, question: Option<&str>) -> Result<String, OracleError> {
        let request = GeminiRequest::for_prompt(build_prompt(question));

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Transport(format!("Request timeout: {}", e.without_url()))
                } else {
                    // Strip the URL so the key never reaches the logs
                    OracleError::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Upstream {
                status: status.as_u16(),
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| {
                OracleError::Transport(format!("Failed to parse response: {}", e.without_url()))
            })?;

        body.first_text()
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

impl GeminiRequest {
    fn for_prompt(prompt: String) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.9,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 100,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| GeminiSafetySetting {
                    category: category.to_string(),
                    threshold: SAFETY_THRESHOLD.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: i32,
    top_p: f32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    /// Absent when the candidate was blocked by safety filters
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    /// Trimmed text of the first part of the first candidate
    fn first_text(self) -> Result<String, OracleError> {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            Err(OracleError::EmptyCandidate)
        } else {
            Ok(text)
        }
    }
}
