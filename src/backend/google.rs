//! Google Translate API backend
//!
//! Talks to the Google Translate API v2 `detect` and translate endpoints.
//!
//! # Authentication
//!
//! The API key comes from the settings file or from the
//! `GOOGLE_TRANSLATE_API_KEY` environment variable. Obtain a key from:
//! https://console.cloud.google.com/
//!
//! The key travels in the `X-Goog-Api-Key` header, never in the URL, so it
//! cannot end up in error messages or logs.
//!
//! # Example
//!
//! ```ignore
//! use dialect_live::backend::{Translator, GoogleTranslateBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = GoogleTranslateBackend::from_env()?;
//!     let result = backend.translate("Hello, world!", "en", "fr").await?;
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::translator::{Translation, Translator, check_length, validate_locale};
use crate::backend::{BackendKind, Capabilities};
use async_trait::async_trait;
use serde_json::json;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// Google Translate API v2 backend
#[derive(Clone)]
pub struct GoogleTranslateBackend {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL for Google Translate API
    base_url: String,
}

impl GoogleTranslateBackend {
    const BASE_URL: &'static str = "https://translation.googleapis.com/language/translate/v2";

    /// Create a new backend with an explicit API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New backend instance
    /// * `Err(BackendError)` - If the key is blank or the HTTP client cannot be built
    pub fn new(api_key: String) -> BackendResult<Self> {
        if api_key.trim().is_empty() {
            return Err(BackendError::Config("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: Self::BASE_URL.to_string(),
        })
    }

    /// Create a backend from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    pub fn from_env() -> BackendResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            BackendError::Config(format!("{} environment variable not set", API_KEY_ENV))
        })?;

        Self::new(api_key)
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// POST `body` to `url` and return the parsed JSON response
    async fn post(&self, url: &str, body: serde_json::Value) -> BackendResult<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse API response: {}", e))
        })
    }
}

impl std::fmt::Debug for GoogleTranslateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateBackend")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Pull the candidate list out of a `detect` response
///
/// The API nests detections one level deeper than needed:
/// `{"data": {"detections": [[{"language": "en", "confidence": 0.98}]]}}`
fn parse_detections(json: &serde_json::Value) -> BackendResult<Vec<String>> {
    let detections = json["data"]["detections"]
        .as_array()
        .and_then(|outer| outer.first())
        .and_then(|inner| inner.as_array())
        .ok_or_else(|| {
            BackendError::InvalidResponse(
                "Invalid API response: missing 'data.detections' array".to_string(),
            )
        })?;

    let languages: Vec<String> = detections
        .iter()
        .filter_map(|d| d["language"].as_str())
        .map(str::to_string)
        .collect();

    if languages.is_empty() {
        return Err(BackendError::InvalidResponse(
            "No language detected".to_string(),
        ));
    }
    Ok(languages)
}

fn parse_translation(json: &serde_json::Value) -> BackendResult<String> {
    json["data"]["translations"]
        .as_array()
        .and_then(|translations| translations.first())
        .and_then(|t| t["translatedText"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            BackendError::InvalidResponse(
                "Invalid API response: missing 'translatedText' field".to_string(),
            )
        })
}

#[async_trait]
impl Translator for GoogleTranslateBackend {
    async fn detect(&self, text: &str) -> BackendResult<Vec<String>> {
        check_length(text)?;

        let url = format!("{}/detect", self.base_url);
        let json = self.post(&url, json!({ "q": text })).await?;
        parse_detections(&json)
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> BackendResult<Translation> {
        validate_locale(source)?;
        validate_locale(target)?;

        if text.is_empty() {
            return Ok(Translation::default());
        }
        check_length(text)?;

        let body = json!({
            "q": [text],
            "source": source,
            "target": target,
            "format": "text"
        });
        let json = self.post(&self.base_url, body).await?;
        parse_translation(&json).map(Translation::new)
    }

    fn provider_name(&self) -> &str {
        BackendKind::Google.pretty_name()
    }

    fn capabilities(&self) -> Capabilities {
        BackendKind::Google.capabilities()
    }
}
