//! LibreTranslate backend
//!
//! LibreTranslate is self-hostable, so this is the one backend whose
//! endpoint comes from settings (`backend_endpoint_url`). Public instances
//! may require an API key; private ones usually do not.

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::translator::{Translation, Translator, check_length, validate_locale};
use crate::backend::{BackendKind, Capabilities};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Instance used when no endpoint is configured
pub const DEFAULT_INSTANCE: &str = "https://libretranslate.com";

#[derive(Debug, Deserialize)]
struct DetectCandidate {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Clone)]
pub struct LibreTranslateBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateBackend {
    /// Create a backend for the given instance
    ///
    /// `endpoint` may omit the scheme (`translate.example.org`) and may carry
    /// a trailing slash; both are normalized. `None` selects the public
    /// instance.
    pub fn new(endpoint: Option<&str>, api_key: Option<String>) -> BackendResult<Self> {
        let base_url = format_instance_url(endpoint.unwrap_or(DEFAULT_INSTANCE))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        mut body: serde_json::Value,
    ) -> BackendResult<T> {
        if let Some(key) = &self.api_key {
            body["api_key"] = json!(key);
        }

        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            // Instances report failures as {"error": "..."}
            let message = body["error"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse {} response: {}", path, e))
        })
    }
}

impl std::fmt::Debug for LibreTranslateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreTranslateBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Turn a user-entered instance address into a base URL without trailing slash
pub fn format_instance_url(endpoint: &str) -> BackendResult<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(BackendError::Config("Endpoint URL cannot be empty".to_string()));
    }

    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let url = reqwest::Url::parse(&with_scheme)
        .map_err(|e| BackendError::Config(format!("Invalid endpoint URL '{}': {}", endpoint, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(BackendError::Config(format!(
            "Unsupported endpoint scheme: {}",
            url.scheme()
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn rank_candidates(mut candidates: Vec<DetectCandidate>) -> BackendResult<Vec<String>> {
    if candidates.is_empty() {
        return Err(BackendError::InvalidResponse(
            "No language detected".to_string(),
        ));
    }
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(candidates.into_iter().map(|c| c.language).collect())
}

#[async_trait]
impl Translator for LibreTranslateBackend {
    async fn detect(&self, text: &str) -> BackendResult<Vec<String>> {
        check_length(text)?;
        let candidates: Vec<DetectCandidate> = self.post("detect", json!({ "q": text })).await?;
        rank_candidates(candidates)
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
            "q": text,
            "source": source,
            "target": target,
            "format": "text"
        });
        let response: TranslateResponse = self.post("translate", body).await?;
        Ok(Translation::new(response.translated_text))
    }

    fn provider_name(&self) -> &str {
        BackendKind::Libre.pretty_name()
    }

    fn capabilities(&self) -> Capabilities {
        BackendKind::Libre.capabilities()
    }
}
