//! Configuration consumed by the broker and the search provider
//!
//! Settings are a plain serde struct. They can be loaded from a JSON file,
//! built from environment variables, or constructed in code. The broker
//! keeps one shared snapshot and swaps it whole on change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::backend::google::API_KEY_ENV;

/// Source language assumed when no last-used one is stored for the backend
pub const DEFAULT_SRC_LANG: &str = "en";
/// Destination language assumed when no last-used one is stored for the backend
pub const DEFAULT_DEST_LANG: &str = "fr";

pub const BACKEND_ENV: &str = "DIALECT_BACKEND";
pub const BACKEND_URL_ENV: &str = "DIALECT_BACKEND_URL";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether the search provider offers live results at all
    pub live_translation: bool,
    /// Backend id, see [`crate::backend::BackendKind`]
    pub backend: String,
    /// Instance URL for backends that accept one
    pub backend_endpoint_url: Option<String>,
    pub api_key: Option<String>,
    /// Last used source language, keyed by backend id
    pub src_langs: HashMap<String, String>,
    /// Last used destination language, keyed by backend id
    pub dest_langs: HashMap<String, String>,
    /// Program started when a result is activated
    pub companion_command: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            live_translation: true,
            backend: "google".to_string(),
            backend_endpoint_url: None,
            api_key: None,
            src_langs: HashMap::new(),
            dest_langs: HashMap::new(),
            companion_command: "dialect".to_string(),
        }
    }
}

/// The part of [`Settings`] that determines which translator instance is used
///
/// Any difference here means the translator must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub backend: String,
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
}

impl Settings {
    /// Load settings from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Defaults overlaid with `DIALECT_BACKEND`, `DIALECT_BACKEND_URL` and
    /// `GOOGLE_TRANSLATE_API_KEY`
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env();
        settings
    }

    pub fn apply_env(&mut self) {
        if let Ok(backend) = std::env::var(BACKEND_ENV) {
            self.backend = backend;
        }
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            self.backend_endpoint_url = Some(url);
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV).ok();
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            backend: self.backend.clone(),
            endpoint_url: self
                .backend_endpoint_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            api_key: self.api_key.clone(),
        }
    }

    /// Last used source language for the active backend
    pub fn src_lang(&self) -> &str {
        self.src_langs
            .get(&self.backend)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SRC_LANG)
    }

    /// Last used destination language for the active backend
    pub fn dest_lang(&self) -> &str {
        self.dest_langs
            .get(&self.backend)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DEST_LANG)
    }

    pub fn with_backend(mut self, backend: &str) -> Self {
        self.backend = backend.to_string();
        self
    }

    /// Store the last used pair for the active backend
    pub fn with_languages(mut self, src: &str, dest: &str) -> Self {
        self.src_langs.insert(self.backend.clone(), src.to_string());
        self.dest_langs.insert(self.backend.clone(), dest.to_string());
        self
    }
}
