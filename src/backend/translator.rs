//! Translator trait and locale utilities
//!
//! This module defines the `Translator` trait every backend implements,
//! so the broker can drive Google Translate, LibreTranslate or the mock
//! without knowing which one it holds.
//!
//! # Example
//!
//! ```ignore
//! use dialect_live::backend::{Translator, GoogleTranslateBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = GoogleTranslateBackend::from_env()?;
//!
//!     let detected = backend.detect("Bonjour tout le monde").await?;
//!     println!("{:?}", detected); // ["fr"]
//!
//!     let result = backend.translate("Bonjour", "fr", "en").await?;
//!     println!("{}", result.text); // "Hello"
//!
//!     Ok(())
//! }
//! ```

use crate::backend::Capabilities;
use crate::backend::error::{BackendError, BackendResult};
use async_trait::async_trait;
use serde::Serialize;

/// Largest text, in bytes, the HTTP backends will send
pub const MAX_TEXT_BYTES: usize = 30_000;

/// A suggested correction of the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mistakes {
    /// Source text with the suspect words marked up
    pub markup: String,
    /// Source text with the corrections applied
    pub corrected: String,
}

/// Optional data a backend returns next to the translated text
///
/// Only backends declaring the matching [`Capabilities`] flag fill a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationExtra {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible_mistakes: Option<Mistakes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_pronunciation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_pronunciation: Option<String>,
}

impl TranslationExtra {
    pub fn is_empty(&self) -> bool {
        self.possible_mistakes.is_none()
            && self.src_pronunciation.is_none()
            && self.dest_pronunciation.is_none()
    }
}

/// Result of a single `translate` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub extra: TranslationExtra,
}

impl Translation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: TranslationExtra::default(),
        }
    }
}

/// Generic trait for translation backends
///
/// Both calls may be slow (network round trips) and both may fail. The
/// broker holds implementations behind `Arc<dyn Translator>` and swaps them
/// when the backend settings change.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Detect the language of `text`
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Candidate language codes, most likely first.
    ///   Never empty.
    /// * `Err(BackendError)` - If detection fails or yields no candidate
    async fn detect(&self, text: &str) -> BackendResult<Vec<String>>;

    /// Translate a single text string from `source` to `target`
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source` - Source language code (e.g., "en", "zh-CN")
    /// * `target` - Target language code
    ///
    /// # Example
    ///
    /// ```ignore
    /// let result = backend.translate("Hello", "en", "fr").await?;
    /// assert_eq!(result.text, "Bonjour");
    /// ```
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> BackendResult<Translation>;

    /// Name of this backend, used in logs
    fn provider_name(&self) -> &str;

    /// Features this backend supports
    fn capabilities(&self) -> Capabilities;
}

/// Reject texts the HTTP backends would refuse anyway
pub fn check_length(text: &str) -> BackendResult<()> {
    if text.len() > MAX_TEXT_BYTES {
        return Err(BackendError::Other(format!(
            "Text exceeds maximum length of {} bytes",
            MAX_TEXT_BYTES
        )));
    }
    Ok(())
}

/// Normalize a locale code by stripping region and script information
///
/// - `en-US` → `en`
/// - `zh-Hans` → `zh`
/// - `EN` → `en`
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_locale("en-US"), "en");
/// ```
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Validate that a locale code is in acceptable format
///
/// Accepts ASCII alphanumerics, hyphens and underscores. The `auto`
/// sentinel passes too, although the broker never sends it to a backend.
pub fn validate_locale(locale: &str) -> BackendResult<()> {
    if locale.is_empty() {
        return Err(BackendError::InvalidLocale(
            "Locale code is empty".to_string(),
        ));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(BackendError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}
