//! Mock translator for testing
//!
//! A deterministic, network-free backend. Besides the translation modes it
//! records every call it receives and can hold translations behind a
//! semaphore gate, which lets tests pin down exactly which requests the
//! broker dispatched and in what order.
//!
//! # Example
//!
//! ```ignore
//! use dialect_live::backend::{Translator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "en", "fr").await.unwrap();
//!     assert_eq!(result.text, "hello_fr");
//! }
//! ```

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::translator::{Mistakes, Translation, TranslationExtra, Translator};
use crate::backend::{BackendKind, Capabilities};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append target suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined mappings, (text, target) → translation.
    /// Unknown pairs fall back to `Suffix`.
    Mappings(HashMap<(String, String), String>),

    /// Simulate API errors
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// One call received by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Detect(String),
    Translate {
        text: String,
        source: String,
        target: String,
    },
}

/// Mock translator that simulates various translation scenarios
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Language reported for texts without an explicit detection entry
    default_language: String,
    detections: HashMap<String, Vec<String>>,
    detect_error: Option<String>,
    /// Texts whose translation fails regardless of mode
    failing_texts: Vec<String>,
    /// Extras attached to the translation of a text
    extras: HashMap<String, TranslationExtra>,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    gate: Option<Arc<Semaphore>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    ///
    /// Detection answers `"en"` for everything until configured otherwise.
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            default_language: "en".to_string(),
            detections: HashMap::new(),
            detect_error: None,
            failing_texts: Vec::new(),
            extras: HashMap::new(),
            delay_ms: 0,
            gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockTranslator with simulated network delay
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::new(mode)
        }
    }

    /// Report `languages` when asked to detect `text`
    pub fn with_detection(mut self, text: &str, languages: &[&str]) -> Self {
        self.detections.insert(
            text.to_string(),
            languages.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// Language reported for texts without a dedicated detection entry
    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = language.to_string();
        self
    }

    /// Make every detection call fail with `message`
    pub fn with_detect_error(mut self, message: &str) -> Self {
        self.detect_error = Some(message.to_string());
        self
    }

    /// Make the translation of `text` fail
    pub fn with_failing_text(mut self, text: &str) -> Self {
        self.failing_texts.push(text.to_string());
        self
    }

    /// Attach pronunciations to the translation of `text`
    pub fn with_pronunciation(mut self, text: &str, src: &str, dest: &str) -> Self {
        let extra = self.extras.entry(text.to_string()).or_default();
        extra.src_pronunciation = Some(src.to_string());
        extra.dest_pronunciation = Some(dest.to_string());
        self
    }

    /// Suggest `corrected` as the intended spelling of `text`
    pub fn with_mistakes(mut self, text: &str, markup: &str, corrected: &str) -> Self {
        self.extras.entry(text.to_string()).or_default().possible_mistakes = Some(Mistakes {
            markup: markup.to_string(),
            corrected: corrected.to_string(),
        });
        self
    }

    /// Hold each translation until a permit is added to `gate`
    ///
    /// The call is recorded before waiting, so tests can observe that a
    /// translation is in flight and then release it.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Texts passed to `translate`, in order
    pub fn translated_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Translate { text, .. } => Some(text),
                MockCall::Detect(_) => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Internal helper to apply the simulated delay
    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    async fn wait_for_gate(&self) -> BackendResult<()> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| BackendError::Other("Mock gate closed".to_string()))?;
            permit.forget();
        }
        Ok(())
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> BackendResult<Translation> {
        if self.failing_texts.iter().any(|t| t == text) {
            return Err(BackendError::Other(format!("Mock failure for '{}'", text)));
        }

        let translated = match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Error(msg) => Err(BackendError::Other(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }?;

        Ok(Translation {
            text: translated,
            extra: self.extras.get(text).cloned().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn detect(&self, text: &str) -> BackendResult<Vec<String>> {
        self.record(MockCall::Detect(text.to_string()));
        self.apply_delay().await;

        if let Some(msg) = &self.detect_error {
            return Err(BackendError::Other(msg.clone()));
        }
        Ok(self
            .detections
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![self.default_language.clone()]))
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> BackendResult<Translation> {
        self.record(MockCall::Translate {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        });
        self.wait_for_gate().await?;
        self.apply_delay().await;

        self.apply_translation(text, target)
    }

    fn provider_name(&self) -> &str {
        BackendKind::Mock.pretty_name()
    }

    fn capabilities(&self) -> Capabilities {
        BackendKind::Mock.capabilities()
    }
}
