use serde::Serialize;

use crate::backend::{Translation, TranslationExtra};

/// Sentinel id for "detect the source language"
pub const AUTO: &str = "auto";

/// Source language of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Ask the backend to detect it
    Auto,
    Code(String),
}

impl SourceLanguage {
    pub fn as_str(&self) -> &str {
        match self {
            SourceLanguage::Auto => AUTO,
            SourceLanguage::Code(code) => code,
        }
    }
}

impl From<&str> for SourceLanguage {
    fn from(code: &str) -> Self {
        if code == AUTO {
            SourceLanguage::Auto
        } else {
            SourceLanguage::Code(code.to_string())
        }
    }
}

/// One unit of work for the worker
///
/// Built by `Broker::submit` and consumed exactly once, either by the
/// worker or by being replaced in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub source_text: String,
    pub source_language: SourceLanguage,
    /// Last language the user translated from
    pub fallback_source_language: String,
    pub dest_language: String,
}

impl Request {
    pub fn new(source_text: &str, fallback_source_language: &str, dest_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: SourceLanguage::Auto,
            fallback_source_language: fallback_source_language.to_string(),
            dest_language: dest_language.to_string(),
        }
    }

    pub fn with_source_language(mut self, source_language: SourceLanguage) -> Self {
        self.source_language = source_language;
        self
    }
}

/// Terminal result of processing one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Translated {
        text: String,
        language: String,
        /// Pronunciations and spelling suggestions, when the backend has them
        #[serde(skip_serializing_if = "TranslationExtra::is_empty")]
        extra: TranslationExtra,
    },
    /// Source and destination coincide, or there was nothing to look up
    Unchanged { text: String },
    Failed,
}

impl Outcome {
    pub fn translated(text: impl Into<String>, language: impl Into<String>) -> Self {
        Outcome::Translated {
            text: text.into(),
            language: language.into(),
            extra: TranslationExtra::default(),
        }
    }

    /// Outcome of a backend translation into `language`, extras included
    pub fn from_translation(translation: Translation, language: impl Into<String>) -> Self {
        Outcome::Translated {
            text: translation.text,
            language: language.into(),
            extra: translation.extra,
        }
    }

    pub fn unchanged(text: impl Into<String>) -> Self {
        Outcome::Unchanged { text: text.into() }
    }

    /// Text to show for this outcome, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Translated { text, .. } | Outcome::Unchanged { text } => Some(text),
            Outcome::Failed => None,
        }
    }
}
