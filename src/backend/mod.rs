//! Translation backends
//!
//! A backend answers two questions about a piece of text: which language is
//! it in, and what does it say in another language. Backends are selected by
//! id from the settings and declare what they support through
//! [`Capabilities`], so callers never test for features at runtime.
//!
//! # Backends
//!
//! | id               | detection | change instance | mistakes | pronunciation |
//! |------------------|-----------|-----------------|----------|---------------|
//! | `google`         | yes       | no              | no       | no            |
//! | `libretranslate` | yes       | yes             | no       | no            |
//! | `mock`           | yes       | no              | yes      | yes           |
//!
//! The Google v2 REST endpoint answers with the translated text only, so
//! spelling suggestions and pronunciations are left to backends that
//! return them.
//!
//! # Example
//!
//! ```ignore
//! use dialect_live::backend::{BackendFactory, DefaultBackendFactory};
//! use dialect_live::settings::Settings;
//!
//! let settings = Settings::from_env();
//! let translator = DefaultBackendFactory.build(&settings.backend_settings())?;
//! println!("using {}", translator.provider_name());
//! ```

pub mod error;
pub mod google;
pub mod libre;
pub mod mock;
pub mod translator;

use std::str::FromStr;
use std::sync::Arc;

use crate::settings::BackendSettings;

pub use error::{BackendError, BackendResult};
pub use google::GoogleTranslateBackend;
pub use libre::LibreTranslateBackend;
pub use mock::{MockCall, MockMode, MockTranslator};
pub use translator::{
    MAX_TEXT_BYTES, Mistakes, Translation, TranslationExtra, Translator, check_length,
    normalize_locale, validate_locale,
};

/// Features a backend declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Can detect the language of a text
    pub detection: bool,
    /// Accepts a user-configured endpoint URL
    pub change_instance: bool,
    /// Suggests corrections of the source text
    pub mistakes: bool,
    /// Returns source and destination pronunciations
    pub pronunciation: bool,
}

/// Known backend variants, keyed by their settings id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Google,
    Libre,
    Mock,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Google, BackendKind::Libre, BackendKind::Mock];

    pub fn id(self) -> &'static str {
        match self {
            BackendKind::Google => "google",
            BackendKind::Libre => "libretranslate",
            BackendKind::Mock => "mock",
        }
    }

    pub fn pretty_name(self) -> &'static str {
        match self {
            BackendKind::Google => "Google Translate",
            BackendKind::Libre => "LibreTranslate",
            BackendKind::Mock => "Mock Translator",
        }
    }

    pub const fn capabilities(self) -> Capabilities {
        match self {
            BackendKind::Google => Capabilities {
                detection: true,
                change_instance: false,
                mistakes: false,
                pronunciation: false,
            },
            BackendKind::Libre => Capabilities {
                detection: true,
                change_instance: true,
                mistakes: false,
                pronunciation: false,
            },
            BackendKind::Mock => Capabilities {
                detection: true,
                change_instance: false,
                mistakes: true,
                pronunciation: true,
            },
        }
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(id: &str) -> BackendResult<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| BackendError::UnknownBackend(id.to_string()))
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Builds translator instances from backend settings
///
/// The broker calls this once at construction and again whenever the backend
/// settings change.
pub trait BackendFactory: Send + Sync {
    fn build(&self, settings: &BackendSettings) -> BackendResult<Arc<dyn Translator>>;
}

/// Factory covering every [`BackendKind`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn build(&self, settings: &BackendSettings) -> BackendResult<Arc<dyn Translator>> {
        let kind: BackendKind = settings.backend.parse()?;

        if settings.endpoint_url.is_some() && !kind.capabilities().change_instance {
            tracing::warn!(
                backend = %kind,
                "Backend does not support a custom endpoint, ignoring backend_endpoint_url"
            );
        }

        Ok(match kind {
            BackendKind::Google => {
                let backend = match &settings.api_key {
                    Some(key) => GoogleTranslateBackend::new(key.clone())?,
                    None => GoogleTranslateBackend::from_env()?,
                };
                Arc::new(backend)
            }
            BackendKind::Libre => Arc::new(LibreTranslateBackend::new(
                settings.endpoint_url.as_deref(),
                settings.api_key.clone(),
            )?),
            BackendKind::Mock => Arc::new(MockTranslator::new(MockMode::Suffix)),
        })
    }
}
