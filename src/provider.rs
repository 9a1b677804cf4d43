//! Search provider boundary
//!
//! The desktop shell asks a search provider for result ids on every
//! keystroke, then for the metadata of the ids it decided to show. Here the
//! search terms themselves are the result id: the initial query submits them
//! to the broker, and the metadata request waits for their translation.
//!
//! Only the calls are modelled; exporting them over D-Bus is left to the
//! embedding application.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::normalize_locale;
use crate::broker::{AUTO, Broker, Outcome};

/// Metadata for one search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultMeta {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResultMeta {
    /// Echo the id back as its own name
    fn echo(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchProvider {
    broker: Arc<Broker>,
}

impl SearchProvider {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// First keystroke of a search
    ///
    /// With live translation disabled nothing is submitted and no result is
    /// offered.
    pub fn on_initial_query(&self, terms: &[String]) -> Vec<String> {
        if !self.broker.settings().live_translation {
            return Vec::new();
        }

        let text = join_terms(terms);
        self.broker.submit(&text);
        vec![text]
    }

    /// Later keystrokes; previous results are irrelevant since the terms are the id
    pub fn on_subsequent_query(
        &self,
        _previous_results: &[String],
        terms: &[String],
    ) -> Vec<String> {
        self.on_initial_query(terms)
    }

    /// Wait for the translation of `ids[0]` and describe it
    ///
    /// Failures and unknown ids echo every requested id unchanged.
    pub async fn on_result_metadata(&self, ids: &[String]) -> Vec<ResultMeta> {
        let Some(first) = ids.first() else {
            return Vec::new();
        };

        match self.broker.fetch_entry(first).await {
            Some(Outcome::Translated { text, language, .. }) => vec![ResultMeta {
                id: first.clone(),
                name: text,
                description: Some(language_display_name(&language)),
            }],
            Some(Outcome::Unchanged { text }) => {
                let language = self.broker.settings().dest_lang().to_string();
                vec![ResultMeta {
                    id: first.clone(),
                    name: text,
                    description: Some(language_display_name(&language)),
                }]
            }
            outcome @ (Some(Outcome::Failed) | None) => {
                debug!(id = %first, ?outcome, "No translation to show");
                ids.iter().map(|id| ResultMeta::echo(id)).collect()
            }
        }
    }

    /// A result was activated: open the companion app with its text
    pub fn on_activate(&self, _ids: &[String], terms: &[String], _timestamp: u32) {
        self.launch(&join_terms(terms));
    }

    /// The provider itself was activated: open the companion app
    pub fn on_launch(&self, terms: &[String], _timestamp: u32) {
        self.launch(&join_terms(terms));
    }

    fn launch(&self, text: &str) {
        let settings = self.broker.settings();
        let command = &settings.companion_command;
        match tokio::process::Command::new(command)
            .args(companion_args(text, settings.dest_lang()))
            .spawn()
        {
            Ok(child) => debug!(command = %command, pid = ?child.id(), "Companion app launched"),
            Err(err) => warn!(command = %command, error = %err, "Failed to launch companion app"),
        }
    }
}

/// Arguments opening the companion app on `text`, source left to detection
pub fn companion_args(text: &str, dest: &str) -> Vec<String> {
    ["--text", text, "--src", AUTO, "--dest", dest]
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn join_terms(terms: &[String]) -> String {
    terms.join(" ")
}

/// English name of a language code, or the code itself if unknown
///
/// Region and script subtags are ignored: `zh-CN` reads as "Chinese".
pub fn language_display_name(code: &str) -> String {
    let base = normalize_locale(code);
    isolang::Language::from_639_1(&base)
        .or_else(|| isolang::Language::from_639_3(&base))
        .map(|language| language.to_name().to_string())
        .unwrap_or_else(|| code.to_string())
}
