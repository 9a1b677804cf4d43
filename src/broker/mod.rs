//! Live translation broker
//!
//! The broker turns a stream of text fragments (one per keystroke in a
//! search box) into translations of the latest fragment only.
//!
//! # Overview
//!
//! 1. **Request queue** - a single slot; a new submission replaces a request
//!    that has not started yet
//! 2. **Worker** - one Tokio task at most, started on demand, that resolves
//!    languages and calls the translator
//! 3. **Result table** - pending and finished outcomes keyed by source text,
//!    where readers wait
//!
//! # Example
//!
//! ```ignore
//! use dialect_live::broker::Broker;
//! use dialect_live::settings::Settings;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Broker::new(Settings::from_env())?;
//!
//!     broker.submit("h");
//!     broker.submit("ho");
//!     broker.submit("hola");
//!
//!     println!("{:?}", broker.fetch("hola").await);
//!     Ok(())
//! }
//! ```

pub mod queue;
pub mod request;
pub mod results;
pub mod worker;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::backend::{BackendFactory, BackendResult, DefaultBackendFactory, Translator};
use crate::settings::Settings;

pub use queue::RequestQueue;
pub use request::{AUTO, Outcome, Request, SourceLanguage};
pub use results::{MAX_UNREAD, ResultTable};

/// State shared between the broker and its worker
pub(crate) struct Shared {
    pub(crate) queue: RequestQueue,
    pub(crate) results: ResultTable,
    translator: RwLock<Arc<dyn Translator>>,
}

impl Shared {
    pub(crate) fn translator(&self) -> Arc<dyn Translator> {
        self.translator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_translator(&self, translator: Arc<dyn Translator>) {
        *self
            .translator
            .write()
            .unwrap_or_else(PoisonError::into_inner) = translator;
    }
}

pub struct Broker {
    shared: Arc<Shared>,
    settings: RwLock<Arc<Settings>>,
    factory: Box<dyn BackendFactory>,
}

impl Broker {
    /// Create a broker using the backends known to [`DefaultBackendFactory`]
    pub fn new(settings: Settings) -> BackendResult<Self> {
        Self::with_factory(settings, DefaultBackendFactory)
    }

    /// Create a broker whose translators come from `factory`
    ///
    /// The first translator is built immediately; a failure is returned.
    pub fn with_factory(
        settings: Settings,
        factory: impl BackendFactory + 'static,
    ) -> BackendResult<Self> {
        let translator = factory.build(&settings.backend_settings())?;
        info!(
            backend = %settings.backend,
            provider = translator.provider_name(),
            "Translator ready"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                queue: RequestQueue::new(),
                results: ResultTable::new(),
                translator: RwLock::new(translator),
            }),
            settings: RwLock::new(Arc::new(settings)),
            factory: Box::new(factory),
        })
    }

    /// Queue `text` for translation and return immediately
    ///
    /// Languages come from the current settings: the last used source
    /// language becomes the fallback and the last used destination the
    /// target. A request still waiting in the queue is dropped, and its
    /// pending result with it.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime, since it may spawn the
    /// worker task.
    pub fn submit(&self, text: &str) {
        self.submit_from(text, SourceLanguage::Auto);
    }

    /// Like [`Broker::submit`], with the source language given instead of detected
    ///
    /// `SourceLanguage::Auto` behaves exactly like `submit`.
    pub fn submit_from(&self, text: &str, source: SourceLanguage) {
        let settings = self.settings();
        let request = Request::new(text, settings.src_lang(), settings.dest_lang())
            .with_source_language(source);

        self.shared.results.insert_pending(text);
        let pushed = self.shared.queue.push(request);

        if let Some(replaced) = pushed.replaced {
            debug!(text = %replaced.source_text, "Superseded before translation");
            if replaced.source_text != text {
                self.shared.results.discard(&replaced.source_text);
            }
        }

        if pushed.start_worker {
            tokio::spawn(worker::run(self.shared.clone()));
        }
    }

    /// Wait for the outcome of `text` and clear it
    ///
    /// Text that was never submitted, was already fetched, or was superseded
    /// before the worker reached it comes back as `Outcome::Unchanged`.
    pub async fn fetch(&self, text: &str) -> Outcome {
        self.fetch_entry(text)
            .await
            .unwrap_or_else(|| Outcome::unchanged(text))
    }

    /// Like [`Broker::fetch`], but `None` when there is no entry for `text`
    pub async fn fetch_entry(&self, text: &str) -> Option<Outcome> {
        self.shared.results.take(text).await
    }

    /// Replace the settings, rebuilding the translator if the backend changed
    ///
    /// A request the worker has already dequeued finishes on the translator
    /// it started with. If the new translator cannot be built, nothing
    /// changes and the error is returned.
    pub fn update_settings(&self, settings: Settings) -> BackendResult<()> {
        let mut current = self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let backend_settings = settings.backend_settings();
        if backend_settings != current.backend_settings() {
            let translator = self.factory.build(&backend_settings)?;
            info!(
                backend = %backend_settings.backend,
                provider = translator.provider_name(),
                "Backend settings changed, translator rebuilt"
            );
            self.shared.replace_translator(translator);
        }

        *current = Arc::new(settings);
        Ok(())
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The translator the next dequeued request will use
    pub fn translator(&self) -> Arc<dyn Translator> {
        self.shared.translator()
    }

    /// Whether a worker task is currently draining the queue
    pub fn is_running(&self) -> bool {
        self.shared.queue.is_running()
    }

    /// Entries in the result table, pending or waiting to be read
    pub fn result_count(&self) -> usize {
        self.shared.results.len()
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("backend", &self.settings().backend)
            .field("running", &self.is_running())
            .field("results", &self.result_count())
            .finish()
    }
}
