//! Live translation for search boxes
//!
//! `dialect-live` translates what a user types while they type it. Callers
//! hand every fragment to a [`Broker`] with [`Broker::submit`]; only the most
//! recent fragment is translated, and [`Broker::fetch`] waits for that
//! fragment's [`Outcome`].
//!
//! ```ignore
//! use dialect_live::{Broker, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Broker::new(Settings::from_env())?;
//!     for prefix in ["B", "Bon", "Bonjour"] {
//!         broker.submit(prefix);
//!     }
//!     println!("{:?}", broker.fetch("Bonjour").await);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod broker;
pub mod provider;
pub mod settings;

#[cfg(test)]
mod integration_tests;

pub use backend::{
    BackendError, BackendFactory, BackendKind, BackendResult, Capabilities, DefaultBackendFactory,
    Translation, TranslationExtra, Translator,
};
pub use broker::{Broker, Outcome, Request, SourceLanguage};
pub use provider::{ResultMeta, SearchProvider};
pub use settings::{BackendSettings, Settings, SettingsError};
