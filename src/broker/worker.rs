//! Translation worker
//!
//! A worker is a Tokio task that drains the request queue until it finds it
//! empty, then exits. The broker starts one whenever a submission finds no
//! worker running.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{BackendError, BackendResult, Translator};
use crate::broker::Shared;
use crate::broker::request::{Outcome, Request, SourceLanguage};

/// Drain the queue, publishing one outcome per dequeued request
///
/// A backend failure publishes `Failed` for the request at hand and ends the
/// run. A request still waiting at that point is dropped and its entry
/// discarded, so nobody is left waiting for it.
pub(crate) async fn run(shared: Arc<Shared>) {
    debug!("Worker started");

    while let Some(request) = shared.queue.next() {
        // Captured per request: a settings change mid-run only affects later requests
        let translator = shared.translator();
        let text = request.source_text.clone();

        match resolve(translator.as_ref(), request).await {
            Ok(outcome) => {
                debug!(text = %text, ?outcome, "Request processed");
                if !shared.results.publish(&text, outcome) {
                    debug!(text = %text, "Result no longer awaited, dropped");
                }
            }
            Err(err) => {
                warn!(
                    text = %text,
                    provider = translator.provider_name(),
                    error = %err,
                    "Translation failed, stopping worker"
                );
                shared.results.publish(&text, Outcome::Failed);
                if let Some(leftover) = shared.queue.stop() {
                    debug!(text = %leftover.source_text, "Dropping request queued behind failure");
                    shared.results.discard(&leftover.source_text);
                }
                return;
            }
        }
    }

    debug!("Worker idle");
}

/// Resolve languages for `request` and translate it
///
/// 1. `auto` source on non-empty text is detected; the first candidate wins.
/// 2. A source equal to the destination swaps the destination for the
///    fallback source language. If they still match the text is returned
///    unchanged.
/// 3. Empty text translates to empty text without asking the backend.
pub async fn resolve(translator: &dyn Translator, request: Request) -> BackendResult<Outcome> {
    let Request {
        source_text,
        source_language,
        fallback_source_language,
        mut dest_language,
    } = request;

    let source = match source_language {
        SourceLanguage::Auto if !source_text.is_empty() => translator
            .detect(&source_text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("No language detected".to_string()))?,
        other => other.as_str().to_string(),
    };

    if source == dest_language {
        dest_language = fallback_source_language;
    }
    if source == dest_language {
        return Ok(Outcome::unchanged(source_text));
    }

    if source_text.is_empty() {
        return Ok(Outcome::translated("", dest_language));
    }

    let translation = translator
        .translate(&source_text, &source, &dest_language)
        .await?;
    Ok(Outcome::from_translation(translation, dest_language))
}
