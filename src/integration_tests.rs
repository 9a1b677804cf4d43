//! End-to-end tests for the broker
//!
//! These drive `Broker` the way a search provider does, against a gated
//! `MockTranslator`, so the interleaving of submissions and translations is
//! deterministic.
//!
//! # Running the network tests
//!
//! ```bash
//! export GOOGLE_TRANSLATE_API_KEY=...
//! cargo test --lib integration_tests -- --ignored --nocapture
//! ```

#[cfg(test)]
mod tests {
    use crate::backend::{
        BackendFactory, BackendResult, MockCall, MockMode, MockTranslator, Translator,
    };
    use crate::broker::{Broker, MAX_UNREAD, Outcome, SourceLanguage};
    use crate::settings::{BackendSettings, Settings};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Factory returning a fresh clone of the mock registered for each backend id
    struct MockFactory(HashMap<String, MockTranslator>);

    impl MockFactory {
        fn single(mock: MockTranslator) -> Self {
            Self(HashMap::from([("mock".to_string(), mock)]))
        }
    }

    impl BackendFactory for MockFactory {
        fn build(&self, settings: &BackendSettings) -> BackendResult<Arc<dyn Translator>> {
            let mock = self.0.get(&settings.backend).cloned().ok_or_else(|| {
                crate::backend::BackendError::UnknownBackend(settings.backend.clone())
            })?;
            Ok(Arc::new(mock))
        }
    }

    fn settings(src: &str, dest: &str) -> Settings {
        Settings::default()
            .with_backend("mock")
            .with_languages(src, dest)
    }

    fn broker(mock: &MockTranslator, src: &str, dest: &str) -> Arc<Broker> {
        let factory = MockFactory::single(mock.clone());
        Arc::new(Broker::with_factory(settings(src, dest), factory).unwrap())
    }

    /// Wait until the mock has been asked to translate `count` texts
    async fn translations_started(mock: &MockTranslator, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while mock.translated_texts().len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("translation never started");
    }

    async fn idle(broker: &Broker) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while broker.is_running() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("worker never went idle");
    }

    // ============================================================================
    // Debounce
    // ============================================================================

    #[tokio::test]
    async fn test_rapid_submissions_translate_in_flight_and_latest_only() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");

        broker.submit("h");
        translations_started(&mock, 1).await;

        // "h" is in flight; everything else fights over the single slot
        for fragment in ["ho", "hol", "hola"] {
            broker.submit(fragment);
        }

        // Superseded fragments that never started are simply not found
        assert_eq!(broker.fetch("ho").await, Outcome::unchanged("ho"));
        assert_eq!(broker.fetch("hol").await, Outcome::unchanged("hol"));

        gate.add_permits(2);
        assert_eq!(broker.fetch("hola").await, Outcome::translated("hola_fr", "fr"));
        assert_eq!(broker.fetch("h").await, Outcome::translated("h_fr", "fr"));

        assert_eq!(mock.translated_texts(), vec!["h", "hola"]);
    }

    #[tokio::test]
    async fn test_in_flight_publication_precedes_next_dequeue() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");

        broker.submit("a");
        translations_started(&mock, 1).await;
        broker.submit("b");

        gate.add_permits(1);
        assert_eq!(broker.fetch("a").await, Outcome::translated("a_fr", "fr"));

        // "b" was only dequeued once "a" was published
        translations_started(&mock, 2).await;
        gate.add_permits(1);
        assert_eq!(broker.fetch("b").await, Outcome::translated("b_fr", "fr"));

        let detects: Vec<_> = mock
            .calls()
            .into_iter()
            .filter(|c| matches!(c, MockCall::Detect(_)))
            .collect();
        assert_eq!(
            detects,
            vec![
                MockCall::Detect("a".to_string()),
                MockCall::Detect("b".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_reader_waiting_on_superseded_text_is_released() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");

        broker.submit("a");
        translations_started(&mock, 1).await;
        broker.submit("b");

        let reader = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.fetch("b").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        broker.submit("c");

        assert_eq!(reader.await.unwrap(), Outcome::unchanged("b"));
        gate.add_permits(2);
        assert_eq!(broker.fetch("c").await, Outcome::translated("c_fr", "fr"));
    }

    #[tokio::test]
    async fn test_only_one_worker_runs() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");

        broker.submit("a");
        translations_started(&mock, 1).await;
        broker.submit("b");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A second worker would have started translating "b" already
        assert_eq!(mock.translated_texts(), vec!["a"]);

        gate.add_permits(2);
        broker.fetch("b").await;
        idle(&broker).await;
    }

    #[tokio::test]
    async fn test_resubmitting_in_flight_text_publishes_once() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");

        broker.submit("a");
        translations_started(&mock, 1).await;
        broker.submit("a");

        gate.add_permits(2);
        assert_eq!(broker.fetch("a").await, Outcome::translated("a_fr", "fr"));

        translations_started(&mock, 2).await;
        idle(&broker).await;
        // The second run found nobody waiting and left nothing behind
        assert_eq!(broker.fetch_entry("a").await, None);
        assert_eq!(broker.result_count(), 0);
    }

    #[tokio::test]
    async fn test_unread_in_flight_results_stay_bounded() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");
        let sessions = MAX_UNREAD * 3;

        // Each session: a prefix goes in flight, the full text queues behind it,
        // and only the full text is ever fetched
        for n in 0..sessions {
            let prefix = format!("p{}", n);
            let full = format!("p{} full", n);

            broker.submit(&prefix);
            translations_started(&mock, 2 * n + 1).await;
            broker.submit(&full);
            gate.add_permits(2);
            assert_eq!(
                broker.fetch(&full).await,
                Outcome::translated(format!("{}_fr", full), "fr")
            );
        }

        idle(&broker).await;
        assert!(broker.result_count() <= MAX_UNREAD);

        let last = format!("p{}", sessions - 1);
        assert_eq!(
            broker.fetch(&last).await,
            Outcome::translated(format!("{}_fr", last), "fr")
        );
        assert_eq!(broker.fetch("p0").await, Outcome::unchanged("p0"));
    }

    // ============================================================================
    // Language resolution
    // ============================================================================

    #[tokio::test]
    async fn test_scenario_spanish_to_english() {
        let mut map = HashMap::new();
        map.insert(("hola".to_string(), "en".to_string()), "hello".to_string());
        let mock = MockTranslator::new(MockMode::Mappings(map)).with_detection("hola", &["es"]);
        let broker = broker(&mock, "en", "en");

        broker.submit("hola");
        assert_eq!(broker.fetch("hola").await, Outcome::translated("hello", "en"));
        assert_eq!(
            mock.calls()[1],
            MockCall::Translate {
                text: "hola".to_string(),
                source: "es".to_string(),
                target: "en".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_scenario_feedback_uses_fallback_language() {
        let mock = MockTranslator::new(MockMode::Suffix).with_detection("hello", &["en"]);
        let broker = broker(&mock, "fr", "en");

        broker.submit("hello");
        assert_eq!(broker.fetch("hello").await, Outcome::translated("hello_fr", "fr"));
        assert_eq!(
            mock.calls()[1],
            MockCall::Translate {
                text: "hello".to_string(),
                source: "en".to_string(),
                target: "fr".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_same_language_everywhere_is_unchanged_without_translate() {
        let mock = MockTranslator::new(MockMode::Suffix).with_detection("hello", &["en"]);
        let broker = broker(&mock, "en", "en");

        broker.submit("hello");
        assert_eq!(broker.fetch("hello").await, Outcome::unchanged("hello"));
        assert!(mock.translated_texts().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_source_language_carries_extras() {
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_pronunciation("guten tag", "GOO-ten tahk", "guten tag_fr")
            .with_mistakes("guten tag", "guten <em>tag</em>", "guten Tag");
        let broker = broker(&mock, "en", "fr");

        broker.submit_from("guten tag", SourceLanguage::Code("de".to_string()));
        match broker.fetch("guten tag").await {
            Outcome::Translated {
                text,
                language,
                extra,
            } => {
                assert_eq!(text, "guten tag_fr");
                assert_eq!(language, "fr");
                assert_eq!(extra.src_pronunciation.as_deref(), Some("GOO-ten tahk"));
                assert_eq!(
                    extra.possible_mistakes.map(|m| m.corrected).as_deref(),
                    Some("guten Tag")
                );
            }
            other => panic!("Expected translation, got {:?}", other),
        }
        assert!(
            mock.calls()
                .iter()
                .all(|call| !matches!(call, MockCall::Detect(_)))
        );
    }

    #[tokio::test]
    async fn test_empty_text() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let broker = broker(&mock, "en", "fr");

        broker.submit("");
        assert_eq!(broker.fetch("").await, Outcome::translated("", "fr"));
        assert!(mock.calls().is_empty());
    }

    // ============================================================================
    // Failures
    // ============================================================================

    #[tokio::test]
    async fn test_failure_is_reported_and_worker_restarts() {
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_failing_text("x");
        let broker = broker(&mock, "en", "fr");

        broker.submit("x");
        assert_eq!(broker.fetch("x").await, Outcome::Failed);
        idle(&broker).await;

        broker.submit("y");
        assert_eq!(broker.fetch("y").await, Outcome::translated("y_fr", "fr"));
    }

    #[tokio::test]
    async fn test_detection_failure_is_reported() {
        let mock = MockTranslator::new(MockMode::Suffix).with_detect_error("offline");
        let broker = broker(&mock, "en", "fr");

        broker.submit("hola");
        assert_eq!(broker.fetch("hola").await, Outcome::Failed);
        assert!(mock.translated_texts().is_empty());
    }

    #[tokio::test]
    async fn test_failure_releases_request_queued_behind_it() {
        let gate = Arc::new(Semaphore::new(0));
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_failing_text("x")
            .with_gate(gate.clone());
        let broker = broker(&mock, "en", "fr");

        broker.submit("x");
        translations_started(&mock, 1).await;
        broker.submit("y");

        gate.add_permits(1);
        assert_eq!(broker.fetch("x").await, Outcome::Failed);
        assert_eq!(broker.fetch("y").await, Outcome::unchanged("y"));
        assert_eq!(mock.translated_texts(), vec!["x"]);
        assert!(!broker.is_running());
    }

    #[tokio::test]
    async fn test_every_dequeued_request_publishes_exactly_once() {
        let mock = MockTranslator::new(MockMode::Suffix).with_default_language("es");
        let broker = broker(&mock, "en", "fr");

        for text in ["a", "b", "c"] {
            broker.submit(text);
            assert_eq!(
                broker.fetch(text).await,
                Outcome::translated(format!("{}_fr", text), "fr")
            );
            // Cleared after the single read
            assert_eq!(broker.fetch_entry(text).await, None);
        }
    }

    // ============================================================================
    // Backend reconstruction
    // ============================================================================

    #[tokio::test]
    async fn test_backend_switch_applies_to_next_request() {
        let gate = Arc::new(Semaphore::new(0));
        let first = MockTranslator::new(MockMode::Suffix)
            .with_default_language("es")
            .with_gate(gate.clone());
        let second = MockTranslator::new(MockMode::NoOp).with_default_language("es");
        let factory = MockFactory(HashMap::from([
            ("mock".to_string(), first.clone()),
            ("other".to_string(), second.clone()),
        ]));
        let broker = Broker::with_factory(settings("en", "fr"), factory).unwrap();

        broker.submit("a");
        translations_started(&first, 1).await;

        let switched = (*broker.settings()).clone().with_backend("other");
        broker.update_settings(switched).unwrap();
        broker.submit("b");

        // "a" finishes on the translator it was dequeued with
        gate.add_permits(1);
        assert_eq!(broker.fetch("a").await, Outcome::translated("a_fr", "fr"));
        // "other" has no stored languages, so the defaults apply
        assert_eq!(broker.fetch("b").await, Outcome::translated("b", "fr"));

        assert_eq!(first.translated_texts(), vec!["a"]);
        assert_eq!(second.translated_texts(), vec!["b"]);
    }

    // ============================================================================
    // Real backend (requires API key)
    // ============================================================================

    #[tokio::test]
    #[ignore]
    async fn test_e2e_google_backend() {
        if std::env::var("GOOGLE_TRANSLATE_API_KEY").is_err() {
            eprintln!("Skipping: GOOGLE_TRANSLATE_API_KEY not set");
            return;
        }

        let settings = Settings::from_env()
            .with_backend("google")
            .with_languages("en", "en");
        let broker = Broker::new(settings).unwrap();

        broker.submit("Hola, ¿cómo estás?");
        match broker.fetch("Hola, ¿cómo estás?").await {
            Outcome::Translated { text, language, .. } => {
                println!("Translated: {} [{}]", text, language);
                assert_eq!(language, "en");
                assert!(!text.is_empty());
            }
            other => panic!("Expected translation, got {:?}", other),
        }
    }
}
