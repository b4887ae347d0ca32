//! End-to-End Tests for the Dictionary Pipeline
//!
//! These tests stage a dictionary directory on disk, run the full pipeline
//! against the mock translator (or a local HTTP server standing in for
//! Google Translate) and inspect the files it writes.

#[cfg(test)]
mod tests {
    use crate::loader::{dictionary_path, load_dictionary};
    use crate::mt::{GoogleTranslateProvider, MockMode, MockTranslator};
    use crate::pipeline::{Pipeline, PipelineConfig, PipelineError};
    use crate::tree::walk;
    use serde_json::{Value, json};
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Stage `en.json` with `source` plus empty files for each target
    fn stage(source: &Value, targets: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dictionary_path(dir.path(), "en"),
            serde_json::to_string(source).unwrap(),
        )
        .unwrap();
        for target in targets {
            fs::write(dictionary_path(dir.path(), target), "{}").unwrap();
        }
        dir
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig::new(dir).with_request_delay(Duration::ZERO)
    }

    fn read(dir: &Path, locale: &str) -> Value {
        load_dictionary(&dictionary_path(dir, locale)).unwrap()
    }

    /// Log sink shared between a test and its subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn mappings(pairs: &[(&str, &str, &str)]) -> MockMode {
        let map: HashMap<(String, String), String> = pairs
            .iter()
            .map(|(text, locale, out)| ((text.to_string(), locale.to_string()), out.to_string()))
            .collect();
        MockMode::Mappings(map)
    }

    // ============================================================================
    // Translation with a protected placeholder
    // ============================================================================

    #[tokio::test]
    async fn test_translates_prose_and_keeps_placeholder() {
        let source = json!({"a": {"b": "Hello"}, "c": "{token}"});
        let dir = stage(&source, &["fr"]);
        let mock = MockTranslator::new(mappings(&[("Hello", "fr", "Bonjour")]));

        let report = Pipeline::new(config(dir.path()), Arc::new(mock.clone()))
            .run()
            .await
            .unwrap();

        assert_eq!(read(dir.path(), "fr"), json!({"a": {"b": "Bonjour"}, "c": "{token}"}));
        assert_eq!(report.locales.len(), 1);
        assert_eq!(report.locales[0].translated, 1);
        assert_eq!(report.locales[0].protected, 1);

        // The placeholder never reaches the translator
        let texts: Vec<String> = mock.calls().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["Hello"]);
    }

    // ============================================================================
    // A failing leaf keeps its source text and the run continues
    // ============================================================================

    #[tokio::test]
    async fn test_failed_leaf_falls_back_to_source() {
        let source = json!({"a": {"b": "Hello"}, "c": "{token}", "d": "Later"});
        let dir = stage(&source, &["fr"]);
        let mock = MockTranslator::new(MockMode::FailOn(HashSet::from(["Hello".to_string()])));

        let report = Pipeline::new(config(dir.path()), Arc::new(mock.clone()))
            .run()
            .await
            .unwrap();

        assert_eq!(
            read(dir.path(), "fr"),
            json!({"a": {"b": "Hello"}, "c": "{token}", "d": "Later_fr"})
        );
        assert_eq!(report.locales[0].failed, 1);
        assert_eq!(report.locales[0].translated, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_leaf_logs_one_error() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = stage(&json!({"a": {"b": "Hello"}, "d": "Later"}), &["fr"]);
        let mock = MockTranslator::new(MockMode::FailOn(HashSet::from(["Hello".to_string()])));

        Pipeline::new(config(dir.path()), Arc::new(mock))
            .run()
            .await
            .unwrap();

        let output = logs.contents();
        let errors: Vec<&str> = output.lines().filter(|line| line.contains("ERROR")).collect();
        assert_eq!(errors.len(), 1, "log output:\n{}", output);
        assert!(errors[0].contains("Error at a.b (fr)"));
    }

    #[tokio::test]
    async fn test_every_leaf_failing_writes_untranslated_clone() {
        let source = json!({"title": "Welcome", "nav": {"home": "Home", "n": 3}});
        let dir = stage(&source, &["es"]);
        let mock = MockTranslator::new(MockMode::Error("service down".to_string()));

        let report = Pipeline::new(config(dir.path()), Arc::new(mock))
            .run()
            .await
            .unwrap();

        assert_eq!(read(dir.path(), "es"), source);
        assert_eq!(report.locales[0].failed, 2);
    }

    // ============================================================================
    // Shape preservation: arrays and non-string leaves
    // ============================================================================

    #[tokio::test]
    async fn test_arrays_keep_their_shape() {
        let source = json!({"items": ["x", "y"]});
        let dir = stage(&source, &["de"]);

        Pipeline::new(config(dir.path()), Arc::new(MockTranslator::new(MockMode::Suffix)))
            .run()
            .await
            .unwrap();

        assert_eq!(read(dir.path(), "de"), json!({"items": ["x_de", "y_de"]}));
    }

    #[tokio::test]
    async fn test_non_string_leaves_are_copied() {
        let source = json!({"count": 3, "flag": false, "none": null, "label": "Items"});
        let dir = stage(&source, &["it", "ja"]);
        let mock = MockTranslator::new(MockMode::Suffix);

        Pipeline::new(config(dir.path()), Arc::new(mock.clone()))
            .run()
            .await
            .unwrap();

        for locale in ["it", "ja"] {
            let output = read(dir.path(), locale);
            assert_eq!(output["count"], json!(3));
            assert_eq!(output["flag"], json!(false));
            assert_eq!(output["none"], Value::Null);
            assert_eq!(output["label"], json!(format!("Items_{}", locale)));
        }
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_output_paths_and_key_order_match_source() {
        let raw = r#"{"zeta": {"b": "B", "a": ["one", {"deep": "D"}]}, "alpha": "{count()}", "mid": "M"}"#;
        let dir = TempDir::new().unwrap();
        fs::write(dictionary_path(dir.path(), "en"), raw).unwrap();
        fs::write(dictionary_path(dir.path(), "pt-BR"), "").unwrap();

        Pipeline::new(config(dir.path()), Arc::new(MockTranslator::new(MockMode::Suffix)))
            .run()
            .await
            .unwrap();

        let source: Value = serde_json::from_str(raw).unwrap();
        let output = read(dir.path(), "pt-BR");
        let source_paths: Vec<_> = walk(&source).into_iter().map(|e| e.path).collect();
        let output_paths: Vec<_> = walk(&output).into_iter().map(|e| e.path).collect();
        assert_eq!(source_paths, output_paths);
        assert_eq!(output["alpha"], json!("{count()}"));

        let written = fs::read_to_string(dictionary_path(dir.path(), "pt-BR")).unwrap();
        assert!(written.starts_with("{\n    \"zeta\": {\n        \"b\": \"B_pt-BR\""));
    }

    // ============================================================================
    // Locales are processed one after another
    // ============================================================================

    #[tokio::test]
    async fn test_all_calls_for_one_locale_precede_the_next() {
        let source = json!({"a": "one", "b": {"c": "two"}, "d": "three"});
        let dir = stage(&source, &["fr", "de"]);
        let mock = MockTranslator::new(MockMode::Suffix);

        let report = Pipeline::new(config(dir.path()), Arc::new(mock.clone()))
            .run()
            .await
            .unwrap();

        let processed: Vec<&str> = report.locales.iter().map(|r| r.locale.as_str()).collect();
        assert_eq!(processed, vec!["de", "fr"]);

        let calls: Vec<(String, String)> = mock
            .calls()
            .into_iter()
            .map(|c| (c.target_locale, c.text))
            .collect();
        let expected: Vec<(String, String)> = ["de", "fr"]
            .iter()
            .flat_map(|locale| {
                ["one", "two", "three"]
                    .iter()
                    .map(move |text| (locale.to_string(), text.to_string()))
            })
            .collect();
        assert_eq!(calls, expected);
        assert!(mock.calls().iter().all(|c| c.source_locale == "en"));
    }

    // ============================================================================
    // Configuration switches
    // ============================================================================

    #[tokio::test]
    async fn test_only_filter_leaves_other_locales_untouched() {
        let source = json!({"a": "one"});
        let dir = stage(&source, &["fr", "de"]);

        let mut config = config(dir.path());
        config.only = vec!["fr".to_string()];
        Pipeline::new(config, Arc::new(MockTranslator::new(MockMode::Suffix)))
            .run()
            .await
            .unwrap();

        assert_eq!(read(dir.path(), "fr"), json!({"a": "one_fr"}));
        assert_eq!(
            fs::read_to_string(dictionary_path(dir.path(), "de")).unwrap(),
            "{}"
        );
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_calls_and_writes_nothing() {
        let source = json!({"a": "one", "b": "{name}"});
        let dir = stage(&source, &["fr"]);
        let mock = MockTranslator::new(MockMode::Suffix);

        let mut config = config(dir.path());
        config.dry_run = true;
        let report = Pipeline::new(config, Arc::new(mock.clone()))
            .run()
            .await
            .unwrap();

        assert!(mock.calls().is_empty());
        assert_eq!(report.locales[0].total, 2);
        assert_eq!(report.locales[0].protected, 1);
        assert_eq!(
            fs::read_to_string(dictionary_path(dir.path(), "fr")).unwrap(),
            "{}"
        );
    }

    #[tokio::test]
    async fn test_no_targets_is_not_an_error() {
        let dir = stage(&json!({"a": "one"}), &[]);
        let mock = MockTranslator::new(MockMode::Suffix);

        let report = Pipeline::new(config(dir.path()), Arc::new(mock.clone()))
            .run()
            .await
            .unwrap();

        assert!(report.locales.is_empty());
        assert!(mock.calls().is_empty());
    }

    // ============================================================================
    // Fatal errors
    // ============================================================================

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dictionary_path(dir.path(), "fr"), "{}").unwrap();

        let result = Pipeline::new(config(dir.path()), Arc::new(MockTranslator::new(MockMode::Suffix)))
            .run()
            .await;

        assert!(matches!(result, Err(PipelineError::SourceLoad(_))));
    }

    #[tokio::test]
    async fn test_unparseable_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dictionary_path(dir.path(), "en"), "{\"a\": ").unwrap();

        let result = Pipeline::new(config(dir.path()), Arc::new(MockTranslator::new(MockMode::Suffix)))
            .run()
            .await;

        assert!(matches!(result, Err(PipelineError::SourceLoad(_))));
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal_and_keeps_old_file() {
        let dir = stage(&json!({"a": "one"}), &["fr"]);
        // A directory where the staging file should go makes the write fail
        fs::create_dir(dir.path().join(".fr.json.tmp")).unwrap();

        let result = Pipeline::new(config(dir.path()), Arc::new(MockTranslator::new(MockMode::Suffix)))
            .run()
            .await;

        match result {
            Err(PipelineError::Persist { locale, .. }) => assert_eq!(locale, "fr"),
            other => panic!("Expected Persist error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(
            fs::read_to_string(dictionary_path(dir.path(), "fr")).unwrap(),
            "{}"
        );
    }

    // ============================================================================
    // Against an HTTP server speaking the Google Translate response format
    // ============================================================================

    #[tokio::test]
    async fn test_pipeline_with_http_provider() {
        use wiremock::matchers::{method, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Hello. Goodbye"))
            .and(query_param("tl", "fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [["Bonjour. ", "Hello. "], ["Au revoir", "Goodbye"]],
                null,
                "en"
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "Broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = json!({"greeting": "Hello. Goodbye", "bad": "Broken", "who": "{user}"});
        let dir = stage(&source, &["fr"]);
        let provider =
            GoogleTranslateProvider::with_endpoint(format!("{}/translate_a/single", server.uri()))
                .unwrap();

        let report = Pipeline::new(config(dir.path()), Arc::new(provider))
            .run()
            .await
            .unwrap();

        assert_eq!(
            read(dir.path(), "fr"),
            json!({"greeting": "Bonjour. Au revoir", "bad": "Broken", "who": "{user}"})
        );
        assert_eq!(report.locales[0].translated, 1);
        assert_eq!(report.locales[0].failed, 1);
        assert_eq!(report.locales[0].protected, 1);
    }
}
