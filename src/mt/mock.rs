//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, API-free translator for running
//! the dictionary pipeline without network access. Every call is recorded
//! so tests can assert on request order, not only on the final trees.
//!
//! # Example
//!
//! ```ignore
//! use dictionary_mt::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "en", "fr").await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_locale) → translation, suffix for anything unmapped
    Mappings(HashMap<(String, String), String>),

    /// Fail with `RequestFailed` for the listed texts, suffix for the rest
    FailOn(HashSet<String>),

    /// Fail every call
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// One recorded `translate` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub text: String,
    pub source_locale: String,
    pub target_locale: String,
}

/// Mock translator that simulates various translation scenarios
///
/// Clones share the same call log, so a test can keep one handle and give
/// the other to the pipeline.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, text: &str, source: &str, target: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                text: text.to_string(),
                source_locale: source.to_string(),
                target_locale: target.to_string(),
            });
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::FailOn(failing) => {
                if failing.contains(text) {
                    Err(MtError::RequestFailed { status: 503 })
                } else {
                    Ok(format!("{}_{}", text, target))
                }
            }
            MockMode::Error(msg) => Err(MtError::Translation(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        self.record(text, source_locale, target_locale);
        self.apply_translation(text, target_locale)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
