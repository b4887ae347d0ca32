//! Google Translate provider for machine translation
//!
//! This module talks to the public `translate_a/single` endpoint used by the
//! Google Translate web widget. It needs no API key, which is why callers
//! must pace their requests: the endpoint rate-limits aggressive clients.
//!
//! # Response shape
//!
//! The endpoint answers with nested arrays. Element 0 of the top-level array
//! holds one segment per sentence, and element 0 of each segment is the
//! translated fragment:
//!
//! ```json
//! [[["Bonjour. ", "Hello. ", null, null, 10], ["Au revoir", "Goodbye", null, null, 10]], null, "en"]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dictionary_mt::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::new()?;
//!     let result = provider.translate("Hello, world!", "en", "fr").await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{MachineTranslator, validate_locale};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default endpoint of the Google Translate web API
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google Translate web API provider
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Full URL of the `translate_a/single` endpoint
    endpoint: String,
}

impl GoogleTranslateProvider {
    /// Per-request timeout
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a provider pointed at the public endpoint
    pub fn new() -> MtResult<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a provider pointed at a custom endpoint
    ///
    /// Used for proxies and for tests that stand up a local HTTP server.
    ///
    /// # Errors
    ///
    /// * `MtError::Config` - If the endpoint is empty or the HTTP client
    ///   cannot be built
    pub fn with_endpoint(endpoint: impl Into<String>) -> MtResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(MtError::Config("Endpoint cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MtError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// Build the request URL for one string
    ///
    /// `dt=t` asks for plain translation data only (no dictionary entries,
    /// transliteration or markup handling).
    fn request_url(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<reqwest::Url> {
        reqwest::Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", source_locale),
                ("tl", target_locale),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| MtError::Config(format!("Invalid endpoint '{}': {}", self.endpoint, e)))
    }
}

/// Concatenate the translated fragments of a response payload
///
/// Returns `None` when the payload carries no segments or only empty
/// fragments, so the caller can fall back to the input text.
pub fn extract_translation(payload: &Value) -> Option<String> {
    let segments = payload.get(0)?.as_array()?;

    let joined: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .filter(|fragment| !fragment.is_empty())
        .collect();

    if joined.is_empty() { None } else { Some(joined) }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        let url = self.request_url(text, source_locale, target_locale)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MtError::RequestFailed {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            debug!(target_locale, "Empty response body, keeping source text");
            return Ok(text.to_string());
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| MtError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(extract_translation(&payload).unwrap_or_else(|| text.to_string()))
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
