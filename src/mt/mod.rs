//! Machine Translation Module
//!
//! This module provides the translation client used by the dictionary
//! pipeline: a provider-agnostic `MachineTranslator` trait, a Google
//! Translate implementation and a deterministic mock for tests and
//! offline runs.
//!
//! # Example
//!
//! ```ignore
//! use dictionary_mt::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::new()?;
//!     let translated = provider.translate("Save changes", "en", "fr").await?;
//!     println!("{}", translated);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod google_translate;
pub mod mock;
pub mod translator;

pub use error::{MtError, MtResult};
pub use google_translate::{DEFAULT_ENDPOINT, GoogleTranslateProvider, extract_translation};
pub use mock::{MockCall, MockMode, MockTranslator};
pub use translator::{MachineTranslator, validate_locale};
