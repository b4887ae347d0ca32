//! Machine translation of JSON dictionaries
//!
//! Takes the source-language dictionary in a directory of `<locale>.json`
//! files and regenerates every other staged locale from it through a
//! machine translation provider. The tree shape of the source is kept
//! exactly, and values that are a single placeholder token (`{name}`) are
//! copied verbatim.
//!
//! # Workflow Example
//!
//! ```ignore
//! use dictionary_mt::mt::GoogleTranslateProvider;
//! use dictionary_mt::{Pipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::new("dictionaries");
//!     let provider = GoogleTranslateProvider::new()?;
//!     let report = Pipeline::new(config, Arc::new(provider)).run().await?;
//!     println!("{} leaves failed", report.failed());
//!     Ok(())
//! }
//! ```

pub mod loader;
pub mod mt;
pub mod pipeline;
pub mod placeholder;
pub mod tree;

// End-to-end pipeline tests (only available during testing)
#[cfg(test)]
mod integration_tests;

pub use loader::{
    LoaderError, dictionary_path, discover_target_locales, load_dictionary, write_dictionary,
};
pub use pipeline::{
    LocaleReport, Pacer, Pipeline, PipelineConfig, PipelineError, RunReport, SleepPacer,
};
pub use placeholder::is_protected;
pub use tree::{LeafEntry, PathSegment, TreeError, rebuild, set_at_path, walk};
