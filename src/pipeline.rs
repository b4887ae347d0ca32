//! Dictionary translation pipeline
//!
//! Drives one batch run: load the source dictionary, discover the staged
//! target locales, then for each locale in turn translate every leaf of a
//! fresh clone of the source and write the result next to it.
//!
//! Strings and locales are processed strictly one at a time. A failure on
//! one leaf is logged and that leaf keeps its source text; only loading,
//! discovery and writing errors stop the run.

use crate::loader::{self, LoaderError};
use crate::mt::{MachineTranslator, MtError};
use crate::placeholder::is_protected;
use crate::tree::{self, LeafEntry, TreeError};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding one `<locale>.json` per language
    pub dictionary_dir: PathBuf,
    /// Locale of the dictionary that is read for content
    pub source_locale: String,
    /// Pause after every translation request
    pub request_delay: Duration,
    /// Log progress every this many leaves (0 disables)
    pub progress_interval: usize,
    /// Restrict the run to these discovered locales (empty means all)
    pub only: Vec<String>,
    /// Walk and discover without translating or writing
    pub dry_run: bool,
}

impl PipelineConfig {
    pub const DEFAULT_SOURCE_LOCALE: &'static str = "en";
    pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(300);
    pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

    pub fn new(dictionary_dir: impl Into<PathBuf>) -> Self {
        Self {
            dictionary_dir: dictionary_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_source_locale(mut self, locale: impl Into<String>) -> Self {
        self.source_locale = locale.into();
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dictionary_dir: PathBuf::from("dictionaries"),
            source_locale: Self::DEFAULT_SOURCE_LOCALE.to_string(),
            request_delay: Self::DEFAULT_REQUEST_DELAY,
            progress_interval: Self::DEFAULT_PROGRESS_INTERVAL,
            only: Vec::new(),
            dry_run: false,
        }
    }
}

/// Awaited between translation requests to stay under the service's rate limit
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps for a fixed delay on the tokio timer
#[derive(Debug, Clone, Copy)]
pub struct SleepPacer {
    delay: Duration,
}

impl SleepPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for SleepPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to load source dictionary: {0}")]
    SourceLoad(#[source] LoaderError),
    #[error("Failed to discover target locales: {0}")]
    Discovery(#[source] LoaderError),
    #[error("Failed to write dictionary for '{locale}': {source}")]
    Persist {
        locale: String,
        #[source]
        source: LoaderError,
    },
}

/// Why one leaf kept its source text
#[derive(Debug, thiserror::Error)]
enum LeafError {
    #[error(transparent)]
    Translate(#[from] MtError),
    #[error(transparent)]
    Rebuild(#[from] TreeError),
}

/// Counters for one target locale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleReport {
    pub locale: String,
    /// String leaves in the source dictionary
    pub total: usize,
    pub translated: usize,
    pub protected: usize,
    /// Leaves left in the source language after an error
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub source_locale: String,
    pub locales: Vec<LocaleReport>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.locales.iter().map(|report| report.failed).sum()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    translator: Arc<dyn MachineTranslator>,
    pacer: Arc<dyn Pacer>,
}

impl Pipeline {
    /// Create a pipeline that paces requests with the configured delay
    pub fn new(config: PipelineConfig, translator: Arc<dyn MachineTranslator>) -> Self {
        let pacer = Arc::new(SleepPacer::new(config.request_delay));
        Self {
            config,
            translator,
            pacer,
        }
    }

    /// Replace the pacer, e.g. with a no-op one in tests
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Locales this run will produce, in processing order
    pub fn target_locales(&self) -> Result<Vec<String>, PipelineError> {
        let discovered =
            loader::discover_target_locales(&self.config.dictionary_dir, &self.config.source_locale)
                .map_err(PipelineError::Discovery)?;

        if self.config.only.is_empty() {
            return Ok(discovered);
        }

        for requested in &self.config.only {
            if !discovered.contains(requested) {
                warn!(
                    "Locale '{}' has no staged dictionary in {}, skipping",
                    requested,
                    self.config.dictionary_dir.display()
                );
            }
        }

        Ok(discovered
            .into_iter()
            .filter(|locale| self.config.only.contains(locale))
            .collect())
    }

    /// Run the whole batch
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let source_path =
            loader::dictionary_path(&self.config.dictionary_dir, &self.config.source_locale);
        let source = loader::load_dictionary(&source_path).map_err(PipelineError::SourceLoad)?;

        let locales = self.target_locales()?;
        let entries = tree::walk(&source);

        info!(
            "Source '{}': {} strings, {} target locale(s), provider: {}",
            self.config.source_locale,
            entries.len(),
            locales.len(),
            self.translator.provider_name()
        );

        let mut report = RunReport {
            source_locale: self.config.source_locale.clone(),
            locales: Vec::with_capacity(locales.len()),
        };

        for (position, locale) in locales.iter().enumerate() {
            info!("[{}/{}] {}...", position + 1, locales.len(), locale);

            if self.config.dry_run {
                let protected = entries.iter().filter(|e| is_protected(&e.value)).count();
                report.locales.push(LocaleReport {
                    locale: locale.clone(),
                    total: entries.len(),
                    protected,
                    ..LocaleReport::default()
                });
                continue;
            }

            let (translated, locale_report) = self.translate_locale(&source, &entries, locale).await;

            let output_path = loader::dictionary_path(&self.config.dictionary_dir, locale);
            loader::write_dictionary(&output_path, &translated).map_err(|source| {
                PipelineError::Persist {
                    locale: locale.clone(),
                    source,
                }
            })?;

            info!(
                "  {}: {} translated, {} protected, {} failed -> {}",
                locale,
                locale_report.translated,
                locale_report.protected,
                locale_report.failed,
                output_path.display()
            );
            report.locales.push(locale_report);
        }

        Ok(report)
    }

    /// Produce the translated clone of `source` for one locale
    ///
    /// Never fails: leaves whose translation errors keep their source text.
    pub async fn translate_locale(
        &self,
        source: &Value,
        entries: &[LeafEntry],
        locale: &str,
    ) -> (Value, LocaleReport) {
        let mut translated = source.clone();
        let mut report = LocaleReport {
            locale: locale.to_string(),
            total: entries.len(),
            ..LocaleReport::default()
        };

        for (index, entry) in entries.iter().enumerate() {
            if is_protected(&entry.value) {
                debug!("  {} is a placeholder, kept as is", entry.display_path());
                report.protected += 1;
                continue;
            }

            match self.translate_entry(&mut translated, entry, locale).await {
                Ok(()) => report.translated += 1,
                Err(err) => {
                    error!("  Error at {} ({}): {}", entry.display_path(), locale, err);
                    report.failed += 1;
                }
            }

            let processed = index + 1;
            if self.config.progress_interval > 0 && processed % self.config.progress_interval == 0 {
                info!("  Progress: {}/{}", processed, entries.len());
            }

            self.pacer.pause().await;
        }

        (translated, report)
    }

    async fn translate_entry(
        &self,
        accumulator: &mut Value,
        entry: &LeafEntry,
        locale: &str,
    ) -> Result<(), LeafError> {
        let text = self
            .translator
            .translate(&entry.value, &self.config.source_locale, locale)
            .await?;

        debug!("  {}: {:?} -> {:?}", entry.display_path(), entry.value, text);

        tree::set_at_path(accumulator, &entry.path, Value::String(text))?;
        Ok(())
    }
}
