use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, value_parser};
use dictionary_mt::mt::{DEFAULT_ENDPOINT, GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator};
use dictionary_mt::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

fn cli() -> Command {
    Command::new("dictionary-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Regenerate every staged locale dictionary from the source one by machine translation")
        .arg(
            Arg::new("dir")
                .long("dir")
                .short('d')
                .env("DICTIONARY_DIR")
                .help("Directory holding one <locale>.json per language")
                .default_value("dictionaries")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code (default: en)")
                .default_value(PipelineConfig::DEFAULT_SOURCE_LOCALE),
        )
        .arg(
            Arg::new("delay-ms")
                .long("delay-ms")
                .env("TRANSLATE_REQUEST_DELAY_MS")
                .help("Pause after every translation request, in milliseconds")
                .default_value("300")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("progress-every")
                .long("progress-every")
                .help("Log progress every N strings (0 disables)")
                .default_value("10")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .env("TRANSLATE_ENDPOINT")
                .help("Translation endpoint URL")
                .default_value(DEFAULT_ENDPOINT),
        )
        .arg(
            Arg::new("only")
                .long("only")
                .short('o')
                .help("Only regenerate this locale (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of Google Translate")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Count strings and list target locales without translating")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every translated string")
                .action(ArgAction::SetTrue),
        )
}

fn config_from(matches: &clap::ArgMatches) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    if let Some(dir) = matches.get_one::<PathBuf>("dir") {
        config.dictionary_dir = dir.clone();
    }
    if let Some(source) = matches.get_one::<String>("source-locale") {
        config.source_locale = source.clone();
    }
    if let Some(delay) = matches.get_one::<u64>("delay-ms") {
        config.request_delay = Duration::from_millis(*delay);
    }
    if let Some(every) = matches.get_one::<usize>("progress-every") {
        config.progress_interval = *every;
    }
    config.only = matches
        .get_many::<String>("only")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    config.dry_run = matches.get_flag("dry-run");
    config
}

/// `--verbose` raises the default level to debug on top of `RUST_LOG`
fn log_filter(env_filter: EnvFilter, verbose: bool) -> EnvFilter {
    if verbose {
        env_filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        env_filter
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env_filter, matches.get_flag("verbose")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = config_from(&matches);

    let translator: Arc<dyn MachineTranslator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::Suffix))
    } else {
        let endpoint = matches
            .get_one::<String>("endpoint")
            .map(String::as_str)
            .unwrap_or(DEFAULT_ENDPOINT);
        Arc::new(
            GoogleTranslateProvider::with_endpoint(endpoint)
                .context("Failed to initialize translator")?,
        )
    };

    info!(
        "Translating dictionaries in {} from '{}'",
        config.dictionary_dir.display(),
        config.source_locale
    );

    let report = Pipeline::new(config, translator)
        .run()
        .await
        .context("Dictionary translation failed")?;

    if report.locales.is_empty() {
        warn!("No target locales found; stage an empty <locale>.json to add one");
    }

    let failed = report.failed();
    if failed > 0 {
        warn!(
            "{} string(s) kept their '{}' text after translation errors",
            failed, report.source_locale
        );
    }

    info!("Done: {} locale(s)", report.locales.len());
    Ok(())
}
