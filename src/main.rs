// src/main.rs
//! Command-line entry point: fetches articles, writes documents and metadata.

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion2article::{
    check_environment, deliver, AppError, ArticleProcessor, BatchOptions, BatchResult,
    CommandLineInput, DocumentId, OutputPlan, ProcessorConfig, ProcessorSettings,
    BATCH_RETRY_POLICY,
};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CLI_IMAGE_DIRECTORY: &str = "./output/images";

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("notion2article.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)
        .with_context(|| format!("cannot open log file {}", log_file_path.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Environment first, command line on top, then validation.
///
/// Every article in a run shares the image directory, so each one gets
/// its own media subdirectory.
fn resolve_config(cli: &CommandLineInput) -> Result<ProcessorConfig, AppError> {
    let mut settings = ProcessorSettings::from_env()?.overridden_by(cli.settings());
    if settings.image_directory.is_none() {
        settings.image_directory = Some(PathBuf::from(DEFAULT_CLI_IMAGE_DIRECTORY));
    }
    let mut config = settings.validate()?;
    config.media_per_article = true;
    Ok(config)
}

fn parse_ids(inputs: &[String]) -> Result<Vec<DocumentId>, AppError> {
    inputs
        .iter()
        .map(|input| DocumentId::parse(input).map_err(AppError::from))
        .collect()
}

/// Drops articles whose status is not in `allowed`.
///
/// Articles whose metadata cannot be read are kept; the pipeline run
/// reports the real failure for them.
async fn filter_processable(
    processor: &ArticleProcessor,
    ids: Vec<DocumentId>,
    allowed: &[String],
) -> Vec<DocumentId> {
    let allowed: Vec<&str> = allowed.iter().map(String::as_str).collect();
    let mut processable = Vec::with_capacity(ids.len());

    for id in ids {
        match processor.fetcher().fetch_metadata(&id).await {
            Ok(metadata) if !metadata.is_processable(&allowed) => {
                println!(
                    "Skipping {} ('{}'): status {} is not one of {}",
                    id,
                    metadata.title,
                    metadata.status().unwrap_or_default(),
                    allowed.join(", ")
                );
            }
            Ok(_) => processable.push(id),
            Err(e) => {
                log::debug!("Could not read status of {}: {}", id, e);
                processable.push(id);
            }
        }
    }
    processable
}

/// Writes each article's document and metadata files.
fn write_articles(result: &BatchResult, output_dir: &Path) -> Result<usize, AppError> {
    let mut plan = OutputPlan::new();
    for article in &result.successful {
        plan = plan.for_article(article, output_dir)?;
    }

    let report = deliver(plan)?;
    for failed in &report.failed {
        eprintln!(
            "✗ Could not write {}: {}",
            failed.operation.path().display(),
            failed.error
        );
    }
    Ok(report.stats.operations_completed)
}

fn print_summary(result: &BatchResult, files_written: usize, output_dir: &Path) {
    for article in &result.successful {
        println!(
            "✓ {} '{}' ({} media, {}ms)",
            article.metadata.document.id,
            article.metadata.document.title,
            article.media.len(),
            article.processing_time_ms
        );
    }
    for failed in &result.failed {
        eprintln!("✗ {} [{}] {}", failed.id, failed.error.code(), failed.error);
    }
    println!(
        "📄 {} of {} article(s) processed in {}ms, {} file(s) written to {}",
        result.successful.len(),
        result.total_processed,
        result.total_time_ms,
        files_written,
        output_dir.display()
    );
}

async fn run(cli: CommandLineInput) -> Result<bool, AppError> {
    let environment = check_environment();
    for warning in &environment.warnings {
        log::debug!("Environment variable not set: {}", warning);
    }

    let config = resolve_config(&cli)?;
    log::debug!("Configuration:\n{}", config);
    let processor = ArticleProcessor::new(&config)?;

    if let Some(page) = cli.connection_test_page() {
        let page = DocumentId::parse(&page?)?;
        let ok = processor.test_connection(&page).await;
        println!(
            "{}",
            if ok {
                "✓ Connection OK"
            } else {
                "✗ Connection failed"
            }
        );
        return Ok(ok);
    }

    let ids = parse_ids(&cli.articles)?;
    let ids = filter_processable(&processor, ids, &cli.status).await;
    if ids.is_empty() {
        println!("No processable articles.");
        return Ok(true);
    }

    let mut options = BatchOptions::default()
        .with_concurrency(cli.concurrency)
        .on_progress(|completed, total| log::info!("Progress: {}/{}", completed, total));
    if cli.fail_fast {
        options = options.fail_fast();
    }

    let result = if cli.retry {
        processor
            .process_many_with_retry(&ids, &options, &BATCH_RETRY_POLICY)
            .await?
    } else {
        processor.process_many(&ids, &options).await?
    };

    let files_written = write_articles(&result, &cli.output_dir)?;
    print_summary(&result, files_written, &cli.output_dir);
    Ok(result.failed.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).context("failed to initialize logging")?;

    let all_succeeded = run(cli).await.map_err(|e| {
        let code = e.code();
        anyhow::Error::new(e).context(format!("notion2article failed [{}]", code))
    })?;
    if !all_succeeded {
        std::process::exit(1);
    }

    Ok(())
}
