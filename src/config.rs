// src/config.rs
//! Processor configuration, built once at the boundary.
//!
//! [`ProcessorSettings`] is the partial, unvalidated form gathered from
//! the environment and the command line; [`ProcessorSettings::validate`]
//! turns it into a [`ProcessorConfig`] the core takes by reference.
//! Only this module reads process environment variables.

use crate::constants::{
    DEFAULT_BATCH_CONCURRENCY, DEFAULT_IMAGE_DIRECTORY, DEFAULT_IMAGE_URL_PREFIX,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, MAX_ALLOWED_RETRIES,
};
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::formatting::{BlockTransform, CustomTransforms};
use crate::types::ApiKey;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_API_KEY: &str = "NOTION_API_KEY";
pub const ENV_IMAGE_DIR: &str = "NOTION_IMAGE_DIR";
pub const ENV_IMAGE_PREFIX: &str = "NOTION_IMAGE_PREFIX";
pub const ENV_MAX_RETRIES: &str = "NOTION_MAX_RETRIES";
pub const ENV_RETRY_DELAY: &str = "NOTION_RETRY_DELAY";
pub const ENV_TEST_PAGE_ID: &str = "NOTION_TEST_PAGE_ID";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Notion article IDs or URLs to process
    #[arg(required_unless_present = "test_connection")]
    pub articles: Vec<String>,

    /// Directory for the generated .md and .json files
    #[arg(short, long, default_value = "./output")]
    pub output_dir: PathBuf,

    /// Directory downloaded media is written to (default: ./output/images)
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Prefix used for media references in documents; empty for relative paths
    #[arg(long)]
    pub image_prefix: Option<String>,

    /// Number of articles processed per wave
    #[arg(short, long, default_value_t = DEFAULT_BATCH_CONCURRENCY)]
    pub concurrency: usize,

    /// Stop scheduling further articles after the first failure
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Retry whole article runs that fail
    #[arg(long, default_value_t = false)]
    pub retry: bool,

    /// Retries per remote call (0-10)
    #[arg(long, allow_negative_numbers = true)]
    pub max_retries: Option<i64>,

    /// Base delay between retries in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    pub retry_delay_ms: Option<i64>,

    /// Statuses that may be processed; articles without a status always are
    #[arg(long, value_delimiter = ',', default_values_t = ["Preview".to_string(), "Published".to_string()])]
    pub status: Vec<String>,

    /// Check connectivity by retrieving a page (default: $NOTION_TEST_PAGE_ID), then exit
    #[arg(long, value_name = "ID", num_args = 0..=1)]
    pub test_connection: Option<Option<String>>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CommandLineInput {
    /// The settings the command line overrides.
    pub fn settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            api_key: None,
            image_directory: self.image_dir.clone(),
            image_url_prefix: self.image_prefix.clone(),
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
        }
    }

    /// The page `--test-connection` retrieves, if the flag was given.
    ///
    /// Without an explicit id the flag falls back to `NOTION_TEST_PAGE_ID`.
    pub fn connection_test_page(&self) -> Option<Result<String, AppError>> {
        let explicit = self.test_connection.as_ref()?;
        let page = explicit.clone().or_else(|| {
            std::env::var(ENV_TEST_PAGE_ID)
                .ok()
                .filter(|v| !v.trim().is_empty())
        });
        Some(page.ok_or_else(|| {
            AppError::InvalidConfig(format!(
                "--test-connection needs a page ID or {}",
                ENV_TEST_PAGE_ID
            ))
        }))
    }
}

/// Unvalidated configuration; every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessorSettings {
    pub api_key: Option<String>,
    pub image_directory: Option<PathBuf>,
    pub image_url_prefix: Option<String>,
    pub max_retries: Option<i64>,
    pub retry_delay_ms: Option<i64>,
}

impl ProcessorSettings {
    /// Reads the `NOTION_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ProcessorSettings::from_env`] over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Self {
            api_key: get(ENV_API_KEY),
            image_directory: get(ENV_IMAGE_DIR).map(PathBuf::from),
            image_url_prefix: get(ENV_IMAGE_PREFIX),
            max_retries: get(ENV_MAX_RETRIES)
                .map(|v| parse_integer(ENV_MAX_RETRIES, &v))
                .transpose()?,
            retry_delay_ms: get(ENV_RETRY_DELAY)
                .map(|v| parse_integer(ENV_RETRY_DELAY, &v))
                .transpose()?,
        })
    }

    /// Values set in `overrides` win over ours.
    pub fn overridden_by(self, overrides: ProcessorSettings) -> Self {
        Self {
            api_key: overrides.api_key.or(self.api_key),
            image_directory: overrides.image_directory.or(self.image_directory),
            image_url_prefix: overrides.image_url_prefix.or(self.image_url_prefix),
            max_retries: overrides.max_retries.or(self.max_retries),
            retry_delay_ms: overrides.retry_delay_ms.or(self.retry_delay_ms),
        }
    }

    /// Applies defaults and fails fast on missing or out-of-range values.
    pub fn validate(self) -> Result<ProcessorConfig, AppError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::MissingCredential(format!("{} is not set", ENV_API_KEY))
            })?;
        let api_key = ApiKey::new(api_key)
            .map_err(|e| AppError::MissingCredential(e.to_string()))?;

        let image_directory = self
            .image_directory
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIRECTORY));
        if image_directory.as_os_str().is_empty() {
            return Err(AppError::InvalidConfig(
                "image directory must not be empty".to_string(),
            ));
        }

        let max_retries = self.max_retries.unwrap_or(i64::from(DEFAULT_MAX_RETRIES));
        if !(0..=i64::from(MAX_ALLOWED_RETRIES)).contains(&max_retries) {
            return Err(AppError::InvalidConfig(format!(
                "max retries must be between 0 and {}, got {}",
                MAX_ALLOWED_RETRIES, max_retries
            )));
        }

        let retry_delay_ms = self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS as i64);
        if retry_delay_ms < 0 {
            return Err(AppError::InvalidConfig(format!(
                "retry delay must be zero or greater, got {}ms",
                retry_delay_ms
            )));
        }

        Ok(ProcessorConfig {
            api_key,
            image_directory,
            image_url_prefix: self
                .image_url_prefix
                .unwrap_or_else(|| DEFAULT_IMAGE_URL_PREFIX.to_string()),
            max_retries: max_retries as u32,
            retry_delay: Duration::from_millis(retry_delay_ms as u64),
            media_per_article: false,
            custom_transformers: CustomTransforms::new(),
        })
    }
}

fn parse_integer(name: &str, value: &str) -> Result<i64, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::InvalidConfig(format!("{} must be an integer, got '{}'", name, value))
    })
}

/// Validated configuration consumed by the processor.
#[derive(Clone)]
pub struct ProcessorConfig {
    pub api_key: ApiKey,
    pub image_directory: PathBuf,
    /// Empty means documents reference media by relative path.
    pub image_url_prefix: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Gives every article its own `<id>` subdirectory of the image
    /// directory and of the URL prefix.
    pub media_per_article: bool,
    pub custom_transformers: CustomTransforms,
}

impl ProcessorConfig {
    /// Defaults for everything but the credential.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            image_directory: PathBuf::from(DEFAULT_IMAGE_DIRECTORY),
            image_url_prefix: DEFAULT_IMAGE_URL_PREFIX.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            media_per_article: false,
            custom_transformers: CustomTransforms::new(),
        }
    }

    /// Overrides the transform for one block type.
    pub fn with_transformer(
        mut self,
        block_type: impl Into<String>,
        transform: Arc<dyn BlockTransform>,
    ) -> Self {
        self.custom_transformers.insert(block_type.into(), transform);
        self
    }

    /// Retry policy applied to each remote call.
    pub fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.max_retries, self.retry_delay)
    }
}

impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut transformers: Vec<_> = self.custom_transformers.keys().collect();
        transformers.sort();
        f.debug_struct("ProcessorConfig")
            .field("api_key", &self.api_key)
            .field("image_directory", &self.image_directory)
            .field("image_url_prefix", &self.image_url_prefix)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("media_per_article", &self.media_per_article)
            .field("custom_transformers", &transformers)
            .finish()
    }
}

impl fmt::Display for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "API key:             {}", self.api_key)?;
        writeln!(f, "Image directory:     {}", self.image_directory.display())?;
        writeln!(f, "Image URL prefix:    {}", self.image_url_prefix)?;
        writeln!(f, "Max retries:         {}", self.max_retries)?;
        writeln!(f, "Retry delay:         {}ms", self.retry_delay.as_millis())?;
        writeln!(f, "Media per article:   {}", self.media_per_article)?;
        write!(f, "Custom transformers: {}", self.custom_transformers.len())
    }
}

/// Which environment variables are missing or recommended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentReport {
    pub missing: Vec<String>,
    pub warnings: Vec<String>,
}

impl EnvironmentReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Checks the process environment for required and recommended variables.
pub fn check_environment() -> EnvironmentReport {
    check_environment_with(|name| std::env::var(name).ok())
}

pub fn check_environment_with(lookup: impl Fn(&str) -> Option<String>) -> EnvironmentReport {
    let is_set = |name: &str| lookup(name).is_some_and(|v| !v.trim().is_empty());
    let mut report = EnvironmentReport::default();

    if !is_set(ENV_API_KEY) {
        report.missing.push(ENV_API_KEY.to_string());
    }
    let recommended = [
        (ENV_IMAGE_DIR, format!("default: {}", DEFAULT_IMAGE_DIRECTORY)),
        (ENV_IMAGE_PREFIX, format!("default: {}", DEFAULT_IMAGE_URL_PREFIX)),
        (ENV_TEST_PAGE_ID, "used by --test-connection".to_string()),
    ];
    for (name, note) in recommended {
        if !is_set(name) {
            report.warnings.push(format!("{} ({})", name, note));
        }
    }
    report
}
