use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language of the catalogs (ISO code)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Languages translated when none are given on the command line
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Translation pipeline settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Fast machine-translation service
    #[serde(default)]
    pub deepl: DeepLConfig,

    /// LLM service used for fallback and review
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Minimum overall score (0-100) for a fast-MT translation to be kept
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Largest accepted translation/source length ratio
    #[serde(default = "default_max_length_ratio")]
    pub max_length_ratio: f64,

    /// Strings per fast-MT request
    #[serde(default = "default_fast_mt_batch_size")]
    pub fast_mt_batch_size: usize,

    /// Strings per LLM request
    #[serde(default = "default_llm_batch_size")]
    pub llm_batch_size: usize,

    /// Short description of the product, used in LLM prompts
    #[serde(default = "default_app_context")]
    pub app_context: String,

    /// Optional glossary file: `{ "term": { "de": "...", "fr": "..." } }`
    #[serde(default)]
    pub glossary_path: Option<String>,

    /// Alternatives requested per string by `verify`
    #[serde(default = "default_review_suggestions")]
    pub review_suggestions: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            max_length_ratio: default_max_length_ratio(),
            fast_mt_batch_size: default_fast_mt_batch_size(),
            llm_batch_size: default_llm_batch_size(),
            app_context: default_app_context(),
            glossary_path: None,
            review_suggestions: default_review_suggestions(),
        }
    }
}

/// DeepL service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeepLConfig {
    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL, chosen from the key when empty
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Formality preference (`less`, `more`, `prefer_less`, `prefer_more`)
    #[serde(default)]
    pub formality: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_deepl_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for DeepLConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            formality: None,
            timeout_secs: default_deepl_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// OpenAI service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpenAIConfig {
    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Temperature for translation requests
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Temperature for review requests
    #[serde(default = "default_review_temperature")]
    pub review_temperature: f32,

    /// Completion budget for single translations and reviews
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Completion budget for batch translations
    #[serde(default = "default_batch_max_tokens")]
    pub batch_max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            model: default_openai_model(),
            temperature: default_temperature(),
            review_temperature: default_review_temperature(),
            max_tokens: default_max_tokens(),
            batch_max_tokens: default_batch_max_tokens(),
            timeout_secs: default_openai_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_languages() -> Vec<String> {
    ["de", "fr", "it", "es", "ro"].iter().map(|l| l.to_string()).collect()
}

fn default_quality_threshold() -> f64 {
    80.0
}

fn default_max_length_ratio() -> f64 {
    1.5
}

fn default_fast_mt_batch_size() -> usize {
    50
}

fn default_llm_batch_size() -> usize {
    20
}

fn default_app_context() -> String {
    "mobile app".to_string()
}

fn default_review_suggestions() -> usize {
    3
}

fn default_deepl_timeout_secs() -> u64 {
    30
}

fn default_openai_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-5-mini-2025-08-07".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_review_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    500
}

fn default_batch_max_tokens() -> u32 {
    4000
}

impl Config {
    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    ///
    /// Credentials are checked separately by `missing_credentials`, so that
    /// commands which never call a provider work without keys.
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)?;
        for language in &self.target_languages {
            crate::language_utils::validate_language_code(language)?;
        }

        let translation = &self.translation;
        if !(0.0..=100.0).contains(&translation.quality_threshold) {
            return Err(anyhow!(
                "Quality threshold must be between 0 and 100, got {}",
                translation.quality_threshold
            ));
        }
        if translation.max_length_ratio <= 0.0 {
            return Err(anyhow!("Max length ratio must be positive"));
        }
        if translation.fast_mt_batch_size == 0 || translation.llm_batch_size == 0 {
            return Err(anyhow!("Batch sizes must be greater than zero"));
        }

        if !self.deepl.endpoint.is_empty() {
            Url::parse(&self.deepl.endpoint).context(format!("Invalid DeepL endpoint: {}", self.deepl.endpoint))?;
        }
        Url::parse(&self.openai.endpoint).context(format!("Invalid OpenAI endpoint: {}", self.openai.endpoint))?;

        Ok(())
    }

    /// Names of the API keys that are not configured
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.deepl.api_key.trim().is_empty() {
            missing.push("DEEPL_API_KEY");
        }
        if self.openai.api_key.trim().is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        missing
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_languages: default_target_languages(),
            translation: TranslationConfig::default(),
            deepl: DeepLConfig::default(),
            openai: OpenAIConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
