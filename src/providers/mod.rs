/*!
 * Provider implementations for the translation services.
 *
 * This module defines the two client contracts the translator depends on and
 * contains their implementations:
 * - DeepL: fast machine translation, trusted to keep batch order
 * - OpenAI: LLM fallback and semantic review, batches reconciled by ID
 * - Mock: scripted clients for tests
 */

use async_trait::async_trait;
use log::error;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::errors::ProviderError;

pub mod deepl;
pub mod mock;
pub mod openai;

/// One fast-MT translation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FastMtTranslation {
    /// Translated text
    pub text: String,
    /// Source language reported by the service, if any
    pub detected_source_lang: Option<String>,
}

impl FastMtTranslation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), detected_source_lang: None }
    }
}

/// Fast machine-translation service
///
/// Batch calls must return exactly one item per input text, in input order.
#[async_trait]
pub trait FastMtClient: Send + Sync + Debug {
    /// Translate a single text
    async fn translate_one(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<FastMtTranslation, ProviderError>;

    /// Translate several texts in one request
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<Vec<FastMtTranslation>, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Large-language-model service used for fallback translation and review
///
/// `glossary` holds `(term, required translation)` pairs for the target language.
#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    /// Translate a single text
    async fn translate_one(
        &self,
        text: &str,
        target_lang: &str,
        context: Option<&str>,
        glossary: &[(String, String)],
    ) -> Result<String, ProviderError>;

    /// Translate several texts in one structured request
    ///
    /// The result has one entry per input text in input order. Items the
    /// service did not return come back as empty strings.
    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        context: Option<&str>,
        glossary: &[(String, String)],
    ) -> Result<Vec<String>, ProviderError>;

    /// Judge an existing translation for meaning and fluency
    async fn review(
        &self,
        source: &str,
        translation: &str,
        target_lang: &str,
        context: Option<&str>,
    ) -> Result<ReviewVerdict, ProviderError>;

    /// List issues and propose `count` alternative translations
    async fn review_with_suggestions(
        &self,
        source: &str,
        translation: &str,
        target_lang: &str,
        context: Option<&str>,
        count: usize,
    ) -> Result<SuggestionVerdict, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured review reply from the LLM
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReviewVerdict {
    #[serde(default, deserialize_with = "null_as_default")]
    pub semantic_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fluency_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
}

impl ReviewVerdict {
    /// Clamp scores to 0-100 and drop blank issues and fixes
    pub fn normalized(mut self) -> Self {
        self.semantic_score = self.semantic_score.clamp(0.0, 100.0);
        self.fluency_score = self.fluency_score.clamp(0.0, 100.0);
        self.issues.retain(|issue| !issue.trim().is_empty());
        self.suggested_fix = self.suggested_fix.filter(|fix| !fix.trim().is_empty());
        self
    }
}

/// One alternative translation proposed by the LLM
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
}

/// Structured suggestion reply from the LLM
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SuggestionVerdict {
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<Suggestion>,
}

impl SuggestionVerdict {
    /// Drop empty suggestions and keep at most `count`
    pub fn normalized(mut self, count: usize) -> Self {
        self.issues.retain(|issue| !issue.trim().is_empty());
        self.suggestions.retain(|s| !s.text.trim().is_empty());
        self.suggestions.truncate(count);
        self
    }
}

/// Retry settings for transient provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, backoff_base_ms: 1000 }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self { max_retries, backoff_base_ms }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self { max_retries: 0, backoff_base_ms: 0 }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << shift))
    }

    /// Run `operation`, retrying transient errors with exponential backoff
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    error!("{} failed: {} - attempt {}/{}", operation_name, e, attempt, self.max_retries + 1);
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
