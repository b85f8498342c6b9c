/*!
 * Mock provider implementations for testing.
 *
 * This module provides scripted clients for both provider contracts:
 * - `MockFastMt::working()` / `MockLlm::working()` - always succeed
 * - `::failing()` - every call errors
 * - `::batch_failing()` - batch calls error, single calls succeed
 * - `::intermittent(n)` - every n-th call errors
 * - `::empty()` - succeed with empty text
 *
 * Every call is counted and the size of every batch is recorded so tests
 * can assert chunking and retry behavior.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{FastMtClient, FastMtTranslation, LlmClient, ReviewVerdict, Suggestion, SuggestionVerdict};

/// Behavior mode for the mock clients
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Batch calls fail, single-item calls succeed
    BatchFailing,
    /// Fails every Nth call (1-based)
    Intermittent { fail_every: usize },
    /// Succeeds with empty translations
    Empty,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Text transformation applied by a working mock: `(text, target_lang) -> translation`
pub type MockTranslateFn = fn(&str, &str) -> String;

/// Default mock translation: the text tagged with the target language
pub fn tag_with_language(text: &str, target_lang: &str) -> String {
    format!("{} [{}]", text, target_lang)
}

/// Shared call bookkeeping
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    single_calls: Arc<AtomicUsize>,
    batch_calls: Arc<AtomicUsize>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl CallLog {
    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Sizes of all batch requests, in call order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.single_calls() + self.batch_calls()
    }

    fn record_single(&self) -> usize {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.total_calls()
    }

    fn record_batch(&self, size: usize) -> usize {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().push(size);
        self.total_calls()
    }
}

fn mock_error() -> ProviderError {
    ProviderError::ConnectionError("Simulated provider failure".to_string())
}

/// Decide whether call number `call` (1-based) fails
async fn gate(behavior: MockBehavior, call: usize, is_batch: bool) -> Result<(), ProviderError> {
    match behavior {
        MockBehavior::Failing => Err(mock_error()),
        MockBehavior::BatchFailing if is_batch => Err(mock_error()),
        MockBehavior::Intermittent { fail_every } if fail_every > 0 && call % fail_every == 0 => Err(mock_error()),
        MockBehavior::Slow { delay_ms } => {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Scripted fast-MT client
#[derive(Debug, Clone)]
pub struct MockFastMt {
    behavior: MockBehavior,
    translate: MockTranslateFn,
    calls: CallLog,
}

impl MockFastMt {
    /// Create a new mock client with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            translate: tag_with_language,
            calls: CallLog::default(),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn batch_failing() -> Self {
        Self::new(MockBehavior::BatchFailing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom translation function
    pub fn with_translation(mut self, translate: MockTranslateFn) -> Self {
        self.translate = translate;
        self
    }

    /// Call counters, shared with clones of this client
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    fn produce(&self, text: &str, target_lang: &str) -> FastMtTranslation {
        if self.behavior == MockBehavior::Empty {
            return FastMtTranslation::default();
        }
        FastMtTranslation {
            text: (self.translate)(text, target_lang),
            detected_source_lang: Some("EN".to_string()),
        }
    }
}

#[async_trait]
impl FastMtClient for MockFastMt {
    async fn translate_one(
        &self,
        text: &str,
        target_lang: &str,
        _source_lang: Option<&str>,
    ) -> Result<FastMtTranslation, ProviderError> {
        let call = self.calls.record_single();
        gate(self.behavior, call, false).await?;
        Ok(self.produce(text, target_lang))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        _source_lang: Option<&str>,
    ) -> Result<Vec<FastMtTranslation>, ProviderError> {
        let call = self.calls.record_batch(texts.len());
        gate(self.behavior, call, true).await?;
        Ok(texts.iter().map(|t| self.produce(t, target_lang)).collect())
    }

    fn name(&self) -> &str {
        "MockFastMt"
    }
}

/// Scripted LLM client
#[derive(Debug, Clone)]
pub struct MockLlm {
    behavior: MockBehavior,
    translate: MockTranslateFn,
    /// Batch positions to leave out of every batch reply
    dropped_positions: Vec<usize>,
    review: ReviewVerdict,
    calls: CallLog,
    review_calls: Arc<AtomicUsize>,
    glossaries: Arc<Mutex<Vec<Vec<(String, String)>>>>,
}

impl MockLlm {
    /// Create a new mock client with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            translate: tag_with_language,
            dropped_positions: Vec::new(),
            review: ReviewVerdict {
                semantic_score: 95.0,
                fluency_score: 90.0,
                issues: Vec::new(),
                suggested_fix: None,
            },
            calls: CallLog::default(),
            review_calls: Arc::new(AtomicUsize::new(0)),
            glossaries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn batch_failing() -> Self {
        Self::new(MockBehavior::BatchFailing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom translation function
    pub fn with_translation(mut self, translate: MockTranslateFn) -> Self {
        self.translate = translate;
        self
    }

    /// Leave the given batch positions out of batch replies
    pub fn dropping(mut self, positions: &[usize]) -> Self {
        self.dropped_positions = positions.to_vec();
        self
    }

    /// Verdict returned by every review call
    pub fn with_review(mut self, review: ReviewVerdict) -> Self {
        self.review = review;
        self
    }

    /// Call counters, shared with clones of this client
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn review_calls(&self) -> usize {
        self.review_calls.load(Ordering::SeqCst)
    }

    /// Glossaries received by translation calls, in call order
    pub fn glossaries(&self) -> Vec<Vec<(String, String)>> {
        self.glossaries.lock().clone()
    }

    fn produce(&self, text: &str, target_lang: &str) -> String {
        if self.behavior == MockBehavior::Empty {
            return String::new();
        }
        (self.translate)(text, target_lang)
    }

    async fn review_gate(&self) -> Result<(), ProviderError> {
        let call = self.review_calls.fetch_add(1, Ordering::SeqCst) + 1;
        gate(self.behavior, call, false).await
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn translate_one(
        &self,
        text: &str,
        target_lang: &str,
        _context: Option<&str>,
        glossary: &[(String, String)],
    ) -> Result<String, ProviderError> {
        let call = self.calls.record_single();
        self.glossaries.lock().push(glossary.to_vec());
        gate(self.behavior, call, false).await?;
        Ok(self.produce(text, target_lang))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        _context: Option<&str>,
        glossary: &[(String, String)],
    ) -> Result<Vec<String>, ProviderError> {
        let call = self.calls.record_batch(texts.len());
        self.glossaries.lock().push(glossary.to_vec());
        gate(self.behavior, call, true).await?;
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if self.dropped_positions.contains(&i) {
                    String::new()
                } else {
                    self.produce(t, target_lang)
                }
            })
            .collect())
    }

    async fn review(
        &self,
        _source: &str,
        _translation: &str,
        _target_lang: &str,
        _context: Option<&str>,
    ) -> Result<ReviewVerdict, ProviderError> {
        self.review_gate().await?;
        Ok(self.review.clone())
    }

    async fn review_with_suggestions(
        &self,
        _source: &str,
        translation: &str,
        _target_lang: &str,
        _context: Option<&str>,
        count: usize,
    ) -> Result<SuggestionVerdict, ProviderError> {
        self.review_gate().await?;
        let suggestions = (1..=count)
            .map(|i| Suggestion {
                text: format!("{} (option {})", translation, i),
                explanation: format!("Alternative phrasing {}", i),
            })
            .collect();
        Ok(SuggestionVerdict {
            issues: self.review.issues.clone(),
            suggestions,
        })
    }

    fn name(&self) -> &str {
        "MockLlm"
    }
}
