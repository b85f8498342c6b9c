/*!
 * Semantic review of existing translations by an LLM.
 *
 * The reviewer asks the LLM for a meaning score and a fluency score, blends
 * them into an overall score and decides whether the translation needs a
 * human look. Review never fails: a provider error becomes a zero-score
 * result whose only issue describes the failure.
 */

use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::providers::{LlmClient, Suggestion};
use crate::translation::progress::ProgressFn;

/// Suggestions requested when the caller does not say otherwise
pub const DEFAULT_SUGGESTION_COUNT: usize = 3;

/// Weights and thresholds used to judge a review
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewPolicy {
    /// Weight of the semantic score in the overall score, the rest goes to fluency
    pub semantic_weight: f64,
    /// Minimum overall score to pass
    pub pass_threshold: f64,
    /// Minimum semantic score to pass, whatever the overall score
    pub semantic_floor: f64,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            pass_threshold: 80.0,
            semantic_floor: 70.0,
        }
    }
}

/// Review of one translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewResult {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub language: String,
    /// Does the translation mean the same as the source (0-100)
    pub semantic_score: f64,
    /// Is the translation natural and grammatical (0-100)
    pub fluency_score: f64,
    pub issues: Vec<String>,
    pub suggested_fix: Option<String>,
}

impl ReviewResult {
    pub fn overall_score(&self) -> f64 {
        self.overall_score_with(&ReviewPolicy::default())
    }

    pub fn overall_score_with(&self, policy: &ReviewPolicy) -> f64 {
        self.semantic_score * policy.semantic_weight + self.fluency_score * (1.0 - policy.semantic_weight)
    }

    pub fn passed(&self) -> bool {
        self.passed_with(&ReviewPolicy::default())
    }

    pub fn passed_with(&self, policy: &ReviewPolicy) -> bool {
        self.overall_score_with(policy) >= policy.pass_threshold && self.semantic_score >= policy.semantic_floor
    }

    /// Failed, or passed with issues worth a look
    pub fn needs_attention(&self) -> bool {
        self.needs_attention_with(&ReviewPolicy::default())
    }

    pub fn needs_attention_with(&self, policy: &ReviewPolicy) -> bool {
        !self.passed_with(policy) || !self.issues.is_empty()
    }
}

/// Issues and ranked alternatives for one translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionReview {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub language: String,
    pub issues: Vec<String>,
    /// Best suggestion first
    pub suggestions: Vec<Suggestion>,
}

impl SuggestionReview {
    pub fn best(&self) -> Option<&Suggestion> {
        self.suggestions.first()
    }
}

/// One translation submitted for batch review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub context: Option<String>,
}

impl ReviewItem {
    pub fn new(key: impl Into<String>, source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            translation: translation.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// LLM-backed reviewer
#[derive(Debug, Clone)]
pub struct SemanticReviewer {
    llm: Arc<dyn LlmClient>,
}

impl SemanticReviewer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Review one translation
    pub async fn review(
        &self,
        key: &str,
        source: &str,
        translation: &str,
        target_lang: &str,
        context: Option<&str>,
    ) -> ReviewResult {
        let mut result = ReviewResult {
            key: key.to_string(),
            source: source.to_string(),
            translation: translation.to_string(),
            language: target_lang.to_string(),
            semantic_score: 0.0,
            fluency_score: 0.0,
            issues: Vec::new(),
            suggested_fix: None,
        };

        match self.llm.review(source, translation, target_lang, context).await {
            Ok(verdict) => {
                let verdict = verdict.normalized();
                result.semantic_score = verdict.semantic_score;
                result.fluency_score = verdict.fluency_score;
                result.issues = verdict.issues;
                result.suggested_fix = verdict.suggested_fix;
                debug!(
                    "Reviewed '{}' ({}): semantic {:.0}, fluency {:.0}",
                    key, target_lang, result.semantic_score, result.fluency_score
                );
            }
            Err(e) => {
                warn!("Review of '{}' ({}) failed: {}", key, target_lang, e);
                result.issues.push(format!("Review failed: {}", e));
            }
        }

        result
    }

    /// Review items one after another, in input order
    ///
    /// `progress` receives `(reviewed, total, key)` after each item.
    pub async fn review_batch(
        &self,
        items: &[ReviewItem],
        target_lang: &str,
        progress: Option<&ProgressFn<'_>>,
    ) -> Vec<ReviewResult> {
        let total = items.len();
        let mut results = Vec::with_capacity(total);

        for item in items {
            results.push(
                self.review(&item.key, &item.source, &item.translation, target_lang, item.context.as_deref())
                    .await,
            );
            if let Some(progress) = progress {
                progress(results.len(), total, item.key.as_str());
            }
        }

        results
    }

    /// List issues and ask for `count` ranked alternative translations
    pub async fn review_with_suggestions(
        &self,
        key: &str,
        source: &str,
        translation: &str,
        target_lang: &str,
        context: Option<&str>,
        count: usize,
    ) -> SuggestionReview {
        let mut result = SuggestionReview {
            key: key.to_string(),
            source: source.to_string(),
            translation: translation.to_string(),
            language: target_lang.to_string(),
            issues: Vec::new(),
            suggestions: Vec::new(),
        };

        match self
            .llm
            .review_with_suggestions(source, translation, target_lang, context, count)
            .await
        {
            Ok(verdict) => {
                let verdict = verdict.normalized(count);
                result.issues = verdict.issues;
                result.suggestions = verdict.suggestions;
            }
            Err(e) => {
                warn!("Suggestion review of '{}' ({}) failed: {}", key, target_lang, e);
                result.issues.push(format!("Review failed: {}", e));
            }
        }

        result
    }
}
