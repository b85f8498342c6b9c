/*!
 * Per-string translation outcomes and per-batch statistics.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::scorer::{QualityCategory, QualityScore};

/// Engine that produced the kept translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Passed through without translation
    #[serde(rename = "skip")]
    Skip,
    /// Fast machine translation (DeepL)
    #[serde(rename = "deepl")]
    FastMt,
    /// LLM fallback (OpenAI)
    #[serde(rename = "gpt4")]
    Llm,
    /// Both engines exhausted
    #[serde(rename = "error")]
    Error,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::FastMt => "deepl",
            Self::Llm => "gpt4",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome for one (key, target language) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub target_lang: String,
    pub quality: QualityScore,
    pub provider: ProviderKind,
    pub fallback_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslationResult {
    /// Source echoed back unchanged with full marks
    pub fn skipped(key: &str, source: &str, target_lang: &str) -> Self {
        Self {
            key: key.to_string(),
            source: source.to_string(),
            translation: source.to_string(),
            target_lang: target_lang.to_string(),
            quality: QualityScore::perfect(),
            provider: ProviderKind::Skip,
            fallback_used: false,
            error: None,
        }
    }

    /// Empty translation, zero scores and the error text
    pub fn failure(
        key: &str,
        source: &str,
        target_lang: &str,
        provider: ProviderKind,
        fallback_used: bool,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            key: key.to_string(),
            source: source.to_string(),
            translation: String::new(),
            target_lang: target_lang.to_string(),
            quality: QualityScore::zeroed(error.clone()),
            provider,
            fallback_used,
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none() && !self.translation.is_empty()
    }
}

/// Counters for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStats {
    pub total: usize,
    pub skipped_count: usize,
    pub fast_mt_count: usize,
    pub llm_count: usize,
    pub failed_count: usize,
    pub green_count: usize,
    pub yellow_count: usize,
    pub red_count: usize,
}

impl TranslationStats {
    pub fn new(total: usize) -> Self {
        Self { total, ..Default::default() }
    }

    /// Count one resolved result by provider and category
    pub fn record(&mut self, result: &TranslationResult) {
        let counter = match (result.provider, &result.error) {
            (ProviderKind::Error, _) | (_, Some(_)) => {
                self.failed_count += 1;
                return;
            }
            (ProviderKind::Skip, None) => &mut self.skipped_count,
            (ProviderKind::FastMt, None) => &mut self.fast_mt_count,
            (ProviderKind::Llm, None) => &mut self.llm_count,
        };
        *counter += 1;

        match result.quality.category {
            QualityCategory::Green => self.green_count += 1,
            QualityCategory::Yellow => self.yellow_count += 1,
            QualityCategory::Red => self.red_count += 1,
        }
    }

    /// Items that ended with a usable translation
    pub fn resolved(&self) -> usize {
        self.skipped_count + self.fast_mt_count + self.llm_count
    }

    /// Share of resolved items that went through the fallback, in percent
    pub fn fallback_rate(&self) -> f64 {
        let translated = self.fast_mt_count + self.llm_count;
        if translated == 0 {
            0.0
        } else {
            self.llm_count as f64 / translated as f64 * 100.0
        }
    }
}
