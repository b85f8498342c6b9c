/*!
 * Heuristic translation quality scoring.
 *
 * Four independent sub-scores on a 0-100 scale are blended into one
 * overall score:
 * - Placeholder integrity (40%)
 * - Glossary compliance (25%)
 * - Length ratio (20%)
 * - Whitespace and line structure (15%)
 *
 * The category follows from the scores alone. Any placeholder problem
 * forces `red`, whatever the other dimensions say.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::translation::glossary::Glossary;
use crate::validation::placeholders;

/// Weight of the placeholder sub-score
pub const PLACEHOLDER_WEIGHT: f64 = 0.40;
/// Weight of the glossary sub-score
pub const GLOSSARY_WEIGHT: f64 = 0.25;
/// Weight of the length sub-score
pub const LENGTH_WEIGHT: f64 = 0.20;
/// Weight of the format sub-score
pub const FORMAT_WEIGHT: f64 = 0.15;

/// Overall score from which a translation is auto-approved
pub const GREEN_THRESHOLD: f64 = 95.0;
/// Overall score from which a translation only needs review
pub const YELLOW_THRESHOLD: f64 = 80.0;

/// Default maximum translation/source length ratio
pub const DEFAULT_MAX_LENGTH_RATIO: f64 = 1.5;

/// Acceptance bucket of a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityCategory {
    /// Auto-approve
    Green,
    /// Needs human review
    Yellow,
    /// Rejected
    Red,
}

impl QualityCategory {
    /// Category for a placeholder sub-score and an overall score
    pub fn from_scores(placeholder_score: f64, overall: f64) -> Self {
        if placeholder_score < 100.0 {
            Self::Red
        } else if overall >= GREEN_THRESHOLD {
            Self::Green
        } else if overall >= YELLOW_THRESHOLD {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for QualityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality breakdown of one translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Weighted blend of the sub-scores, rounded to two decimals
    pub overall: f64,
    pub placeholder_score: f64,
    pub glossary_score: f64,
    pub length_score: f64,
    pub format_score: f64,
    pub category: QualityCategory,
    /// Human-readable findings from every dimension
    pub issues: Vec<String>,
}

impl QualityScore {
    /// Build a score from the four sub-scores
    pub fn from_parts(
        placeholder_score: f64,
        glossary_score: f64,
        length_score: f64,
        format_score: f64,
        issues: Vec<String>,
    ) -> Self {
        let overall = round2(
            placeholder_score * PLACEHOLDER_WEIGHT
                + glossary_score * GLOSSARY_WEIGHT
                + length_score * LENGTH_WEIGHT
                + format_score * FORMAT_WEIGHT,
        );

        Self {
            overall,
            placeholder_score,
            glossary_score,
            length_score,
            format_score,
            category: QualityCategory::from_scores(placeholder_score, overall),
            issues,
        }
    }

    /// Full marks, used for strings passed through untranslated
    pub fn perfect() -> Self {
        Self::from_parts(100.0, 100.0, 100.0, 100.0, Vec::new())
    }

    /// Zero across the board, carrying the reason as the only issue
    pub fn zeroed(reason: impl Into<String>) -> Self {
        Self::from_parts(0.0, 0.0, 0.0, 0.0, vec![reason.into()])
    }

    pub fn passed(&self) -> bool {
        matches!(self.category, QualityCategory::Green | QualityCategory::Yellow)
    }

    pub fn needs_review(&self) -> bool {
        self.category == QualityCategory::Yellow
    }

    pub fn failed(&self) -> bool {
        self.category == QualityCategory::Red
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores translations against placeholder, glossary, length and format rules
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    glossary: Glossary,
}

impl QualityScorer {
    pub fn new(glossary: Glossary) -> Self {
        Self { glossary }
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Score a translation of `source` into `target_lang`
    ///
    /// `required_terms` lists the glossary terms to enforce. Terms that do
    /// not occur in the source are ignored.
    pub fn score(
        &self,
        source: &str,
        translation: &str,
        target_lang: &str,
        max_length_ratio: f64,
        required_terms: Option<&[String]>,
    ) -> QualityScore {
        let mut issues = Vec::new();

        let placeholder_score = Self::score_placeholders(source, translation, &mut issues);
        let glossary_score = self.score_glossary(source, translation, target_lang, required_terms, &mut issues);
        let length_score = Self::score_length(source, translation, max_length_ratio, &mut issues);
        let format_score = Self::score_format(source, translation, &mut issues);

        QualityScore::from_parts(placeholder_score, glossary_score, length_score, format_score, issues)
    }

    fn score_placeholders(source: &str, translation: &str, issues: &mut Vec<String>) -> f64 {
        let validation = placeholders::validate(source, translation);
        if validation.is_valid && validation.issues.is_empty() {
            return 100.0;
        }

        issues.extend(validation.issues.iter().map(|i| i.message.clone()));

        if validation.critical_count() > 0 {
            0.0
        } else {
            (100.0 - 20.0 * validation.warning_count() as f64).max(0.0)
        }
    }

    fn score_glossary(
        &self,
        source: &str,
        translation: &str,
        target_lang: &str,
        required_terms: Option<&[String]>,
        issues: &mut Vec<String>,
    ) -> f64 {
        let terms = match required_terms {
            Some(terms) if !terms.is_empty() => terms,
            _ => return 100.0,
        };
        if !self.glossary.has_language(target_lang) {
            return 100.0;
        }

        let source_lower = source.to_lowercase();
        let translation_lower = translation.to_lowercase();
        let mut matched = 0usize;
        let mut total = 0usize;
        let mut term_issues = Vec::new();

        for term in terms {
            if !source_lower.contains(&term.to_lowercase()) {
                continue;
            }
            total += 1;
            // A term without an entry for this language can never match
            let Some(expected) = self.glossary.lookup(term, target_lang) else {
                continue;
            };
            if translation_lower.contains(&expected.to_lowercase()) {
                matched += 1;
            } else {
                term_issues.push(format!("Glossary term '{}' should be translated as '{}'", term, expected));
            }
        }

        if total == 0 {
            return 100.0;
        }

        issues.extend(term_issues);
        matched as f64 / total as f64 * 100.0
    }

    fn score_length(source: &str, translation: &str, max_ratio: f64, issues: &mut Vec<String>) -> f64 {
        if source.is_empty() || translation.is_empty() {
            return 100.0;
        }

        let ratio = translation.chars().count() as f64 / source.chars().count() as f64;

        if ratio <= max_ratio {
            100.0
        } else if ratio <= max_ratio * 1.25 {
            issues.push(format!("Translation is {:.1}x longer than source", ratio));
            80.0
        } else if ratio <= max_ratio * 1.5 {
            issues.push(format!("Translation is significantly longer ({:.1}x)", ratio));
            60.0
        } else {
            issues.push(format!("Translation is too long ({:.1}x source length)", ratio));
            40.0
        }
    }

    fn score_format(source: &str, translation: &str, issues: &mut Vec<String>) -> f64 {
        let mut score: f64 = 100.0;

        let source_newlines = source.matches('\n').count();
        let translated_newlines = translation.matches('\n').count();
        if source_newlines != translated_newlines {
            score -= 20.0;
            issues.push(format!("Newline count changed: {} → {}", source_newlines, translated_newlines));
        }

        if source.starts_with(' ') != translation.starts_with(' ') {
            score -= 10.0;
            issues.push("Leading whitespace changed".to_string());
        }

        if source.ends_with(' ') != translation.ends_with(' ') {
            score -= 10.0;
            issues.push("Trailing whitespace changed".to_string());
        }

        if !source.contains("  ") && translation.contains("  ") {
            score -= 5.0;
            issues.push("Double spaces introduced".to_string());
        }

        score.max(0.0)
    }
}
