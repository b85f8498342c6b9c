/*!
 * Format-specifier integrity checks.
 *
 * iOS strings carry printf-style placeholders (`%@`, `%d`, `%lld`, `%.2f`,
 * `%1$@`, `%%`). A translation that drops, adds or retypes one of them
 * crashes the app at runtime, so every comparison here is on exact literal
 * tokens: `%d` and `%ld` are different placeholders.
 *
 * Positional placeholders (`%1$@`) may move freely. Plain ones may not
 * change relative order without a warning.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Single token grammar: `%`, optional `N$`, flags, width, precision,
/// length modifier and conversion, or the literal `%%` escape.
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"%(?:(\d+\$)?[-+0 #]*(?:\d+|\*)?(?:\.(?:\d+|\*))?(?:hh|h|ll|l|L|z|j|t)?[diouxXeEfFgGaAcspn@]|%)",
    )
    .expect("Invalid placeholder regex")
});

/// Kind of placeholder problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    CountMismatch,
    Missing,
    Extra,
    OrderChanged,
}

/// How bad a placeholder problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Will break formatting at runtime
    Critical,
    /// Suspicious but not necessarily wrong
    Warning,
}

/// One problem found while comparing placeholders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl PlaceholderIssue {
    fn critical(kind: IssueKind, message: String) -> Self {
        Self { kind, severity: Severity::Critical, message }
    }

    fn warning(kind: IssueKind, message: String) -> Self {
        Self { kind, severity: Severity::Warning, message }
    }
}

impl fmt::Display for PlaceholderIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of comparing the placeholders of a source and its translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderValidation {
    /// No critical issue was found
    pub is_valid: bool,
    pub issues: Vec<PlaceholderIssue>,
}

impl PlaceholderValidation {
    pub fn critical_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Critical).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }
}

/// Extract placeholder tokens in order of appearance
pub fn extract_placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER_REGEX.find_iter(text).map(|m| m.as_str()).collect()
}

/// Number of placeholder tokens in a string
pub fn placeholder_count(text: &str) -> usize {
    PLACEHOLDER_REGEX.find_iter(text).count()
}

/// Whether a string contains any placeholder token
pub fn has_placeholders(text: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(text)
}

fn is_positional(token: &str) -> bool {
    token.contains('$')
}

/// Tokens of `left` that never occur in `right`, each reported once, in order
fn difference<'a>(left: &[&'a str], right: &[&str]) -> Vec<&'a str> {
    let right: HashSet<&str> = right.iter().copied().collect();
    let mut seen = HashSet::new();
    left.iter()
        .copied()
        .filter(|token| !right.contains(token) && seen.insert(*token))
        .collect()
}

/// Compare the placeholders of a translation against its source
pub fn validate(source: &str, translation: &str) -> PlaceholderValidation {
    let source_tokens = extract_placeholders(source);
    let translated_tokens = extract_placeholders(translation);
    let mut issues = Vec::new();

    if source_tokens.len() != translated_tokens.len() {
        issues.push(PlaceholderIssue::critical(
            IssueKind::CountMismatch,
            format!(
                "Placeholder count mismatch: source has {}, translation has {}",
                source_tokens.len(),
                translated_tokens.len()
            ),
        ));
    }

    for token in difference(&source_tokens, &translated_tokens) {
        issues.push(PlaceholderIssue::critical(
            IssueKind::Missing,
            format!("Missing placeholder in translation: {}", token),
        ));
    }

    for token in difference(&translated_tokens, &source_tokens) {
        issues.push(PlaceholderIssue::critical(
            IssueKind::Extra,
            format!("Extra placeholder in translation: {}", token),
        ));
    }

    if issues.is_empty() {
        let source_plain: Vec<&str> = source_tokens.iter().copied().filter(|t| !is_positional(t)).collect();
        let translated_plain: Vec<&str> = translated_tokens.iter().copied().filter(|t| !is_positional(t)).collect();

        if source_plain != translated_plain {
            let mut a = source_plain.clone();
            let mut b = translated_plain.clone();
            a.sort_unstable();
            b.sort_unstable();
            if a == b {
                issues.push(PlaceholderIssue::warning(
                    IssueKind::OrderChanged,
                    "Non-positional placeholder order changed (may cause runtime issues)".to_string(),
                ));
            }
        }
    }

    let is_valid = !issues.iter().any(|i| i.severity == Severity::Critical);
    PlaceholderValidation { is_valid, issues }
}
