/*!
 * Tests for quality scoring, placeholder validation and skip filters
 */

use xclate::translation::Glossary;
use xclate::translation::filters::{is_non_translatable, should_skip};
use xclate::validation::placeholders::{self, IssueKind, Severity};
use xclate::validation::scorer::{
    DEFAULT_MAX_LENGTH_RATIO, FORMAT_WEIGHT, GLOSSARY_WEIGHT, LENGTH_WEIGHT, PLACEHOLDER_WEIGHT,
};
use xclate::validation::{QualityCategory, QualityScorer};

fn deck_scorer() -> (QualityScorer, Vec<String>) {
    let glossary = Glossary::new().with_term("Deck", "fr", "Paquet");
    let terms = glossary.terms();
    (QualityScorer::new(glossary), terms)
}

/// Test that the four weights make up the whole score
#[test]
fn test_weights_shouldSumToOne() {
    let sum = PLACEHOLDER_WEIGHT + GLOSSARY_WEIGHT + LENGTH_WEIGHT + FORMAT_WEIGHT;
    assert!((sum - 1.0).abs() < 1e-9);
}

/// Test a clean translation with placeholders
#[test]
fn test_score_withFaithfulTranslation_shouldBeGreen() {
    let scorer = QualityScorer::default();
    let score = scorer.score(
        "Hello %@, you have %d new messages",
        "Hallo %@, du hast %d neue Nachrichten",
        "de",
        DEFAULT_MAX_LENGTH_RATIO,
        None,
    );

    assert_eq!(score.overall, 100.0);
    assert_eq!(score.category, QualityCategory::Green);
    assert!(score.issues.is_empty());
    assert!(score.passed());
}

/// Test that a dropped placeholder zeroes the placeholder dimension
#[test]
fn test_score_withMissingPlaceholder_shouldBeRed() {
    let scorer = QualityScorer::default();
    let score = scorer.score("Delete %lld cards?", "Karten löschen?", "de", DEFAULT_MAX_LENGTH_RATIO, None);

    assert_eq!(score.placeholder_score, 0.0);
    assert_eq!(score.overall, 60.0);
    assert_eq!(score.category, QualityCategory::Red);
    assert!(score.issues.iter().any(|i| i.contains("%lld")));
}

/// Test that a reordered plain placeholder is a warning that still forces red
#[test]
fn test_score_withReorderedPlaceholders_shouldBeRedDespiteHighOverall() {
    let scorer = QualityScorer::default();
    let score = scorer.score("%@ sent %d files", "%d files by %@", "en", DEFAULT_MAX_LENGTH_RATIO, None);

    assert_eq!(score.placeholder_score, 80.0);
    assert_eq!(score.overall, 92.0);
    assert_eq!(score.category, QualityCategory::Red);
}

/// Test that positional placeholders may move without any issue
#[test]
fn test_validate_withMovedPositionalPlaceholders_shouldPass() {
    let result = placeholders::validate("%1$@ invited %2$@", "%2$@ wurde von %1$@ eingeladen");
    assert!(result.is_valid);
    assert!(result.issues.is_empty());
}

/// Test that a changed length modifier counts as a different placeholder
#[test]
fn test_validate_withRetypedPlaceholder_shouldReportMissingAndExtra() {
    let result = placeholders::validate("%lld items", "%d Elemente");
    assert!(!result.is_valid);
    assert!(result.issues.iter().any(|i| i.kind == IssueKind::Missing && i.message.contains("%lld")));
    assert!(result.issues.iter().any(|i| i.kind == IssueKind::Extra && i.message.contains("%d")));
    assert!(result.issues.iter().all(|i| i.severity == Severity::Critical));
}

/// Test placeholder extraction helpers
#[test]
fn test_extractPlaceholders_withEscapedPercent_shouldIncludeIt() {
    assert_eq!(placeholders::extract_placeholders("100%% of %.1f"), vec!["%%", "%.1f"]);
    assert_eq!(placeholders::placeholder_count("%1$@ and %2$lld"), 2);
    assert!(!placeholders::has_placeholders("No tokens here"));
}

/// Test glossary compliance for a language with required terms
#[test]
fn test_score_withGlossaryTerm_shouldCheckRequiredTranslation() {
    let (scorer, terms) = deck_scorer();

    let good = scorer.score("Open Deck", "Ouvrir Paquet", "fr", DEFAULT_MAX_LENGTH_RATIO, Some(&terms));
    assert_eq!(good.glossary_score, 100.0);
    assert_eq!(good.category, QualityCategory::Green);

    let bad = scorer.score("Open Deck", "Ouvrir deck", "fr", DEFAULT_MAX_LENGTH_RATIO, Some(&terms));
    assert_eq!(bad.glossary_score, 0.0);
    assert_eq!(bad.overall, 75.0);
    assert_eq!(bad.category, QualityCategory::Red);
    assert!(bad.issues.iter().any(|i| i.contains("'Paquet'")));
}

/// Test that a required term without an entry for the target language counts as unmatched
#[test]
fn test_score_withTermMissingForTargetLanguage_shouldCountItUnmatched() {
    let glossary = Glossary::new()
        .with_term("Deck", "fr", "Paquet")
        .with_term("Card", "de", "Karte");
    let terms = glossary.terms();
    let scorer = QualityScorer::new(glossary);

    let score = scorer.score("Deck card", "Paquet carte", "fr", DEFAULT_MAX_LENGTH_RATIO, Some(&terms));
    assert_eq!(score.glossary_score, 50.0);
    assert_eq!(score.overall, 87.5);
    assert_eq!(score.category, QualityCategory::Yellow);
    assert!(score.issues.is_empty());
}

/// Test that the glossary is ignored for languages it does not cover
#[test]
fn test_score_withGlossaryForOtherLanguage_shouldIgnoreTerms() {
    let (scorer, terms) = deck_scorer();
    let score = scorer.score("Open Deck", "Deck öffnen", "de", DEFAULT_MAX_LENGTH_RATIO, Some(&terms));
    assert_eq!(score.glossary_score, 100.0);
}

/// Test the length penalty for very long translations
#[test]
fn test_score_withLongTranslation_shouldLowerLengthScore() {
    let scorer = QualityScorer::default();
    let score = scorer.score("Save", "Speichern!!", "de", DEFAULT_MAX_LENGTH_RATIO, None);

    assert_eq!(score.length_score, 40.0);
    assert_eq!(score.overall, 88.0);
    assert_eq!(score.category, QualityCategory::Yellow);
    assert!(score.needs_review());
}

/// Test the format checks for line and whitespace structure
#[test]
fn test_score_withChangedLineStructure_shouldLowerFormatScore() {
    let scorer = QualityScorer::default();
    let score = scorer.score("Line one\nLine two ", "Zeile eins Zeile zwei", "de", DEFAULT_MAX_LENGTH_RATIO, None);

    assert_eq!(score.format_score, 70.0);
    assert!(score.issues.iter().any(|i| i.starts_with("Newline count changed")));
    assert!(score.issues.iter().any(|i| i == "Trailing whitespace changed"));
}

/// Test strings that are echoed back without translation
#[test]
fn test_shouldSkip_withNonTranslatableStrings_shouldSkip() {
    for text in ["", "  ", "3", "12.5%", ".jpg", "https://example.com/help", "support@example.com", "%lld", "%1$@ - %2$@"] {
        assert!(should_skip(text), "expected {:?} to be skipped", text);
    }
    for text in ["Settings", "Hello %@", "A", "Delete %lld cards?", "www is a prefix"] {
        assert!(!is_non_translatable(text), "expected {:?} to be translated", text);
    }
}
