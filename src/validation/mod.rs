/*!
 * Validation module for translation quality assurance.
 *
 * This module provides the checks applied to every translation:
 * - Placeholder validation (printf-style format specifiers)
 * - Rule-based quality scoring (placeholders, glossary, length, format)
 * - LLM semantic review (meaning and fluency)
 *
 * # Architecture
 *
 * - `placeholders`: Extracts and compares format specifiers
 * - `scorer`: Weighted heuristic score and traffic-light category
 * - `reviewer`: Asks the LLM to judge existing translations
 */

pub mod placeholders;
pub mod reviewer;
pub mod scorer;

// Re-export main types
pub use placeholders::{PlaceholderIssue, PlaceholderValidation};
pub use reviewer::{ReviewItem, ReviewPolicy, ReviewResult, SemanticReviewer, SuggestionReview};
pub use scorer::{QualityCategory, QualityScore, QualityScorer};
