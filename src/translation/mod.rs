/*!
 * Hybrid translation of catalog strings.
 *
 * This module contains the translation pipeline and its supporting types.
 * It is split into several submodules:
 *
 * - `hybrid`: Fast-MT first, LLM fallback, batch orchestration
 * - `filters`: Detection of strings that need no translation
 * - `glossary`: Required term translations per language
 * - `progress`: Progress callback and cancellation flag
 * - `result`: Per-string results and batch statistics
 */

// Re-export main types for easier usage
pub use self::glossary::Glossary;
pub use self::hybrid::{BatchOptions, HybridTranslator, TranslatorSettings};
pub use self::progress::{CancelFlag, ProgressFn};
pub use self::result::{ProviderKind, TranslationResult, TranslationStats};

// Submodules
pub mod filters;
pub mod glossary;
pub mod hybrid;
pub mod progress;
pub mod result;
