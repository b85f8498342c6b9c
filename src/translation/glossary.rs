/*!
 * Terminology glossary.
 *
 * A glossary maps a source term to its required translation per language:
 *
 * ```json
 * { "Deck": { "de": "Deck", "fr": "Paquet" } }
 * ```
 *
 * It feeds both the quality scorer (term compliance) and the LLM prompts.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Source term → language code → required translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    terms: BTreeMap<String, BTreeMap<String, String>>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a glossary from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read glossary file: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse glossary file: {}", path.display()))
    }

    /// Parse a glossary from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let glossary = serde_json::from_str(content)?;
        Ok(glossary)
    }

    /// Add or replace the translation of a term for one language
    pub fn insert(&mut self, term: impl Into<String>, language: impl Into<String>, translation: impl Into<String>) {
        self.terms
            .entry(term.into())
            .or_default()
            .insert(language.into(), translation.into());
    }

    /// Builder-style variant of [`Glossary::insert`]
    pub fn with_term(mut self, term: &str, language: &str, translation: &str) -> Self {
        self.insert(term, language, translation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// All source terms
    pub fn terms(&self) -> Vec<String> {
        self.terms.keys().cloned().collect()
    }

    /// Every language that has at least one glossary entry
    pub fn languages(&self) -> BTreeSet<&str> {
        self.terms
            .values()
            .flat_map(|translations| translations.keys().map(String::as_str))
            .collect()
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.terms.values().any(|translations| translations.contains_key(language))
    }

    /// Required translation of a term, looked up verbatim then lower-cased
    pub fn lookup(&self, term: &str, language: &str) -> Option<&str> {
        self.terms
            .get(term)
            .or_else(|| self.terms.get(&term.to_lowercase()))
            .and_then(|translations| translations.get(language))
            .map(String::as_str)
    }

    /// `(term, translation)` pairs for one language
    pub fn for_language(&self, language: &str) -> Vec<(String, String)> {
        self.terms
            .iter()
            .filter_map(|(term, translations)| {
                translations.get(language).map(|t| (term.clone(), t.clone()))
            })
            .collect()
    }
}
