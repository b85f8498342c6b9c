use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Review state of a string unit
///
/// `translate` writes `Translated`, `verify` picks up `NeedsReview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationState {
    #[default]
    New,
    Translated,
    NeedsReview,
    Reviewed,
    Flagged,
    Stale,
}

impl TranslationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Translated => "translated",
            Self::NeedsReview => "needs_review",
            Self::Reviewed => "reviewed",
            Self::Flagged => "flagged",
            Self::Stale => "stale",
        }
    }
}

impl fmt::Display for TranslationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

/// A single translated value and its review state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringUnit {
    #[serde(default)]
    pub state: TranslationState,
    #[serde(default)]
    pub value: String,
}

impl StringUnit {
    pub fn new(value: impl Into<String>, state: TranslationState) -> Self {
        Self {
            state,
            value: value.into(),
        }
    }
}

/// One language's entry for a key
///
/// `variations` (plural and device variants) is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Localization {
    #[serde(rename = "stringUnit", default, skip_serializing_if = "Option::is_none")]
    pub string_unit: Option<StringUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<Value>,

    /// `substitutions` and other keys this model does not know
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Localization {
    pub fn is_empty(&self) -> bool {
        self.string_unit.is_none() && self.variations.is_none() && self.extra.is_empty()
    }

    /// The string unit's value, when it is not empty
    pub fn value(&self) -> Option<&str> {
        self.string_unit
            .as_ref()
            .map(|unit| unit.value.as_str())
            .filter(|value| !value.is_empty())
    }
}

/// One localizable key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StringEntry {
    /// Developer comment shown to translators
    #[serde(default, skip_serializing_if = "is_blank")]
    pub comment: Option<String>,

    /// `manual`, `extracted_with_value`, `stale`...
    #[serde(rename = "extractionState", default, skip_serializing_if = "is_blank")]
    pub extraction_state: Option<String>,

    /// `false` marks keys that must never be translated
    #[serde(rename = "shouldTranslate", default, skip_serializing_if = "Option::is_none")]
    pub should_translate: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub localizations: BTreeMap<String, Localization>,

    /// Fields this model does not know, written back unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StringEntry {
    /// Value in `source_language`, or the key itself when there is none
    pub fn source_value<'a>(&'a self, key: &'a str, source_language: &str) -> &'a str {
        self.localizations
            .get(source_language)
            .and_then(|loc| loc.string_unit.as_ref())
            .map(|unit| unit.value.as_str())
            .unwrap_or(key)
    }

    /// Whether `language` has a non-empty string unit
    pub fn has_translation(&self, language: &str) -> bool {
        self.localizations.get(language).and_then(Localization::value).is_some()
    }

    /// Set the string unit for `language`, keeping any variations
    pub fn set_translation(&mut self, language: &str, value: impl Into<String>, state: TranslationState) {
        let localization = self.localizations.entry(language.to_string()).or_default();
        localization.string_unit = Some(StringUnit::new(value, state));
    }

    pub fn is_translatable(&self) -> bool {
        self.should_translate != Some(false)
    }
}

/// An existing translation selected for review
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingTranslation {
    pub key: String,
    pub source: String,
    pub translation: String,
    pub state: TranslationState,
    pub comment: Option<String>,
}

/// An Apple string catalog (`.xcstrings`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringCatalog {
    #[serde(rename = "sourceLanguage", default = "default_source_language")]
    pub source_language: String,

    /// Entries by key, kept sorted
    #[serde(default)]
    pub strings: BTreeMap<String, StringEntry>,

    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for StringCatalog {
    fn default() -> Self {
        Self::new(default_source_language())
    }
}

impl StringCatalog {
    pub fn new(source_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            strings: BTreeMap::new(),
            version: default_version(),
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn entry(&self, key: &str) -> Option<&StringEntry> {
        self.strings.get(key)
    }

    /// Add an entry whose source value is its key
    pub fn insert_key(&mut self, key: impl Into<String>) -> &mut StringEntry {
        self.strings.entry(key.into()).or_default()
    }

    /// Source text of `key`
    pub fn source_value<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        self.strings
            .get(key)
            .map(|entry| entry.source_value(key, &self.source_language))
    }

    /// `(key, source)` pairs that need translating, in key order
    ///
    /// Entries with a blank source or `shouldTranslate: false` are left out.
    pub fn translatable_strings(&self) -> Vec<(String, String)> {
        self.strings
            .iter()
            .filter(|(_, entry)| entry.is_translatable())
            .map(|(key, entry)| (key, entry.source_value(key, &self.source_language)))
            .filter(|(_, source)| !source.trim().is_empty())
            .map(|(key, source)| (key.clone(), source.to_string()))
            .collect()
    }

    /// Translatable keys without a translation in `language`
    pub fn untranslated_keys(&self, language: &str) -> Vec<String> {
        self.strings
            .iter()
            .filter(|(_, entry)| entry.is_translatable() && !entry.has_translation(language))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn has_translation(&self, key: &str, language: &str) -> bool {
        self.strings
            .get(key)
            .is_some_and(|entry| entry.has_translation(language))
    }

    pub fn translation(&self, key: &str, language: &str) -> Option<&StringUnit> {
        self.strings
            .get(key)
            .and_then(|entry| entry.localizations.get(language))
            .and_then(|loc| loc.string_unit.as_ref())
    }

    /// Set a translation, returns false when the key does not exist
    pub fn set_translation(&mut self, key: &str, language: &str, value: impl Into<String>, state: TranslationState) -> bool {
        match self.strings.get_mut(key) {
            Some(entry) => {
                entry.set_translation(language, value, state);
                true
            }
            None => false,
        }
    }

    /// All languages present in the catalog, source language included
    pub fn languages(&self) -> BTreeSet<String> {
        let mut languages: BTreeSet<String> = self
            .strings
            .values()
            .flat_map(|entry| entry.localizations.keys().cloned())
            .collect();
        languages.insert(self.source_language.clone());
        languages
    }

    /// Percentage of translatable strings that have a translation in `language`
    pub fn coverage(&self, language: &str) -> f64 {
        let translatable = self.translatable_strings();
        if translatable.is_empty() {
            return 100.0;
        }
        let translated = translatable
            .iter()
            .filter(|(key, _)| self.has_translation(key, language))
            .count();
        translated as f64 / translatable.len() as f64 * 100.0
    }

    /// Existing translations in `language`, optionally only those in `state`
    pub fn existing_translations(&self, language: &str, state: Option<TranslationState>) -> Vec<ExistingTranslation> {
        self.strings
            .iter()
            .filter(|(_, entry)| entry.is_translatable())
            .filter_map(|(key, entry)| {
                let unit = entry.localizations.get(language)?.string_unit.as_ref()?;
                if unit.value.is_empty() || state.is_some_and(|s| s != unit.state) {
                    return None;
                }
                Some(ExistingTranslation {
                    key: key.clone(),
                    source: entry.source_value(key, &self.source_language).to_string(),
                    translation: unit.value.clone(),
                    state: unit.state,
                    comment: entry.comment.clone(),
                })
            })
            .collect()
    }

    /// Remove localizations with no string unit, variations or other content
    pub fn prune_empty_localizations(&mut self) {
        for entry in self.strings.values_mut() {
            entry.localizations.retain(|_, loc| !loc.is_empty());
        }
    }
}
