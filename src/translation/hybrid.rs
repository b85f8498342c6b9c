/*!
 * Hybrid translation: fast machine translation first, LLM fallback second.
 *
 * Every string is first sent to the fast-MT client and scored. Strings whose
 * translation is empty, scores below the quality threshold or lands in the
 * red category are re-translated by the LLM. Non-translatable strings
 * (numbers, URLs, lone placeholders) are echoed back without any call.
 *
 * Batch mode chunks both phases, keeps output in input order and never
 * returns an error: failures become error results.
 */

use log::{debug, info, warn};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::providers::deepl::DeepL;
use crate::providers::openai::OpenAI;
use crate::providers::{FastMtClient, LlmClient, RetryPolicy};
use crate::translation::filters::should_skip;
use crate::translation::glossary::Glossary;
use crate::translation::progress::{CancelFlag, ProgressFn, ProgressReporter};
use crate::translation::result::{ProviderKind, TranslationResult, TranslationStats};
use crate::validation::scorer::{DEFAULT_MAX_LENGTH_RATIO, QualityCategory, QualityScore, QualityScorer};

/// Error text for items both engines failed to translate
pub const TRANSLATION_FAILED: &str = "Translation failed";
/// Error text for items dropped by cancellation
pub const TRANSLATION_CANCELLED: &str = "Translation cancelled";

/// Routing and chunking settings
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorSettings {
    /// Fast-MT results scoring below this go to the LLM
    pub quality_threshold: f64,
    /// Largest accepted translation/source length ratio
    pub max_length_ratio: f64,
    /// Strings per fast-MT request
    pub fast_mt_batch_size: usize,
    /// Strings per LLM request
    pub llm_batch_size: usize,
    /// Source language passed to the fast-MT client, auto-detected when absent
    pub source_language: Option<String>,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            quality_threshold: 80.0,
            max_length_ratio: DEFAULT_MAX_LENGTH_RATIO,
            fast_mt_batch_size: 50,
            llm_batch_size: 20,
            source_language: None,
        }
    }
}

/// Options for one batch run
#[derive(Default, Clone, Copy)]
pub struct BatchOptions<'a> {
    /// Shared UI context for every string
    pub context: Option<&'a str>,
    /// Progress callback
    pub progress: Option<&'a ProgressFn<'a>>,
    /// Checked between chunks
    pub cancel: Option<&'a CancelFlag>,
    /// Skip fast-MT and send everything to the LLM
    pub force_llm: bool,
}

/// Two-tier translator
#[derive(Debug, Clone)]
pub struct HybridTranslator {
    fast_mt: Arc<dyn FastMtClient>,
    llm: Arc<dyn LlmClient>,
    scorer: QualityScorer,
    required_terms: Vec<String>,
    settings: TranslatorSettings,
}

impl HybridTranslator {
    /// Create a new translator
    pub fn new(fast_mt: Arc<dyn FastMtClient>, llm: Arc<dyn LlmClient>, glossary: Glossary) -> Self {
        let required_terms = glossary.terms();
        Self {
            fast_mt,
            llm,
            scorer: QualityScorer::new(glossary),
            required_terms,
            settings: TranslatorSettings::default(),
        }
    }

    /// Replace the routing settings
    pub fn with_settings(mut self, settings: TranslatorSettings) -> Self {
        self.settings = TranslatorSettings {
            fast_mt_batch_size: settings.fast_mt_batch_size.max(1),
            llm_batch_size: settings.llm_batch_size.max(1),
            ..settings
        };
        self
    }

    /// Set the quality threshold
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.settings.quality_threshold = threshold;
        self
    }

    /// Build DeepL and OpenAI clients from the configuration
    ///
    /// Fails when either API key is missing or the glossary cannot be read.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            return Err(AppError::Config(format!("Missing API keys: {}", missing.join(", "))));
        }

        let glossary = match &config.translation.glossary_path {
            Some(path) if !path.trim().is_empty() => {
                Glossary::from_path(path).map_err(|e| AppError::Config(format!("{:#}", e)))?
            }
            _ => Glossary::new(),
        };

        let deepl = DeepL::new(&config.deepl.api_key, &config.deepl.endpoint, config.deepl.timeout_secs)
            .with_formality(config.deepl.formality.clone())
            .with_retry(RetryPolicy::new(config.deepl.retry_count, config.deepl.retry_backoff_ms));

        let openai = OpenAI::new(
            &config.openai.api_key,
            &config.openai.endpoint,
            &config.openai.model,
            config.openai.timeout_secs,
        )
        .with_temperatures(config.openai.temperature, config.openai.review_temperature)
        .with_token_limits(config.openai.max_tokens, config.openai.batch_max_tokens)
        .with_app_context(&config.translation.app_context)
        .with_source_language(&config.source_language)
        .with_retry(RetryPolicy::new(config.openai.retry_count, config.openai.retry_backoff_ms));

        let settings = TranslatorSettings {
            quality_threshold: config.translation.quality_threshold,
            max_length_ratio: config.translation.max_length_ratio,
            fast_mt_batch_size: config.translation.fast_mt_batch_size,
            llm_batch_size: config.translation.llm_batch_size,
            source_language: Some(config.source_language.clone()),
        };

        Ok(Self::new(Arc::new(deepl), Arc::new(openai), glossary).with_settings(settings))
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Display name of the fast-MT client
    pub fn fast_mt_name(&self) -> &str {
        self.fast_mt.name()
    }

    /// Display name of the LLM client
    pub fn llm_name(&self) -> &str {
        self.llm.name()
    }

    /// The LLM client, shared with the reviewer
    pub fn llm(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.llm)
    }

    /// Score a translation with this translator's glossary and length limit
    pub fn score(&self, source: &str, translation: &str, target_lang: &str) -> QualityScore {
        self.scorer.score(
            source,
            translation,
            target_lang,
            self.settings.max_length_ratio,
            Some(&self.required_terms),
        )
    }

    fn needs_fallback(&self, quality: &QualityScore) -> bool {
        quality.overall < self.settings.quality_threshold || quality.category == QualityCategory::Red
    }

    fn source_language(&self) -> Option<&str> {
        self.settings.source_language.as_deref()
    }

    fn accepted(
        &self,
        key: &str,
        source: &str,
        translation: String,
        target_lang: &str,
        provider: ProviderKind,
        fallback_used: bool,
    ) -> TranslationResult {
        let quality = self.score(source, &translation, target_lang);
        TranslationResult {
            key: key.to_string(),
            source: source.to_string(),
            translation,
            target_lang: target_lang.to_string(),
            quality,
            provider,
            fallback_used,
            error: None,
        }
    }

    /// Translate a single string
    ///
    /// Never fails: provider errors are reported in the result's `error`.
    pub async fn translate(
        &self,
        key: &str,
        source: &str,
        target_lang: &str,
        context: Option<&str>,
        force_llm: bool,
    ) -> TranslationResult {
        if should_skip(source) {
            return TranslationResult::skipped(key, source, target_lang);
        }

        if !force_llm {
            match self.fast_mt.translate_one(source, target_lang, self.source_language()).await {
                Ok(result) if !result.text.is_empty() => {
                    let candidate =
                        self.accepted(key, source, result.text, target_lang, ProviderKind::FastMt, false);
                    if !self.needs_fallback(&candidate.quality) {
                        return candidate;
                    }
                    debug!(
                        "'{}' scored {:.1} ({}) with {}, retrying with {}",
                        key,
                        candidate.quality.overall,
                        candidate.quality.category,
                        self.fast_mt.name(),
                        self.llm.name()
                    );
                }
                Ok(_) => debug!("'{}': {} returned an empty translation", key, self.fast_mt.name()),
                Err(e) => warn!("'{}': {} failed, falling back to {}: {}", key, self.fast_mt.name(), self.llm.name(), e),
            }
        }

        let fallback_used = !force_llm;
        let glossary = self.scorer.glossary().for_language(target_lang);
        match self.llm.translate_one(source, target_lang, context, &glossary).await {
            Ok(translation) if !translation.trim().is_empty() => {
                self.accepted(key, source, translation, target_lang, ProviderKind::Llm, fallback_used)
            }
            Ok(_) => TranslationResult::failure(
                key,
                source,
                target_lang,
                ProviderKind::Llm,
                fallback_used,
                format!("{} returned an empty translation", self.llm.name()),
            ),
            Err(e) => TranslationResult::failure(key, source, target_lang, ProviderKind::Llm, fallback_used, e.to_string()),
        }
    }

    /// Translate `(key, source)` pairs, returning results in input order
    pub async fn translate_batch(
        &self,
        strings: &[(String, String)],
        target_lang: &str,
        context: Option<&str>,
        progress: Option<&ProgressFn<'_>>,
    ) -> (Vec<TranslationResult>, TranslationStats) {
        let options = BatchOptions {
            context,
            progress,
            ..Default::default()
        };
        self.translate_batch_with(strings, target_lang, options).await
    }

    /// Like `translate_batch`, stopping at the next chunk boundary once `cancel` is set
    ///
    /// Items that were never sent get a `"Translation cancelled"` error result.
    pub async fn translate_batch_cancellable(
        &self,
        strings: &[(String, String)],
        target_lang: &str,
        context: Option<&str>,
        progress: Option<&ProgressFn<'_>>,
        cancel: Option<&CancelFlag>,
    ) -> (Vec<TranslationResult>, TranslationStats) {
        let options = BatchOptions {
            context,
            progress,
            cancel,
            force_llm: false,
        };
        self.translate_batch_with(strings, target_lang, options).await
    }

    /// Batch translation with all options
    pub async fn translate_batch_with(
        &self,
        strings: &[(String, String)],
        target_lang: &str,
        options: BatchOptions<'_>,
    ) -> (Vec<TranslationResult>, TranslationStats) {
        let total = strings.len();
        let reporter = ProgressReporter::new(options.progress, total);
        let is_cancelled = || options.cancel.is_some_and(|flag| flag.is_cancelled());

        let mut slots: Vec<Option<TranslationResult>> = vec![None; total];
        let mut pending = Vec::new();
        for (index, (key, source)) in strings.iter().enumerate() {
            if should_skip(source) {
                slots[index] = Some(TranslationResult::skipped(key, source, target_lang));
            } else {
                pending.push(index);
            }
        }
        let mut resolved = total - pending.len();
        debug!("{} of {} strings need translation to {}", pending.len(), total, target_lang);

        let mut fallback = Vec::new();
        let mut cancelled = false;

        if options.force_llm {
            fallback = pending;
        } else if !pending.is_empty() {
            info!("Translating {} strings to {} with {}", pending.len(), target_lang, self.fast_mt.name());
            reporter.report(resolved, &format!("Translating with {}...", self.fast_mt.name()));

            let mut completed = 0;
            for chunk in pending.chunks(self.settings.fast_mt_batch_size) {
                if is_cancelled() {
                    cancelled = true;
                    break;
                }

                let texts: Vec<String> = chunk.iter().map(|&i| strings[i].1.clone()).collect();
                let translations = match self
                    .fast_mt
                    .translate_batch(&texts, target_lang, self.source_language())
                    .await
                {
                    Ok(translations) if translations.len() == chunk.len() => {
                        translations.into_iter().map(|t| t.text).collect()
                    }
                    Ok(translations) => {
                        warn!(
                            "{} returned {} translations for {} texts, sending chunk to fallback",
                            self.fast_mt.name(),
                            translations.len(),
                            chunk.len()
                        );
                        vec![String::new(); chunk.len()]
                    }
                    Err(e) => {
                        warn!("{} chunk of {} failed, sending chunk to fallback: {}", self.fast_mt.name(), chunk.len(), e);
                        vec![String::new(); chunk.len()]
                    }
                };

                for (&index, translation) in chunk.iter().zip(translations) {
                    if translation.is_empty() {
                        fallback.push(index);
                        continue;
                    }
                    let (key, source) = &strings[index];
                    let result = self.accepted(key, source, translation, target_lang, ProviderKind::FastMt, false);
                    if self.needs_fallback(&result.quality) {
                        fallback.push(index);
                    } else {
                        slots[index] = Some(result);
                        resolved += 1;
                    }
                }

                completed += chunk.len();
                reporter.report(resolved, &format!("{}: {}/{}", self.fast_mt.name(), completed, pending.len()));
            }

            reporter.report(resolved, "Scoring translations...");
        }

        if !fallback.is_empty() && !cancelled {
            info!("Re-translating {} strings to {} with {}", fallback.len(), target_lang, self.llm.name());
            reporter.report(
                resolved,
                &format!("Re-translating {} strings with {}...", fallback.len(), self.llm.name()),
            );
            let glossary = self.scorer.glossary().for_language(target_lang);

            let mut completed = 0;
            for chunk in fallback.chunks(self.settings.llm_batch_size) {
                if is_cancelled() {
                    cancelled = true;
                    break;
                }

                let texts: Vec<String> = chunk.iter().map(|&i| strings[i].1.clone()).collect();
                let translations = match self.llm.translate_batch(&texts, target_lang, options.context, &glossary).await {
                    Ok(translations) if translations.len() == chunk.len() => translations,
                    Ok(translations) => {
                        warn!(
                            "{} returned {} translations for {} texts, retrying individually",
                            self.llm.name(),
                            translations.len(),
                            chunk.len()
                        );
                        vec![String::new(); chunk.len()]
                    }
                    Err(e) => {
                        warn!("{} batch of {} failed, retrying individually: {}", self.llm.name(), chunk.len(), e);
                        vec![String::new(); chunk.len()]
                    }
                };

                for (&index, translation) in chunk.iter().zip(translations) {
                    let (key, source) = &strings[index];
                    let translation = if translation.trim().is_empty() {
                        self.retry_single(key, source, target_lang, options.context, &glossary).await
                    } else {
                        translation
                    };

                    slots[index] = Some(if translation.trim().is_empty() {
                        TranslationResult::failure(
                            key,
                            source,
                            target_lang,
                            ProviderKind::Error,
                            true,
                            TRANSLATION_FAILED,
                        )
                    } else {
                        self.accepted(key, source, translation, target_lang, ProviderKind::Llm, !options.force_llm)
                    });
                    resolved += 1;
                }

                completed += chunk.len();
                reporter.report(resolved, &format!("{}: {}/{}", self.llm.name(), completed, fallback.len()));
            }
        }

        if cancelled {
            warn!("Translation to {} cancelled with {} of {} strings resolved", target_lang, resolved, total);
        }

        let results: Vec<TranslationResult> = slots
            .into_iter()
            .zip(strings)
            .map(|(slot, (key, source))| {
                slot.unwrap_or_else(|| {
                    let error = if cancelled { TRANSLATION_CANCELLED } else { TRANSLATION_FAILED };
                    TranslationResult::failure(key, source, target_lang, ProviderKind::Error, !options.force_llm, error)
                })
            })
            .collect();

        let mut stats = TranslationStats::new(total);
        for result in &results {
            stats.record(result);
        }

        info!(
            "{}: {} skipped, {} {}, {} {}, {} failed",
            target_lang,
            stats.skipped_count,
            stats.fast_mt_count,
            self.fast_mt.name(),
            stats.llm_count,
            self.llm.name(),
            stats.failed_count
        );
        reporter.finish(if cancelled { "Cancelled" } else { "Done" });

        (results, stats)
    }

    /// Last attempt for one string after its batch failed or left it out
    async fn retry_single(
        &self,
        key: &str,
        source: &str,
        target_lang: &str,
        context: Option<&str>,
        glossary: &[(String, String)],
    ) -> String {
        match self.llm.translate_one(source, target_lang, context, glossary).await {
            Ok(translation) => translation,
            Err(e) => {
                debug!("'{}': individual retry with {} failed: {}", key, self.llm.name(), e);
                String::new()
            }
        }
    }
}
