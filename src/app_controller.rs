use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::catalog::{StringCatalog, TranslationState};
use crate::errors::AppError;
use crate::language_utils;
use crate::providers::LlmClient;
use crate::providers::openai::OpenAI;
use crate::providers::RetryPolicy;
use crate::translation::{BatchOptions, HybridTranslator, TranslationResult, TranslationStats};
use crate::validation::reviewer::{ReviewItem, ReviewResult, SemanticReviewer};
use crate::validation::scorer::QualityCategory;

// @module: Application controller for catalog processing

/// Options of the translate command
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub input: PathBuf,
    /// Defaults to the input path
    pub output: Option<PathBuf>,
    /// Defaults to the configured target languages
    pub languages: Vec<String>,
    pub quality_threshold: Option<f64>,
    pub dry_run: bool,
    pub force_llm: bool,
    /// Translate at most this many strings per language
    pub limit: Option<usize>,
}

/// Options of the verify command
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub input: PathBuf,
    pub language: String,
    /// Review every translation, not only those marked `needs_review`
    pub review_all: bool,
    pub limit: Option<usize>,
    /// Apply suggested fixes
    pub fix: bool,
    /// Apply fixes without asking
    pub assume_yes: bool,
}

/// Outcome of translating one language
#[derive(Debug, Clone)]
pub struct LanguageReport {
    pub language: String,
    pub results: Vec<TranslationResult>,
    pub stats: TranslationStats,
    /// Translations written into the catalog
    pub applied: usize,
}

/// Outcome of a verify run
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub results: Vec<ReviewResult>,
    /// Suggested fixes written into the catalog
    pub fixes_applied: usize,
}

impl VerifyReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn needs_attention(&self) -> Vec<&ReviewResult> {
        self.results.iter().filter(|r| r.needs_attention()).collect()
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fail before any work when a provider key is missing
    fn require_credentials(&self, needed: &[&str]) -> Result<(), AppError> {
        let missing: Vec<&str> = self
            .config
            .missing_credentials()
            .into_iter()
            .filter(|name| needed.contains(name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(format!("{} not set", missing.join(", "))))
        }
    }

    /// Translate missing strings with the configured providers
    pub async fn translate(&self, options: &TranslateOptions) -> Result<Vec<LanguageReport>> {
        self.require_credentials(&["DEEPL_API_KEY", "OPENAI_API_KEY"])?;
        let mut translator = HybridTranslator::from_config(&self.config)?;
        if let Some(threshold) = options.quality_threshold {
            translator = translator.with_quality_threshold(threshold);
        }
        self.translate_with(&translator, options).await
    }

    /// Translate missing strings with the given translator
    pub async fn translate_with(
        &self,
        translator: &HybridTranslator,
        options: &TranslateOptions,
    ) -> Result<Vec<LanguageReport>> {
        let start_time = std::time::Instant::now();
        let mut catalog = StringCatalog::from_path(&options.input)?;
        println!("Reading: {}", options.input.display());

        let mut strings = catalog.translatable_strings();
        println!("Found: {} translatable strings", strings.len());
        if let Some(limit) = options.limit {
            strings.truncate(limit);
            println!("Limited to: {} strings", strings.len());
        }

        let languages = self.target_languages(&options.languages)?;
        println!("Target languages: {}", languages.join(", "));

        let mut reports = Vec::with_capacity(languages.len());
        for language in &languages {
            println!("\nTranslating to {}...", language_utils::display_name(language));

            let pending: Vec<(String, String)> = strings
                .iter()
                .filter(|(key, _)| !catalog.has_translation(key, language))
                .cloned()
                .collect();
            if pending.is_empty() {
                println!("  All strings already translated for {}", language);
                continue;
            }
            println!("  Strings to translate: {}", pending.len());

            let progress_bar = Self::create_progress_bar(pending.len(), "strings");
            let bar = progress_bar.clone();
            let language_tag = language.clone();
            let progress = move |current: usize, total: usize, status: &str| {
                bar.set_length(total as u64);
                bar.set_position(current as u64);
                bar.set_message(format!("[{}] {}", language_tag, status));
            };

            let batch_options = BatchOptions {
                progress: Some(&progress),
                force_llm: options.force_llm,
                ..Default::default()
            };
            let (results, stats) = translator.translate_batch_with(&pending, language, batch_options).await;
            progress_bar.finish_and_clear();

            let mut applied = 0;
            for result in results.iter().filter(|r| r.success()) {
                let translation = result.translation.as_str();
                if catalog.set_translation(&result.key, language, translation, TranslationState::Translated) {
                    applied += 1;
                }
            }

            Self::print_stats(language, &stats, translator);
            Self::print_quality_breakdown(&results);

            reports.push(LanguageReport {
                language: language.clone(),
                results,
                stats,
                applied,
            });
        }

        if options.dry_run {
            println!("\nDry run - no changes saved");
        } else {
            let output = options.output.as_ref().unwrap_or(&options.input);
            println!("\nWriting: {}", output.display());
            catalog.write_to(output)?;
        }

        info!("Translation completed in {}.", Self::format_duration(start_time.elapsed()));
        Ok(reports)
    }

    fn target_languages(&self, requested: &[String]) -> Result<Vec<String>> {
        let languages: Vec<String> = if requested.is_empty() {
            self.config.target_languages.clone()
        } else {
            requested.to_vec()
        };
        let languages: Vec<String> = languages
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if languages.is_empty() {
            return Err(anyhow!("No target languages given"));
        }
        for language in &languages {
            language_utils::validate_language_code(language)?;
        }
        Ok(languages)
    }

    /// Print catalog statistics
    pub fn stats(&self, input: &Path) -> Result<StringCatalog> {
        let catalog = StringCatalog::from_path(input)?;
        let translatable_strings = catalog.translatable_strings();
        let translatable = translatable_strings.len();
        let name = input.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

        println!("Statistics for {}", name);
        println!("  {:<24} {:>10}", "Total strings", catalog.len());
        println!("  {:<24} {:>10}", "Source language", catalog.source_language);
        println!("  {:<24} {:>10}", "Translatable strings", translatable);

        let languages = catalog.languages();
        let names: Vec<&str> = languages.iter().map(String::as_str).collect();
        println!("  {:<24} {:>10}", "Languages", names.join(", "));

        for language in languages.iter().filter(|l| **l != catalog.source_language) {
            let translated = translatable_strings
                .iter()
                .filter(|(key, _)| catalog.has_translation(key, language))
                .count();
            println!(
                "  {:<24} {:>10}",
                format!("{} coverage", language),
                format!("{}/{} ({:.1}%)", translated, translatable, catalog.coverage(language))
            );
        }

        Ok(catalog)
    }

    /// Print keys without a translation in `language`
    pub fn untranslated(&self, input: &Path, language: &str, limit: usize) -> Result<Vec<String>> {
        let catalog = StringCatalog::from_path(input)?;
        let keys = catalog.untranslated_keys(language);

        println!("Untranslated strings for {}: {} total", language, keys.len());
        if keys.is_empty() {
            println!("All strings are translated!");
            return Ok(keys);
        }

        for key in keys.iter().take(limit) {
            let source = catalog.source_value(key).unwrap_or(key);
            println!("  {:<40}  {}", Self::truncate(key, 40), Self::truncate(source, 60));
        }
        if keys.len() > limit {
            println!("\n... and {} more", keys.len() - limit);
        }

        Ok(keys)
    }

    /// Review existing translations with the configured LLM
    pub async fn verify(&self, options: &VerifyOptions) -> Result<VerifyReport> {
        self.require_credentials(&["OPENAI_API_KEY"])?;
        let openai = &self.config.openai;
        let llm: Arc<dyn LlmClient> = Arc::new(
            OpenAI::new(&openai.api_key, &openai.endpoint, &openai.model, openai.timeout_secs)
                .with_temperatures(openai.temperature, openai.review_temperature)
                .with_token_limits(openai.max_tokens, openai.batch_max_tokens)
                .with_app_context(&self.config.translation.app_context)
                .with_source_language(&self.config.source_language)
                .with_retry(RetryPolicy::new(openai.retry_count, openai.retry_backoff_ms)),
        );
        let reviewer = SemanticReviewer::new(llm);
        self.verify_with(&reviewer, options, Self::confirm).await
    }

    /// Review existing translations with the given reviewer
    ///
    /// `confirm` is asked before fixes are written unless `assume_yes` is set.
    pub async fn verify_with<F>(
        &self,
        reviewer: &SemanticReviewer,
        options: &VerifyOptions,
        confirm: F,
    ) -> Result<VerifyReport>
    where
        F: Fn(&str) -> bool,
    {
        let mut catalog = StringCatalog::from_path(&options.input)?;
        println!("Reading: {}", options.input.display());

        let state = if options.review_all { None } else { Some(TranslationState::NeedsReview) };
        let mut existing = catalog.existing_translations(&options.language, state);
        if existing.is_empty() {
            if options.review_all {
                println!("No translations found for {}", options.language);
            } else {
                println!("No translations need review for {}", options.language);
                println!("Use --all to review all translations");
            }
            return Ok(VerifyReport::default());
        }
        if let Some(limit) = options.limit {
            existing.truncate(limit);
        }

        println!("Reviewing {} translations for {}...", existing.len(), options.language.to_uppercase());
        let items: Vec<ReviewItem> = existing
            .into_iter()
            .map(|t| ReviewItem {
                key: t.key,
                source: t.source,
                translation: t.translation,
                context: t.comment,
            })
            .collect();

        let progress_bar = Self::create_progress_bar(items.len(), "reviews");
        let bar = progress_bar.clone();
        let progress = move |current: usize, total: usize, key: &str| {
            bar.set_length(total as u64);
            bar.set_position(current as u64);
            bar.set_message(Self::truncate(key, 40).to_string());
        };
        let results = reviewer.review_batch(&items, &options.language, Some(&progress)).await;
        progress_bar.finish_and_clear();

        let mut report = VerifyReport {
            results,
            fixes_applied: 0,
        };
        Self::print_verify_summary(&report);

        let attention = report.needs_attention();
        if attention.is_empty() {
            println!("\nAll reviewed translations look good!");
            return Ok(report);
        }
        Self::print_attention(&attention);

        if options.fix {
            let fixes: Vec<(String, String)> = attention
                .iter()
                .filter_map(|r| r.suggested_fix.as_ref().map(|fix| (r.key.clone(), fix.clone())))
                .collect();
            if fixes.is_empty() {
                println!("\nNo suggested fixes available");
                return Ok(report);
            }

            println!("\nFound {} translations with suggested fixes", fixes.len());
            if !options.assume_yes && !confirm("Apply these fixes?") {
                println!("Fixes not applied");
                return Ok(report);
            }

            for (key, fix) in &fixes {
                if catalog.set_translation(key, &options.language, fix.as_str(), TranslationState::Translated) {
                    report.fixes_applied += 1;
                }
            }
            catalog.write_to(&options.input)?;
            println!("Applied {} fixes to {}", report.fixes_applied, options.input.display());
        }

        Ok(report)
    }

    /// Ask a yes/no question on stdin
    fn confirm(question: &str) -> bool {
        print!("\n{} [y/N] ", question);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                warn!("Could not read answer: {}", e);
                false
            }
        }
    }

    fn create_progress_bar(total: usize, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(total as u64);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    fn print_stats(language: &str, stats: &TranslationStats, translator: &HybridTranslator) {
        let percent = |count: usize| {
            if stats.total == 0 {
                0.0
            } else {
                count as f64 / stats.total as f64 * 100.0
            }
        };

        println!("Translation stats for {}", language.to_uppercase());
        println!("  {:<18} {:>6} {:>7}", "Total", stats.total, "100%");
        println!("  {:<18} {:>6} {:>6.1}%", "Skipped", stats.skipped_count, percent(stats.skipped_count));
        let llm_label = format!("{} (fallback)", translator.llm_name());
        println!("  {:<18} {:>6} {:>6.1}%", translator.fast_mt_name(), stats.fast_mt_count, percent(stats.fast_mt_count));
        println!("  {:<18} {:>6} {:>6.1}%", llm_label, stats.llm_count, percent(stats.llm_count));
        println!("  {:<18} {:>6} {:>6.1}%", "Failed", stats.failed_count, percent(stats.failed_count));
    }

    fn print_quality_breakdown(results: &[TranslationResult]) {
        let total = results.len().max(1) as f64;
        let count = |category: QualityCategory| results.iter().filter(|r| r.quality.category == category).count();
        let (green, yellow, red) = (
            count(QualityCategory::Green),
            count(QualityCategory::Yellow),
            count(QualityCategory::Red),
        );

        println!("Quality breakdown");
        println!("  Green (95+):    {} ({:.1}%)", green, green as f64 / total * 100.0);
        println!("  Yellow (80-94): {} ({:.1}%)", yellow, yellow as f64 / total * 100.0);
        println!("  Red (<80):      {} ({:.1}%)", red, red as f64 / total * 100.0);
    }

    fn print_verify_summary(report: &VerifyReport) {
        let total = report.results.len();
        let passed = report.passed();
        let failed = total - passed;
        let divisor = total.max(1) as f64;
        let avg_semantic = report.results.iter().map(|r| r.semantic_score).sum::<f64>() / divisor;
        let avg_fluency = report.results.iter().map(|r| r.fluency_score).sum::<f64>() / divisor;

        println!("Verification summary");
        println!("  Total reviewed:     {}", total);
        println!("  Passed:             {} ({:.1}%)", passed, passed as f64 / divisor * 100.0);
        println!("  Needs attention:    {} ({:.1}%)", failed, failed as f64 / divisor * 100.0);
        println!("  Avg semantic score: {:.1}", avg_semantic);
        println!("  Avg fluency score:  {:.1}", avg_fluency);
    }

    fn print_attention(results: &[&ReviewResult]) {
        println!("\nTranslations needing attention:\n");
        for result in results {
            let issues = if result.issues.is_empty() {
                "Low scores".to_string()
            } else {
                result.issues.iter().take(2).cloned().collect::<Vec<_>>().join("; ")
            };
            println!(
                "  {:<25} {:>4.0}  {}",
                Self::truncate(&result.key, 25),
                result.overall_score(),
                issues
            );
            if let Some(fix) = &result.suggested_fix {
                println!("  {:<25}       - {}", "", result.translation);
                println!("  {:<25}       + {}", "", Self::truncate(fix, 80));
            }
        }
    }

    /// First `max` characters of `text`
    fn truncate(text: &str, max: usize) -> &str {
        match text.char_indices().nth(max) {
            Some((index, _)) => &text[..index],
            None => text,
        }
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
