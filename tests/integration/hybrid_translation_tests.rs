/*!
 * Integration tests for hybrid batch translation.
 *
 * Runs the translator over scripted fast-MT and LLM clients and checks
 * routing, chunking, retries, cancellation, progress and statistics.
 */

use parking_lot::Mutex;
use std::sync::Arc;

use xclate::providers::mock::{MockFastMt, MockLlm};
use xclate::translation::hybrid::{TRANSLATION_CANCELLED, TRANSLATION_FAILED};
use xclate::translation::{
    BatchOptions, CancelFlag, Glossary, HybridTranslator, ProviderKind, TranslationResult, TranslationStats,
    TranslatorSettings,
};

use crate::common::{self, drop_placeholders, germanize, mock_translator, sample_strings};

fn settings(fast_mt_batch_size: usize, llm_batch_size: usize) -> TranslatorSettings {
    TranslatorSettings {
        fast_mt_batch_size,
        llm_batch_size,
        ..Default::default()
    }
}

fn keys(results: &[TranslationResult]) -> Vec<&str> {
    results.iter().map(|r| r.key.as_str()).collect()
}

/// Every item lands in exactly one bucket
fn assert_stats_consistent(stats: &TranslationStats, results: &[TranslationResult]) {
    assert_eq!(stats.total, results.len());
    assert_eq!(
        stats.total,
        stats.skipped_count + stats.fast_mt_count + stats.llm_count + stats.failed_count
    );
    assert_eq!(stats.resolved(), results.iter().filter(|r| r.success()).count());
}

fn mixed_strings() -> Vec<(String, String)> {
    [
        ("greeting", "Hello %@"),
        ("count", "42"),
        ("settings_title", "Settings"),
        ("delete_prompt", "Delete %lld cards?"),
        ("help_url", "https://example.com"),
    ]
    .iter()
    .map(|(k, s)| (k.to_string(), s.to_string()))
    .collect()
}

/// Test that good fast-MT output is kept, in order, without touching the LLM
#[tokio::test]
async fn test_translateBatch_withGoodFastMt_shouldChunkAndKeepOrder() {
    let fast_mt = MockFastMt::working();
    let fast_calls = fast_mt.calls();
    let llm = MockLlm::working();
    let llm_calls = llm.calls();
    let translator = mock_translator(fast_mt, llm).with_settings(settings(3, 2));

    let strings = sample_strings(7);
    let (results, stats) = translator.translate_batch(&strings, "de", None, None).await;

    assert_eq!(fast_calls.batch_sizes(), vec![3, 3, 1]);
    assert_eq!(llm_calls.total_calls(), 0);
    let expected: Vec<&str> = strings.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys(&results), expected);
    assert!(results.iter().all(|r| r.provider == ProviderKind::FastMt && !r.fallback_used));
    assert_eq!(results[4].translation, "Message number 4 [de]");
    assert_eq!(stats.fast_mt_count, 7);
    assert_stats_consistent(&stats, &results);
}

/// Test skip partitioning and quality-based escalation in one batch
#[tokio::test]
async fn test_translateBatch_withMixedStrings_shouldRouteEachString() {
    common::init_test_logging();
    let fast_mt = MockFastMt::working().with_translation(drop_placeholders);
    let fast_calls = fast_mt.calls();
    let llm = MockLlm::working().with_translation(germanize);
    let llm_calls = llm.calls();
    let translator = mock_translator(fast_mt, llm);

    let (results, stats) = translator.translate_batch(&mixed_strings(), "de", None, None).await;

    assert_eq!(
        keys(&results),
        vec!["greeting", "count", "settings_title", "delete_prompt", "help_url"]
    );
    assert_eq!(fast_calls.batch_sizes(), vec![3]);
    assert_eq!(llm_calls.batch_sizes(), vec![2]);

    assert_eq!(results[0].provider, ProviderKind::Llm);
    assert!(results[0].fallback_used);
    assert_eq!(results[0].translation, "Hallo %@");

    assert_eq!(results[1].provider, ProviderKind::Skip);
    assert_eq!(results[1].translation, "42");
    assert_eq!(results[1].quality.overall, 100.0);

    assert_eq!(results[2].provider, ProviderKind::FastMt);
    assert_eq!(results[2].translation, "Settings");

    assert_eq!(results[3].provider, ProviderKind::Llm);
    assert_eq!(results[3].translation, "Löschen %lld cards?");
    assert_eq!(results[3].quality.placeholder_score, 100.0);

    assert_eq!(results[4].provider, ProviderKind::Skip);

    assert_eq!(stats.skipped_count, 2);
    assert_eq!(stats.fast_mt_count, 1);
    assert_eq!(stats.llm_count, 2);
    assert!((stats.fallback_rate() - 200.0 / 3.0).abs() < 1e-9);
    assert_stats_consistent(&stats, &results);
}

/// Test that a failed fast-MT chunk sends the whole chunk to the LLM in LLM-sized batches
#[tokio::test]
async fn test_translateBatch_withFastMtBatchFailure_shouldFallBackInChunks() {
    let llm = MockLlm::working();
    let llm_calls = llm.calls();
    let translator = mock_translator(MockFastMt::batch_failing(), llm).with_settings(settings(50, 2));

    let (results, stats) = translator.translate_batch(&sample_strings(5), "fr", None, None).await;

    assert_eq!(llm_calls.batch_sizes(), vec![2, 2, 1]);
    assert_eq!(llm_calls.single_calls(), 0);
    assert!(results.iter().all(|r| r.provider == ProviderKind::Llm && r.fallback_used));
    assert_eq!(stats.llm_count, 5);
    assert_stats_consistent(&stats, &results);
}

/// Test that empty fast-MT output counts as a failure for that item
#[tokio::test]
async fn test_translateBatch_withEmptyFastMtOutput_shouldEscalate() {
    let llm = MockLlm::working();
    let llm_calls = llm.calls();
    let translator = mock_translator(MockFastMt::empty(), llm);

    let (results, _) = translator.translate_batch(&sample_strings(3), "it", None, None).await;

    assert_eq!(llm_calls.batch_sizes(), vec![3]);
    assert!(results.iter().all(|r| r.provider == ProviderKind::Llm && r.success()));
}

/// Test that items missing from an LLM batch reply are retried one by one
#[tokio::test]
async fn test_translateBatch_withDroppedLlmItems_shouldRetryIndividually() {
    let llm = MockLlm::working().dropping(&[1]);
    let llm_calls = llm.calls();
    let translator = mock_translator(MockFastMt::failing(), llm).with_settings(settings(50, 2));

    let (results, stats) = translator.translate_batch(&sample_strings(4), "es", None, None).await;

    assert_eq!(llm_calls.batch_sizes(), vec![2, 2]);
    assert_eq!(llm_calls.single_calls(), 2);
    assert!(results.iter().all(TranslationResult::success));
    assert_eq!(results[1].translation, "Message number 1 [es]");
    assert_eq!(stats.llm_count, 4);
    assert_stats_consistent(&stats, &results);
}

/// Test that a failed LLM batch falls back to single requests for each item
#[tokio::test]
async fn test_translateBatch_withLlmBatchFailure_shouldRetryEveryItem() {
    let llm = MockLlm::batch_failing();
    let llm_calls = llm.calls();
    let translator = mock_translator(MockFastMt::failing(), llm).with_settings(settings(50, 3));

    let (results, stats) = translator.translate_batch(&sample_strings(3), "de", None, None).await;

    assert_eq!(llm_calls.batch_calls(), 1);
    assert_eq!(llm_calls.single_calls(), 3);
    assert_eq!(stats.llm_count, 3);
    assert_stats_consistent(&stats, &results);
}

/// Test that items neither engine can translate end as failures
#[tokio::test]
async fn test_translateBatch_withBothEnginesFailing_shouldReportTranslationFailed() {
    common::init_test_logging();
    let translator = mock_translator(MockFastMt::failing(), MockLlm::failing());
    let mut strings = sample_strings(3);
    strings.push(("count".to_string(), "100".to_string()));

    let (results, stats) = translator.translate_batch(&strings, "de", None, None).await;

    for result in &results[..3] {
        assert_eq!(result.provider, ProviderKind::Error);
        assert!(result.fallback_used);
        assert!(result.translation.is_empty());
        assert_eq!(result.error.as_deref(), Some(TRANSLATION_FAILED));
        assert_eq!(result.quality.overall, 0.0);
    }
    assert_eq!(results[3].provider, ProviderKind::Skip);
    assert_eq!(stats.failed_count, 3);
    assert_eq!(stats.skipped_count, 1);
    assert_stats_consistent(&stats, &results);
}

/// Test that an intermittently failing LLM still resolves every item
#[tokio::test]
async fn test_translateBatch_withIntermittentLlm_shouldRecover() {
    let llm = MockLlm::intermittent(2);
    let llm_calls = llm.calls();
    let translator = mock_translator(MockFastMt::failing(), llm).with_settings(settings(50, 2));

    let (results, stats) = translator.translate_batch(&sample_strings(4), "de", None, None).await;

    // batch ok, batch fails, two single retries (third ok, fourth fails)
    assert_eq!(llm_calls.batch_calls(), 2);
    assert_eq!(llm_calls.single_calls(), 2);
    assert_eq!(stats.llm_count, 3);
    assert_eq!(stats.failed_count, 1);
    assert_eq!(results[3].error.as_deref(), Some(TRANSLATION_FAILED));
    assert_stats_consistent(&stats, &results);
}

/// Test that force_llm bypasses fast-MT and is not counted as a fallback
#[tokio::test]
async fn test_translateBatchWith_withForceLlm_shouldSkipFastMt() {
    let fast_mt = MockFastMt::working();
    let fast_calls = fast_mt.calls();
    let translator = mock_translator(fast_mt, MockLlm::working());

    let options = BatchOptions {
        force_llm: true,
        ..Default::default()
    };
    let (results, stats) = translator.translate_batch_with(&mixed_strings(), "de", options).await;

    assert_eq!(fast_calls.total_calls(), 0);
    assert_eq!(stats.llm_count, 3);
    assert_eq!(stats.skipped_count, 2);
    assert!(results.iter().all(|r| !r.fallback_used));
}

/// Test that the glossary for the target language reaches the LLM
#[tokio::test]
async fn test_translateBatch_withGlossary_shouldPassTermsToLlm() {
    let glossary = Glossary::new()
        .with_term("Deck", "fr", "Paquet")
        .with_term("Deck", "de", "Stapel");
    let llm = MockLlm::working();
    let translator = HybridTranslator::new(Arc::new(MockFastMt::failing()), Arc::new(llm.clone()), glossary);

    let strings = vec![("open_deck".to_string(), "Open Deck".to_string())];
    translator.translate_batch(&strings, "fr", Some("Library screen"), None).await;

    assert_eq!(llm.glossaries(), vec![vec![("Deck".to_string(), "Paquet".to_string())]]);
}

/// Test that progress is monotonic, bounded and ends at the total
#[tokio::test]
async fn test_translateBatch_withProgress_shouldReportPhases() {
    let translator = mock_translator(
        MockFastMt::working().with_translation(drop_placeholders),
        MockLlm::working().with_translation(germanize),
    )
    .with_settings(settings(2, 1));

    let events = Mutex::new(Vec::new());
    let progress = |current: usize, total: usize, status: &str| {
        events.lock().push((current, total, status.to_string()));
    };
    translator.translate_batch(&mixed_strings(), "de", None, Some(&progress)).await;

    let events = events.into_inner();
    assert!(events.iter().all(|(_, total, _)| *total == 5));
    assert!(events.windows(2).all(|pair| pair[0].0 <= pair[1].0));

    let statuses: Vec<&str> = events.iter().map(|(_, _, s)| s.as_str()).collect();
    assert_eq!(statuses.first(), Some(&"Translating with MockFastMt..."));
    assert!(statuses.contains(&"MockFastMt: 2/3"));
    assert!(statuses.contains(&"MockFastMt: 3/3"));
    assert!(statuses.contains(&"Scoring translations..."));
    assert!(statuses.contains(&"Re-translating 2 strings with MockLlm..."));
    assert!(statuses.contains(&"MockLlm: 2/2"));
    assert_eq!(events.last(), Some(&(5, 5, "Done".to_string())));
}

/// Test that a batch cancelled up front makes no calls and cancels every item
#[tokio::test]
async fn test_translateBatchCancellable_withCancelledFlag_shouldCancelAll() {
    let fast_mt = MockFastMt::working();
    let fast_calls = fast_mt.calls();
    let translator = mock_translator(fast_mt, MockLlm::working());
    let cancel = CancelFlag::new();
    cancel.cancel();

    let strings = sample_strings(4);
    let (results, stats) = translator
        .translate_batch_cancellable(&strings, "de", None, None, Some(&cancel))
        .await;

    assert_eq!(fast_calls.total_calls(), 0);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.error.as_deref() == Some(TRANSLATION_CANCELLED)));
    assert_eq!(stats.failed_count, 4);
}

/// Test that cancelling mid-run keeps finished chunks and cancels the rest
#[tokio::test]
async fn test_translateBatchCancellable_cancelledAfterFirstChunk_shouldKeepDoneItems() {
    common::init_test_logging();
    let fast_mt = MockFastMt::working();
    let fast_calls = fast_mt.calls();
    let llm = MockLlm::working();
    let llm_calls = llm.calls();
    let translator = mock_translator(fast_mt, llm).with_settings(settings(2, 2));

    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let last_status = Mutex::new(String::new());
    let progress = |_: usize, _: usize, status: &str| {
        if status.starts_with("MockFastMt:") {
            trigger.cancel();
        }
        *last_status.lock() = status.to_string();
    };

    let strings = sample_strings(6);
    let (results, stats) = translator
        .translate_batch_cancellable(&strings, "de", None, Some(&progress), Some(&cancel))
        .await;

    assert_eq!(fast_calls.batch_sizes(), vec![2]);
    assert_eq!(llm_calls.total_calls(), 0);
    assert_eq!(keys(&results), strings.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>());
    assert!(results[..2].iter().all(|r| r.provider == ProviderKind::FastMt));
    assert!(results[2..].iter().all(|r| r.error.as_deref() == Some(TRANSLATION_CANCELLED)));
    assert_eq!(stats.fast_mt_count, 2);
    assert_eq!(stats.failed_count, 4);
    assert_eq!(*last_status.lock(), "Cancelled");
}

/// Test single-string translation with context
#[tokio::test]
async fn test_translate_withWeakFastMt_shouldEscalateToLlm() {
    let llm = MockLlm::working().with_translation(germanize);
    let llm_calls = llm.calls();
    let translator = mock_translator(MockFastMt::working().with_translation(drop_placeholders), llm);

    let result = translator.translate("greeting", "Hello %@", "de", Some("Home screen"), false).await;
    assert_eq!(result.provider, ProviderKind::Llm);
    assert!(result.fallback_used);
    assert_eq!(result.translation, "Hallo %@");
    assert!(result.quality.passed());
    assert_eq!(result.quality.placeholder_score, 100.0);
    assert_eq!(llm_calls.single_calls(), 1);

    let translator = common::mock_translator(MockFastMt::working(), MockLlm::empty());
    let result = translator.translate("greeting", "Hello %@", "de", None, true).await;
    assert!(!result.success());
    assert!(result.error.is_some());
}
