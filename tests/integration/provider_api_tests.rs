/*!
 * Integration tests for the DeepL and OpenAI clients.
 *
 * Each test runs the real HTTP client against a local mock server and
 * checks request shape, reply parsing and retry behavior.
 */

use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xclate::errors::ProviderError;
use xclate::providers::deepl::DeepL;
use xclate::providers::openai::OpenAI;
use xclate::providers::{FastMtClient, LlmClient, RetryPolicy};
use xclate::translation::{Glossary, HybridTranslator, ProviderKind};

use crate::common;

fn deepl_client(server: &MockServer) -> DeepL {
    DeepL::new("deepl-key", server.uri(), 5).with_retry(RetryPolicy::new(2, 1))
}

fn openai_client(server: &MockServer) -> OpenAI {
    OpenAI::new("sk-test", server.uri(), "gpt-test", 5).with_retry(RetryPolicy::new(2, 1))
}

fn deepl_reply(texts: &[&str]) -> Value {
    let translations: Vec<Value> = texts
        .iter()
        .map(|text| json!({ "detected_source_language": "EN", "text": text }))
        .collect();
    json!({ "translations": translations })
}

fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 12 }
    })
}

/// Test a DeepL batch request and its order-preserving reply
#[tokio::test]
async fn test_deepl_translateBatch_withValidKey_shouldSendExpectedRequest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .and(header("Authorization", "DeepL-Auth-Key deepl-key"))
        .and(body_partial_json(json!({
            "text": ["Hello %@", "Settings"],
            "target_lang": "DE",
            "source_lang": "EN",
            "formality": "less",
            "preserve_formatting": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepl_reply(&["Hallo %@", "Einstellungen"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = deepl_client(&server).with_formality(Some("less".to_string()));
    let texts = vec!["Hello %@".to_string(), "Settings".to_string()];
    let results = client.translate_batch(&texts, "de", Some("en")).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "Hallo %@");
    assert_eq!(results[1].text, "Einstellungen");
    assert_eq!(results[0].detected_source_lang.as_deref(), Some("EN"));
}

/// Test that DeepL 5xx replies are retried until the request succeeds
#[tokio::test]
async fn test_deepl_translateOne_withServerErrors_shouldRetry() {
    common::init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepl_reply(&["Bonjour"])))
        .expect(1)
        .mount(&server)
        .await;

    let result = deepl_client(&server).translate_one("Hello", "fr", None).await.unwrap();
    assert_eq!(result.text, "Bonjour");
}

/// Test that an authentication failure is reported without retrying
#[tokio::test]
async fn test_deepl_translateOne_withInvalidKey_shouldFailFast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let error = deepl_client(&server).translate_one("Hello", "fr", None).await.unwrap_err();
    assert!(matches!(error, ProviderError::AuthenticationError(_)));
}

/// Test that a reply with the wrong number of items is rejected
#[tokio::test]
async fn test_deepl_translateBatch_withShortReply_shouldFail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepl_reply(&["Uno"])))
        .mount(&server)
        .await;

    let texts = vec!["One".to_string(), "Two".to_string()];
    let error = deepl_client(&server).translate_batch(&texts, "it", None).await.unwrap_err();
    assert!(matches!(error, ProviderError::ParseError(_)));
}

/// Test a single OpenAI translation with glossary and context
#[tokio::test]
async fn test_openai_translateOne_shouldCleanReply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-test", "max_completion_tokens": 500 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("\"Translation: Paquet ouvert\"")))
        .expect(1)
        .mount(&server)
        .await;

    let glossary = vec![("Deck".to_string(), "Paquet".to_string())];
    let translation = openai_client(&server)
        .translate_one("Deck opened", "fr", Some("Toast message"), &glossary)
        .await
        .unwrap();
    assert_eq!(translation, "Paquet ouvert");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(system.contains("- 'Deck' -> 'Paquet'"));
    assert!(user.starts_with("Translate to French:\nDeck opened"));
    assert!(user.ends_with("[UI Context: Toast message]"));
}

/// Test that the refusal marker is turned into an error
#[tokio::test]
async fn test_openai_translateOne_withUnableMarker_shouldFail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("[UNABLE]")))
        .mount(&server)
        .await;

    let result = openai_client(&server).translate_one("asdf qwer", "de", None, &[]).await;
    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

/// Test that batch replies are matched back to inputs by ID
#[tokio::test]
async fn test_openai_translateBatch_withShuffledReply_shouldReorderById() {
    let server = MockServer::start().await;
    let content = json!({
        "translations": [
            { "id": "2", "translation": "Drei" },
            { "id": "0", "translation": "Eins" }
        ]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": { "type": "json_object" },
            "max_completion_tokens": 4000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&content)))
        .expect(1)
        .mount(&server)
        .await;

    let texts = vec!["One".to_string(), "Two".to_string(), "Three".to_string()];
    let translations = openai_client(&server).translate_batch(&texts, "de", None, &[]).await.unwrap();
    assert_eq!(translations, vec!["Eins", "", "Drei"]);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("\"id\": \"1\""));
    assert!(user.contains("\"text\": \"Two\""));
}

/// Test that a rate limit is retried and a garbage batch reply is a parse error
#[tokio::test]
async fn test_openai_translateBatch_afterRateLimit_shouldReportParseError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("Sorry, I cannot do that.")))
        .expect(1)
        .mount(&server)
        .await;

    let texts = vec!["One".to_string()];
    let result = openai_client(&server).translate_batch(&texts, "de", None, &[]).await;
    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

/// Test parsing of a structured review reply
#[tokio::test]
async fn test_openai_review_shouldParseVerdict() {
    let server = MockServer::start().await;
    let content = "```json\n{\"semantic_score\": 88, \"fluency_score\": 92, \"issues\": [\"Too formal\"], \"suggested_fix\": \"Hi\"}\n```";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(content)))
        .mount(&server)
        .await;

    let verdict = openai_client(&server)
        .review("Hello", "Guten Tag", "de", Some("Chat greeting"))
        .await
        .unwrap();
    assert_eq!(verdict.semantic_score, 88.0);
    assert_eq!(verdict.fluency_score, 92.0);
    assert_eq!(verdict.issues, vec!["Too formal"]);
    assert_eq!(verdict.suggested_fix.as_deref(), Some("Hi"));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.starts_with("Review this English to German translation:"));
    assert!(user.contains("CONTEXT: Chat greeting"));
}

/// Test that suggestions beyond the requested count are dropped
#[tokio::test]
async fn test_openai_reviewWithSuggestions_shouldTruncateToCount() {
    let server = MockServer::start().await;
    let content = json!({
        "issues": [],
        "suggestions": [
            { "text": "Speichern", "explanation": "Standard" },
            { "text": "", "explanation": "Empty" },
            { "text": "Sichern", "explanation": "Alternative" },
            { "text": "Ablegen", "explanation": "Rare" }
        ]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&content)))
        .mount(&server)
        .await;

    let verdict = openai_client(&server)
        .review_with_suggestions("Save", "Speicher", "de", None, 2)
        .await
        .unwrap();
    let texts: Vec<&str> = verdict.suggestions.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Speichern", "Sichern"]);
}

/// Test the full hybrid path over HTTP: a DeepL result with a dropped
/// placeholder is re-translated by the LLM
#[tokio::test]
async fn test_hybridTranslator_overHttp_shouldFallBackOnBrokenPlaceholder() {
    common::init_test_logging();
    let deepl_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deepl_reply(&["Hallo", "Einstellungen"])))
        .expect(1)
        .mount(&deepl_server)
        .await;

    let openai_server = MockServer::start().await;
    let content = json!({ "translations": [{ "id": 0, "translation": "Hallo %@" }] }).to_string();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(&content)))
        .expect(1)
        .mount(&openai_server)
        .await;

    let translator = HybridTranslator::new(
        Arc::new(deepl_client(&deepl_server)),
        Arc::new(openai_client(&openai_server)),
        Glossary::new(),
    );
    let strings = vec![
        ("greeting".to_string(), "Hello %@".to_string()),
        ("settings".to_string(), "Settings".to_string()),
    ];
    let (results, stats) = translator.translate_batch(&strings, "de", None, None).await;

    assert_eq!(results[0].provider, ProviderKind::Llm);
    assert_eq!(results[0].translation, "Hallo %@");
    assert_eq!(results[1].provider, ProviderKind::FastMt);
    assert_eq!(results[1].translation, "Einstellungen");
    assert_eq!(stats.fast_mt_count, 1);
    assert_eq!(stats.llm_count, 1);
}
