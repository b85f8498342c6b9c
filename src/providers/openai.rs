use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils::display_name;
use crate::providers::{LlmClient, RetryPolicy, ReviewVerdict, SuggestionVerdict, null_as_default};

/// Default API base URL
pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Reply the model is told to give when it cannot translate
const UNABLE_MARKER: &str = "[UNABLE]";

/// Prefixes models sometimes put in front of a bare translation
const RESPONSE_PREFIXES: &[&str] = &[
    "Translation:",
    "Translated:",
    "Here is the translation:",
    "The translation is:",
];

/// OpenAI client for chat-completions compatible APIs
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, `/chat/completions` is appended
    endpoint: String,
    /// Model name
    model: String,
    /// Sampling temperature for translation
    temperature: f32,
    /// Sampling temperature for review
    review_temperature: f32,
    /// Completion token limit for single translations and reviews
    max_tokens: u32,
    /// Completion token limit for batch translations and suggestions
    batch_max_tokens: u32,
    /// Short description of the app, used in prompts
    app_context: String,
    /// Source language code of the catalog
    source_language: String,
    /// Retry settings for transient failures
    retry: RetryPolicy,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Requested response format
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,

    /// Force a JSON object reply
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl OpenAIRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_completion_tokens: None,
            response_format: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_tokens);
        self
    }

    /// Ask for a JSON object reply
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            format_type: "json_object".to_string(),
        });
        self
    }
}

/// Token usage information
#[derive(Debug, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Individual choice in a chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// Message of a choice; content may be null
#[derive(Debug, Deserialize)]
pub struct OpenAIMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// One item of a batch translation request
#[derive(Debug, Serialize)]
struct BatchItem<'a> {
    id: String,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchPayload<'a> {
    translations: Vec<BatchItem<'a>>,
}

/// Batch reply, either wrapped or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchReply {
    Wrapped { translations: Vec<BatchReplyItem> },
    Bare(Vec<BatchReplyItem>),
}

#[derive(Debug, Deserialize)]
struct BatchReplyItem {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    translation: String,
}

/// IDs come back as strings or numbers
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s.trim().to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Remove a surrounding ```json fence if the model added one
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

/// Strip wrapping quotes and "Translation:"-style prefixes
pub fn clean_response(response: &str) -> String {
    let mut cleaned = response.trim();

    if cleaned.len() >= 2
        && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
            || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
    {
        cleaned = &cleaned[1..cleaned.len() - 1];
    }

    for prefix in RESPONSE_PREFIXES {
        if let Some(head) = cleaned.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                cleaned = cleaned[prefix.len()..].trim();
            }
        }
    }

    cleaned.to_string()
}

/// Map a batch reply back onto input positions by ID
fn parse_batch_reply(content: &str, count: usize) -> Result<Vec<String>, ProviderError> {
    let reply: BatchReply = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ProviderError::ParseError(format!("Failed to parse batch response: {}", e)))?;

    let items = match reply {
        BatchReply::Wrapped { translations } => translations,
        BatchReply::Bare(items) => items,
    };

    let mut by_id: HashMap<String, String> = items.into_iter().map(|item| (item.id, item.translation)).collect();
    Ok((0..count)
        .map(|i| by_id.remove(&i.to_string()).unwrap_or_default())
        .collect())
}

fn glossary_lines(glossary: &[(String, String)]) -> String {
    glossary
        .iter()
        .map(|(term, translation)| format!("- '{}' -> '{}'\n", term, translation))
        .collect()
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let endpoint = match endpoint.trim_end_matches('/') {
            "" => OPENAI_DEFAULT_ENDPOINT.to_string(),
            custom => custom.to_string(),
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint,
            model: model.into(),
            temperature: 0.3,
            review_temperature: 0.2,
            max_tokens: 500,
            batch_max_tokens: 4000,
            app_context: "mobile app".to_string(),
            source_language: "en".to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set translation and review temperatures
    pub fn with_temperatures(mut self, temperature: f32, review_temperature: f32) -> Self {
        self.temperature = temperature;
        self.review_temperature = review_temperature;
        self
    }

    /// Set completion token limits
    pub fn with_token_limits(mut self, max_tokens: u32, batch_max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self.batch_max_tokens = batch_max_tokens;
        self
    }

    /// Describe the app in prompts, e.g. "language learning app called MintDeck"
    pub fn with_app_context(mut self, app_context: impl Into<String>) -> Self {
        self.app_context = app_context.into();
        self
    }

    /// Set the catalog source language
    pub fn with_source_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request with retries
    pub async fn complete(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let api_url = format!("{}/chat/completions", self.endpoint);
        let api_url = api_url.as_str();

        self.retry
            .run("OpenAI chat completion", || async move {
                let response = self
                    .client
                    .post(api_url)
                    .bearer_auth(&self.api_key)
                    .json(request)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    error!("OpenAI API error ({}): {}", status, error_text);
                    return Err(ProviderError::from_status(status.as_u16(), error_text));
                }

                response
                    .json::<OpenAIResponse>()
                    .await
                    .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
            })
            .await
    }

    /// Extract text from the first choice
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("OpenAI response contained no content".to_string()))
    }

    async fn complete_text(&self, request: OpenAIRequest) -> Result<String, ProviderError> {
        let response = self.complete(&request).await?;
        if let Some(usage) = &response.usage {
            debug!("OpenAI usage: {} prompt / {} completion tokens", usage.prompt_tokens, usage.completion_tokens);
        }
        Self::extract_text_from_response(&response)
    }

    fn translation_system_prompt(&self, glossary: &[(String, String)]) -> String {
        let mut prompt = format!(
            "You are an expert iOS app translator for a {}.

CRITICAL RULES - FOLLOW EXACTLY:
1. Preserve ALL iOS format specifiers EXACTLY as they appear:
   - %@ (object/string placeholder)
   - %d, %ld, %lld (integer placeholders)
   - %f, %.2f (float placeholders)
   - %% (literal percent sign)
   - Positional specifiers like %1$@, %2$lld MUST stay in the translation

2. The ORDER of positional placeholders may change in translation, but you MUST use the SAME numbered placeholders.

3. Keep translations concise - mobile UI has limited space.

4. Use a natural, conversational tone.

5. Preserve emojis exactly as they appear.

6. Preserve any leading/trailing whitespace or newlines.

7. Respond with ONLY the translated text, nothing else.
   - No quotes around the translation
   - No explanations or notes
   - No \"Translation:\" prefix

8. If translation is absolutely impossible, respond with: {}",
            self.app_context, UNABLE_MARKER
        );

        if !glossary.is_empty() {
            prompt.push_str("\n\nGLOSSARY (use these exact terms in your translation):\n");
            prompt.push_str(&glossary_lines(glossary));
        }

        prompt
    }

    fn batch_system_prompt(&self, glossary: &[(String, String)]) -> String {
        let mut prompt = format!(
            "You are an expert iOS app translator for a {}.

You will receive a JSON object with a \"translations\" array. Each item has \"id\" and \"text\".
Return a JSON object with a \"translations\" array. Each item must have \"id\" and \"translation\".
The order and IDs must match exactly.

CRITICAL RULES:
1. Return ONLY valid JSON - no explanations, no markdown
2. Preserve ALL iOS format specifiers exactly: %@, %d, %ld, %lld, %f, %.2f, %%, %1$@, %2$lld
3. Positional specifiers (%1$@, %2$@) may be reordered but MUST use the same numbers
4. Keep translations concise for mobile UI
5. Preserve emojis and whitespace exactly
6. If unable to translate an item, use the original text",
            self.app_context
        );

        if !glossary.is_empty() {
            prompt.push_str("\n\nGLOSSARY:\n");
            prompt.push_str(&glossary_lines(glossary));
        }

        prompt
    }

    fn review_system_prompt(lang_name: &str) -> String {
        format!(
            "You are an expert translator and quality reviewer for {lang} translations in a mobile app context.

Your task is to evaluate a translation and provide:
1. A semantic accuracy score (0-100): Does the translation convey the exact same meaning as the source?
2. A fluency score (0-100): Is the translation grammatically correct and natural-sounding in {lang}?
3. A list of specific issues found (empty if none)
4. A suggested fix if there are issues (null if translation is good)

IMPORTANT GUIDELINES:
- Focus on meaning preservation - minor phrasing differences are OK if meaning is preserved
- Consider mobile UI context - translations should be concise
- iOS format specifiers (%@, %d, %1$@, etc.) should be preserved but their position can change
- Be strict about semantic errors (wrong meaning, omissions, additions)
- Be lenient about stylistic differences

RESPONSE FORMAT (JSON only):
{{
  \"semantic_score\": <0-100>,
  \"fluency_score\": <0-100>,
  \"issues\": [\"issue 1\", \"issue 2\"],
  \"suggested_fix\": \"<corrected translation or null>\"
}}

Score guidelines:
- 95-100: Perfect or near-perfect translation
- 80-94: Good translation with minor issues
- 60-79: Acceptable but needs improvement
- Below 60: Significant problems, needs retranslation",
            lang = lang_name
        )
    }

    fn suggestions_system_prompt(lang_name: &str, count: usize) -> String {
        format!(
            "You are an expert translator and quality reviewer for {lang} translations in a mobile app context.

Your task is to:
1. Identify any issues with the translation (empty list if none)
2. Provide {count} alternative translation suggestions ranked by quality

IMPORTANT GUIDELINES:
- Focus on meaning preservation and natural phrasing
- Consider mobile UI context - translations should be concise
- iOS format specifiers (%@, %d, %1$@, etc.) MUST be preserved exactly
- If the translation is already perfect, still provide alternative phrasings for variety
- The first suggestion should be your best/recommended option

RESPONSE FORMAT (JSON only):
{{
  \"issues\": [\"issue 1\", \"issue 2\"],
  \"suggestions\": [
    {{\"text\": \"<best translation>\", \"explanation\": \"<brief reason>\"}},
    {{\"text\": \"<alternative>\", \"explanation\": \"<brief reason>\"}}
  ]
}}",
            lang = lang_name,
            count = count
        )
    }

    fn review_user_prompt(
        &self,
        source: &str,
        translation: &str,
        lang_name: &str,
        context: Option<&str>,
        with_suggestions: bool,
    ) -> String {
        let source_name = display_name(&self.source_language);
        let (intro, label, outro) = if with_suggestions {
            ("and provide alternatives", "CURRENT TRANSLATION", "Provide your review and suggestions as JSON.")
        } else {
            ("", "TRANSLATION", "Provide your evaluation as JSON.")
        };

        let mut prompt = format!(
            "Review this {src} to {lang} translation{sep}{intro}:\n\nSOURCE ({src}):\n{source}\n\n{label} ({lang}):\n{translation}",
            src = source_name,
            lang = lang_name,
            sep = if intro.is_empty() { "" } else { " " },
            intro = intro,
            source = source,
            label = label,
            translation = translation,
        );

        if let Some(context) = context.filter(|c| !c.is_empty()) {
            prompt.push_str(&format!("\n\nCONTEXT: {}", context));
        }
        prompt.push_str("\n\n");
        prompt.push_str(outro);
        prompt
    }
}

fn with_ui_context(mut prompt: String, context: Option<&str>) -> String {
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n\n[UI Context: {}]", context));
    }
    prompt
}

#[async_trait]
impl LlmClient for OpenAI {
    async fn translate_one(
        &self,
        text: &str,
        target_lang: &str,
        context: Option<&str>,
        glossary: &[(String, String)],
    ) -> Result<String, ProviderError> {
        let lang_name = display_name(target_lang);
        let user_prompt = with_ui_context(format!("Translate to {}:\n{}", lang_name, text), context);

        let request = OpenAIRequest::new(&self.model)
            .add_message("system", self.translation_system_prompt(glossary))
            .add_message("user", user_prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        let translation = clean_response(&self.complete_text(request).await?);
        if translation == UNABLE_MARKER {
            return Err(ProviderError::ParseError("Model was unable to translate the text".to_string()));
        }
        Ok(translation)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        context: Option<&str>,
        glossary: &[(String, String)],
    ) -> Result<Vec<String>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let lang_name = display_name(target_lang);
        let payload = BatchPayload {
            translations: texts
                .iter()
                .enumerate()
                .map(|(i, text)| BatchItem { id: i.to_string(), text: text.as_str() })
                .collect(),
        };
        let payload = serde_json::to_string_pretty(&payload)?;
        let user_prompt = with_ui_context(format!("Translate to {}:\n\n{}", lang_name, payload), context);

        let request = OpenAIRequest::new(&self.model)
            .add_message("system", self.batch_system_prompt(glossary))
            .add_message("user", user_prompt)
            .temperature(self.temperature)
            .max_tokens(self.batch_max_tokens)
            .json_object();

        debug!("OpenAI: batch of {} texts to {}", texts.len(), target_lang);
        let content = self.complete_text(request).await?;
        let translations = parse_batch_reply(&content, texts.len())?;

        let missing = translations.iter().filter(|t| t.is_empty()).count();
        if missing > 0 {
            warn!("OpenAI batch reply is missing {} of {} items", missing, texts.len());
        }
        Ok(translations)
    }

    async fn review(
        &self,
        source: &str,
        translation: &str,
        target_lang: &str,
        context: Option<&str>,
    ) -> Result<ReviewVerdict, ProviderError> {
        let lang_name = display_name(target_lang);
        let request = OpenAIRequest::new(&self.model)
            .add_message("system", Self::review_system_prompt(&lang_name))
            .add_message("user", self.review_user_prompt(source, translation, &lang_name, context, false))
            .temperature(self.review_temperature)
            .max_tokens(self.max_tokens)
            .json_object();

        let content = self.complete_text(request).await?;
        let verdict: ReviewVerdict = serde_json::from_str(strip_code_fence(&content))?;
        Ok(verdict.normalized())
    }

    async fn review_with_suggestions(
        &self,
        source: &str,
        translation: &str,
        target_lang: &str,
        context: Option<&str>,
        count: usize,
    ) -> Result<SuggestionVerdict, ProviderError> {
        let lang_name = display_name(target_lang);
        let request = OpenAIRequest::new(&self.model)
            .add_message("system", Self::suggestions_system_prompt(&lang_name, count))
            .add_message("user", self.review_user_prompt(source, translation, &lang_name, context, true))
            .temperature(self.review_temperature)
            .max_tokens(self.batch_max_tokens)
            .json_object();

        let content = self.complete_text(request).await?;
        let verdict: SuggestionVerdict = serde_json::from_str(strip_code_fence(&content))?;
        Ok(verdict.normalized(count))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
