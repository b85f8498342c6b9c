use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{FastMtClient, FastMtTranslation, RetryPolicy};

/// Default endpoint for paid DeepL accounts
pub const DEEPL_PRO_ENDPOINT: &str = "https://api.deepl.com";
/// Default endpoint for free DeepL accounts (keys ending in `:fx`)
pub const DEEPL_FREE_ENDPOINT: &str = "https://api-free.deepl.com";

/// Target languages that accept a formality setting
const FORMALITY_SUPPORTED: &[&str] = &["DE", "FR", "IT", "ES", "NL", "PL", "PT-BR", "PT-PT", "RU"];

/// DeepL client for interacting with the DeepL API
#[derive(Debug)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL
    endpoint: String,
    /// Formality preference (`less`, `more`, `prefer_less`, `prefer_more`)
    formality: Option<String>,
    /// Retry settings for transient failures
    retry: RetryPolicy,
}

/// DeepL translate request
#[derive(Debug, Serialize)]
pub struct DeepLRequest {
    /// Texts to translate
    text: Vec<String>,

    /// Target language code, e.g. `DE` or `EN-US`
    target_lang: String,

    /// Source language code, auto-detected when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,

    /// Formality preference
    #[serde(skip_serializing_if = "Option::is_none")]
    formality: Option<String>,

    /// Keep punctuation and casing as in the source
    preserve_formatting: bool,
}

impl DeepLRequest {
    /// Create a new translate request
    pub fn new(text: Vec<String>, target_lang: &str) -> Self {
        Self {
            text,
            target_lang: target_language_code(target_lang),
            source_lang: None,
            formality: None,
            preserve_formatting: true,
        }
    }

    /// Set the source language
    pub fn source_lang(mut self, source_lang: &str) -> Self {
        self.source_lang = Some(source_language_code(source_lang));
        self
    }

    /// Set the formality, ignored for languages that do not support it
    pub fn formality(mut self, formality: &str) -> Self {
        if formality != "default" && FORMALITY_SUPPORTED.contains(&self.target_lang.as_str()) {
            self.formality = Some(formality.to_string());
        }
        self
    }
}

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    pub translations: Vec<DeepLTranslation>,
}

/// Individual translation in a DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    #[serde(default)]
    pub detected_source_language: Option<String>,
    pub text: String,
}

/// DeepL target code for an ISO language code
pub fn target_language_code(language: &str) -> String {
    match language.to_lowercase().as_str() {
        "en" => "EN-US".to_string(),
        "pt" => "PT-PT".to_string(),
        other => other.to_uppercase(),
    }
}

/// DeepL source code for an ISO language code (source codes carry no region)
pub fn source_language_code(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_uppercase()
}

impl DeepL {
    /// Create a new DeepL client
    ///
    /// An empty endpoint selects the free or pro API from the key suffix.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let api_key = api_key.into();
        let endpoint = endpoint.into();
        let endpoint = match endpoint.trim_end_matches('/') {
            "" if api_key.ends_with(":fx") => DEEPL_FREE_ENDPOINT.to_string(),
            "" => DEEPL_PRO_ENDPOINT.to_string(),
            custom => custom.to_string(),
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            endpoint,
            formality: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the formality preference
    pub fn with_formality(mut self, formality: Option<String>) -> Self {
        self.formality = formality.filter(|f| !f.is_empty() && f != "default");
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one translate request with retries
    pub async fn complete(&self, request: &DeepLRequest) -> Result<DeepLResponse, ProviderError> {
        let api_url = format!("{}/v2/translate", self.endpoint);
        let api_url = api_url.as_str();

        self.retry
            .run("DeepL translate", || async move {
                let response = self
                    .client
                    .post(api_url)
                    .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
                    .json(request)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    error!("DeepL API error ({}): {}", status, error_text);
                    return Err(ProviderError::from_status(status.as_u16(), error_text));
                }

                response
                    .json::<DeepLResponse>()
                    .await
                    .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL API response: {}", e)))
            })
            .await
    }

    fn build_request(&self, texts: Vec<String>, target_lang: &str, source_lang: Option<&str>) -> DeepLRequest {
        let mut request = DeepLRequest::new(texts, target_lang);
        if let Some(source_lang) = source_lang {
            request = request.source_lang(source_lang);
        }
        if let Some(formality) = &self.formality {
            request = request.formality(formality);
        }
        request
    }
}

#[async_trait]
impl FastMtClient for DeepL {
    async fn translate_one(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<FastMtTranslation, ProviderError> {
        let mut results = self.translate_batch(&[text.to_string()], target_lang, source_lang).await?;
        results
            .pop()
            .ok_or_else(|| ProviderError::ParseError("DeepL returned no translation".to_string()))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<Vec<FastMtTranslation>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.build_request(texts.to_vec(), target_lang, source_lang);
        debug!("DeepL: translating {} texts to {}", texts.len(), request.target_lang);

        let response = self.complete(&request).await?;
        if response.translations.len() != texts.len() {
            return Err(ProviderError::ParseError(format!(
                "DeepL returned {} translations for {} texts",
                response.translations.len(),
                texts.len()
            )));
        }

        Ok(response
            .translations
            .into_iter()
            .map(|t| FastMtTranslation {
                text: t.text,
                detected_source_lang: t.detected_source_language,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "DeepL"
    }
}
