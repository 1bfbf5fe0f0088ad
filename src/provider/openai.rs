use crate::config::Config;
use crate::i18n::{LanguageRegistry, TranslationMetrics, TranslationValidator};
use crate::provider::{ProviderError, ProviderRequest, TranslationProvider};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Token ceiling for reasoning models, which spend tokens before answering.
const REASONING_MAX_TOKENS: u32 = 16000;

/// OpenAI Chat Completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

const TRANSLATION_RULES: &str = r#"## Rules

### DO NOT translate:
- URLs, email addresses and file paths
- Placeholders such as {name}, {{count}}, %s or %d
- Code snippets and technical identifiers
- Proper names of people, companies and products

### Formatting:
- Preserve markdown, HTML tags, line breaks and emojis
- Keep leading and trailing punctuation
- Keep the same tone and register as the original"#;

/// System prompt for translating into one language
fn build_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the user's text from {} to {}.\n\n{}\n\nReply with the translated text only, without quotes or commentary.",
        source_language, target_language, TRANSLATION_RULES
    )
}

/// System prompt for translating into several languages with one request
fn build_batch_system_prompt(source_language: &str, targets: &[(&str, &str)]) -> String {
    let target_list = targets
        .iter()
        .map(|(code, name)| format!("- \"{}\": {}", code, name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a professional translator. Translate the user's text from {} into each of these languages:\n{}\n\n{}\n\nReply with a JSON object whose keys are exactly the language codes above and whose values are the translated text.",
        source_language, target_list, TRANSLATION_RULES
    )
}

/// OpenAI-compatible chat-completions translator.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    fast_model: Option<String>,
    max_tokens: u32,
    retry: RetryConfig,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            fast_model: None,
            max_tokens: 1000,
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut provider = Self::new(config.openai_api_key.clone())
            .with_api_url(config.openai_api_url.clone())
            .with_model(config.openai_model.clone())
            .with_max_tokens(config.openai_max_tokens);
        provider.fast_model = config.openai_fast_model.clone();
        provider
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Model used for requests flagged `fast`.
    pub fn with_fast_model(mut self, model: impl Into<String>) -> Self {
        self.fast_model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn model_for(&self, fast: bool) -> &str {
        match (&self.fast_model, fast) {
            (Some(fast_model), true) => fast_model,
            _ => &self.model,
        }
    }

    fn build_request(
        &self,
        fast: bool,
        system_prompt: String,
        text: &str,
        max_tokens: u32,
        json_output: bool,
    ) -> ChatRequest {
        let model = self.model_for(fast).to_string();
        // Reasoning models don't support temperature - use reasoning_effort instead
        let is_reasoning = is_reasoning_model(&model);

        ChatRequest {
            model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            max_completion_tokens: if is_reasoning {
                REASONING_MAX_TOKENS
            } else {
                max_tokens
            },
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: match (is_reasoning, fast) {
                (true, true) => Some("minimal".to_string()),
                (true, false) => Some("low".to_string()),
                (false, _) => None,
            },
            response_format: json_output.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ProviderError::Api { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn complete(
        &self,
        request: &ChatRequest,
        operation_name: &str,
    ) -> Result<String, ProviderError> {
        with_retry_if(
            &self.retry,
            operation_name,
            || self.send(request),
            ProviderError::is_retryable,
        )
        .await
    }

    fn log_validation(original: &str, translated: &str, target: &str) {
        let validation = TranslationValidator::validate(original, translated);
        if validation.has_warnings() {
            warn!(
                "Translation validation warnings for {}: {:?}",
                target, validation.warnings
            );
        }
    }

    async fn translate_chunk(
        &self,
        request: &ProviderRequest<'_>,
        chunk: &[String],
    ) -> Result<HashMap<String, String>, ProviderError> {
        let registry = LanguageRegistry::get();
        let targets: Vec<(&str, &str)> = chunk
            .iter()
            .map(|code| (code.as_str(), registry.display_name(code)))
            .collect();
        let system_prompt =
            build_batch_system_prompt(registry.display_name(request.source), &targets);
        let max_tokens = self
            .max_tokens
            .saturating_mul(chunk.len() as u32)
            .min(REASONING_MAX_TOKENS);
        let chat = self.build_request(request.fast, system_prompt, request.text, max_tokens, true);

        let content = self
            .complete(&chat, &format!("Translation to [{}]", chunk.join(", ")))
            .await?;

        parse_batch_response(&content, chunk)
    }
}

/// Extract one string per requested language from a JSON object reply.
fn parse_batch_response(
    content: &str,
    targets: &[String],
) -> Result<HashMap<String, String>, ProviderError> {
    let parsed: serde_json::Value = serde_json::from_str(content.trim())
        .map_err(|e| ProviderError::Malformed(format!("expected a JSON object: {}", e)))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| ProviderError::Malformed("expected a JSON object".to_string()))?;

    targets
        .iter()
        .map(|target| match object.get(target) {
            Some(serde_json::Value::String(text)) => Ok((target.clone(), text.clone())),
            Some(_) => Err(ProviderError::Malformed(format!(
                "translation for '{}' is not a string",
                target
            ))),
            None => Err(ProviderError::Malformed(format!(
                "missing translation for '{}'",
                target
            ))),
        })
        .collect()
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate(
        &self,
        request: &ProviderRequest<'_>,
        target: &str,
    ) -> Result<String, ProviderError> {
        if target == request.source {
            return Ok(request.text.to_string());
        }

        let registry = LanguageRegistry::get();
        let target_name = registry.display_name(target);
        let system_prompt = build_system_prompt(registry.display_name(request.source), target_name);
        let chat = self.build_request(
            request.fast,
            system_prompt,
            request.text,
            self.max_tokens,
            false,
        );

        let translated = self
            .complete(&chat, &format!("Translation to {}", target_name))
            .await?
            .trim()
            .to_string();

        Self::log_validation(request.text, &translated, target);
        Ok(translated)
    }

    async fn translate_batch(
        &self,
        request: &ProviderRequest<'_>,
        targets: &[String],
    ) -> Result<HashMap<String, String>, ProviderError> {
        let words = word_count(request.text);
        if words > request.hints.ideal_batch_item_size {
            debug!(
                "Text of {} words exceeds the ideal request size of {} words",
                words, request.hints.ideal_batch_item_size
            );
        }

        let metrics = TranslationMetrics::global();
        let mut translations = HashMap::with_capacity(targets.len());
        let mut last_error = None;

        // A failed chunk only costs its own languages.
        for chunk in targets.chunks(request.hints.batch_size.max(1)) {
            metrics.record_provider_call();
            match self.translate_chunk(request, chunk).await {
                Ok(chunk_translations) => translations.extend(chunk_translations),
                Err(e) => {
                    metrics.record_provider_failure();
                    warn!("Batch translation to [{}] failed: {}", chunk.join(", "), e);
                    last_error = Some(e);
                }
            }
        }
        if let Some(e) = last_error.filter(|_| translations.is_empty()) {
            return Err(e);
        }

        for (target, translated) in &translations {
            Self::log_validation(request.text, translated, target);
        }
        Ok(translations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::BatchHints;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    fn create_provider(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new("test-openai-key")
            .with_api_url(format!("{}/v1/chat/completions", server.uri()))
            .with_retry(RetryConfig::new(3, Duration::from_millis(5)))
    }

    fn request(text: &str) -> ProviderRequest<'_> {
        ProviderRequest {
            text,
            source: "en",
            fast: false,
            hints: BatchHints::default(),
        }
    }

    // ==================== Prompt Tests ====================

    #[test]
    fn test_system_prompt_names_languages() {
        let prompt = build_system_prompt("English", "French");
        assert!(prompt.contains("from English to French"));
        assert!(prompt.contains("DO NOT translate"));
        assert!(prompt.contains("Placeholders"));
        assert!(prompt.contains("translated text only"));
    }

    #[test]
    fn test_batch_prompt_lists_codes() {
        let prompt = build_batch_system_prompt("English", &[("fr", "French"), ("hi", "Hindi")]);
        assert!(prompt.contains("- \"fr\": French"));
        assert!(prompt.contains("- \"hi\": Hindi"));
        assert!(prompt.contains("JSON object"));
    }

    #[test]
    fn test_is_reasoning_model() {
        assert!(is_reasoning_model("gpt-5-mini"));
        assert!(is_reasoning_model("o1-preview"));
        assert!(is_reasoning_model("o3"));
        assert!(is_reasoning_model("o4-mini"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
        assert!(!is_reasoning_model("gpt-4-turbo"));
    }

    // ==================== Request Structure Tests ====================

    #[test]
    fn test_request_for_standard_model() {
        let provider = OpenAiProvider::new("k");
        let chat = provider.build_request(false, "sys".into(), "Hello", 1000, false);
        let json = serde_json::to_value(&chat).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_completion_tokens"], 1000);
        assert!((json["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(json.get("reasoning_effort").is_none());
        assert!(json.get("response_format").is_none());
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_request_for_reasoning_model() {
        let provider = OpenAiProvider::new("k").with_model("gpt-5-mini");
        let json = serde_json::to_value(provider.build_request(false, "s".into(), "t", 1000, true)).unwrap();

        assert_eq!(json["max_completion_tokens"], 16000);
        assert_eq!(json["reasoning_effort"], "low");
        assert!(json.get("temperature").is_none());
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_fast_request_uses_fast_model() {
        let provider = OpenAiProvider::new("k")
            .with_model("gpt-4o")
            .with_fast_model("o4-mini");

        let slow = serde_json::to_value(provider.build_request(false, "s".into(), "t", 10, false)).unwrap();
        let fast = serde_json::to_value(provider.build_request(true, "s".into(), "t", 10, false)).unwrap();

        assert_eq!(slow["model"], "gpt-4o");
        assert_eq!(fast["model"], "o4-mini");
        assert_eq!(fast["reasoning_effort"], "minimal");
    }

    #[test]
    fn test_fast_without_fast_model_keeps_model() {
        let provider = OpenAiProvider::new("k");
        assert_eq!(provider.model_for(true), "gpt-4o-mini");
    }

    // ==================== Batch Parsing Tests ====================

    #[test]
    fn test_parse_batch_response() {
        let targets = vec!["fr".to_string(), "hi".to_string()];
        let parsed =
            parse_batch_response(r#"{"fr": "Bonjour", "hi": "नमस्ते", "de": "Hallo"}"#, &targets).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["fr"], "Bonjour");
        assert_eq!(parsed["hi"], "नमस्ते");
    }

    #[test]
    fn test_parse_batch_response_missing_language() {
        let targets = vec!["fr".to_string(), "hi".to_string()];
        let err = parse_batch_response(r#"{"fr": "Bonjour"}"#, &targets).unwrap_err();
        assert!(err.to_string().contains("missing translation for 'hi'"));
    }

    #[test]
    fn test_parse_batch_response_rejects_non_object() {
        let targets = vec!["fr".to_string()];
        assert!(matches!(
            parse_batch_response("Bonjour", &targets),
            Err(ProviderError::Malformed(_))
        ));
        assert!(matches!(
            parse_batch_response(r#"{"fr": 3}"#, &targets),
            Err(ProviderError::Malformed(_))
        ));
    }

    // ==================== Integration Tests with Wiremock ====================

    #[tokio::test]
    async fn test_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-openai-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response("Bonjour le monde\n")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let result = provider.translate(&request("Hello world"), "fr").await.unwrap();

        assert_eq!(result, "Bonjour le monde");
    }

    #[tokio::test]
    async fn test_translate_to_source_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let result = provider.translate(&request("Hello"), "en").await.unwrap();
        assert_eq!(result, "Hello");
    }

    #[tokio::test]
    async fn test_translate_retries_on_500_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Hola")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let result = provider.translate(&request("Hello"), "es").await.unwrap();
        assert_eq!(result, "Hola");
    }

    #[tokio::test]
    async fn test_translate_does_not_retry_client_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let err = provider.translate(&request("Hello"), "fr").await.unwrap_err();

        assert!(matches!(err, ProviderError::Api { status: 401, .. }));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_translate_exhausts_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let err = provider.translate(&request("Hello"), "fr").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_translate_empty_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let err = provider.translate(&request("Hello"), "fr").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_translate_fast_sends_fast_model() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini-fast"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Salut")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server).with_fast_model("gpt-4o-mini-fast");
        let fast_request = ProviderRequest {
            fast: true,
            ..request("Hi")
        };
        let result = provider.translate(&fast_request, "fr").await.unwrap();
        assert_eq!(result, "Salut");
    }

    #[tokio::test]
    async fn test_translate_batch_single_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"response_format": {"type": "json_object"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response(
                r#"{"fr": "Bonjour", "hi": "नमस्ते"}"#,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let targets = vec!["fr".to_string(), "hi".to_string()];
        let result = provider.translate_batch(&request("Hello"), &targets).await.unwrap();

        assert_eq!(result["fr"], "Bonjour");
        assert_eq!(result["hi"], "नमस्ते");
    }

    #[tokio::test]
    async fn test_translate_batch_chunks_by_batch_size() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response(
                r#"{"fr": "Bonjour", "hi": "नमस्ते", "de": "Hallo"}"#,
            )))
            .expect(3)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let targets = vec!["fr".to_string(), "hi".to_string(), "de".to_string()];
        let chunked = ProviderRequest {
            hints: BatchHints::new(1, 500).unwrap(),
            ..request("Hello")
        };
        let result = provider.translate_batch(&chunked, &targets).await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result["de"], "Hallo");
    }

    #[tokio::test]
    async fn test_translate_batch_missing_language_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response(r#"{"fr": "Bonjour"}"#)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let targets = vec!["fr".to_string(), "hi".to_string()];
        let result = provider.translate_batch(&request("Hello"), &targets).await;

        assert!(matches!(result, Err(ProviderError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_translate_batch_failed_chunk_only_drops_its_languages() {
        let mock_server = MockServer::start().await;

        // Chunks are sent in order: fr succeeds, hi fails every attempt, de succeeds.
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response(
                r#"{"fr": "Bonjour"}"#,
            )))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .up_to_n_times(3)
            .expect(3)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response(
                r#"{"de": "Hallo"}"#,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server);
        let targets = vec!["fr".to_string(), "hi".to_string(), "de".to_string()];
        let chunked = ProviderRequest {
            hints: BatchHints::new(1, 500).unwrap(),
            ..request("Hello")
        };
        let result = provider.translate_batch(&chunked, &targets).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result["fr"], "Bonjour");
        assert_eq!(result["de"], "Hallo");
        assert!(!result.contains_key("hi"));
    }
}
