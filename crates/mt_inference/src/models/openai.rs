use std::fmt;

use async_trait::async_trait;
use mt_core::{Backend, Result, TextKind, TranslationFailure, TranslationModel, TranslationRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_input, classify_status, classify_transport, clean_output, http_client, malformed, require_api_key};
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Chat-completions backend (OpenAI and compatible endpoints).
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    name: String,
    config: Config,
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Result<Self> {
        let model = config.model();
        Ok(Self {
            client: http_client(config)?,
            api_key: require_api_key(config)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            name: format!("OpenAI ({})", model),
            model,
            config: config.clone(),
        })
    }

    async fn complete(&self, request: &TranslationRequest) -> std::result::Result<String, TranslationFailure> {
        let body = ChatRequest {
            model: request.model(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt(),
                },
            ],
            max_tokens: match request.kind() {
                TextKind::Body => self.config.max_output_tokens,
                TextKind::Title => self.config.title_max_output_tokens,
            },
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport)?;
        if !status.is_success() {
            return Err(classify_status(
                status.as_u16(),
                &text,
                request.source_text().chars().count(),
                self.config.max_input_chars,
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(malformed)?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| malformed("no choices"))?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!("⚠️ {} stopped at the output token limit, translation may be incomplete", self.name);
        }

        clean_output(&choice.message.content.unwrap_or_default())
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TranslationModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, text: &str, kind: TextKind) -> std::result::Result<String, TranslationFailure> {
        check_input(text, self.config.max_input_chars)?;
        let request = TranslationRequest::new(Backend::OpenAi, self.model.clone(), text, kind);
        debug!("Requesting {:?} translation of {} chars from {}", kind, text.chars().count(), self.name);
        self.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use mt_core::BackendErrorKind;
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base_url: String) -> Config {
        Config {
            base_url: Some(base_url),
            ..Config::new(Backend::OpenAi, Some("sk-test".to_string()))
        }
    }

    #[tokio::test]
    async fn test_translate_success() {
        let app = Router::new().route(
            "/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-3.5-turbo");
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["max_tokens"], 1000);
                assert!(body["messages"][1]["content"].as_str().unwrap().contains("ސުރުޚީ"));
                Json(json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": "Here is the translation: Headline"},
                        "finish_reason": "stop"
                    }]
                }))
            }),
        );
        let model = OpenAiModel::new(&config(serve(app).await)).unwrap();

        let translated = model.translate("ސުރުޚީ", TextKind::Title).await.unwrap();
        assert_eq!(translated, "Headline");
    }

    #[tokio::test]
    async fn test_translate_rate_limited() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({"error": {"message": "Rate limit reached", "type": "requests"}})),
                )
            }),
        );
        let model = OpenAiModel::new(&config(serve(app).await)).unwrap();

        let err = model.translate("ދިވެހި", TextKind::Body).await.unwrap_err();
        assert_eq!(err.kind(), Some(BackendErrorKind::RateLimited));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_translate_malformed_response() {
        let app = Router::new().route("/chat/completions", post(|| async { Json(json!({"choices": []})) }));
        let model = OpenAiModel::new(&config(serve(app).await)).unwrap();

        let err = model.translate("ދިވެހި", TextKind::Body).await.unwrap_err();
        assert_eq!(err.kind(), Some(BackendErrorKind::Unknown));
    }

    #[tokio::test]
    async fn test_input_too_long_is_not_sent() {
        let config = Config {
            max_input_chars: 3,
            // nothing listens here; an attempted request would fail differently
            base_url: Some("http://127.0.0.1:1".to_string()),
            ..Config::new(Backend::OpenAi, Some("sk-test".to_string()))
        };
        let model = OpenAiModel::new(&config).unwrap();

        let err = model.translate("ދިވެހި", TextKind::Body).await.unwrap_err();
        assert_eq!(err, TranslationFailure::InputTooLong { chars: 6, max: 3 });
    }
}
