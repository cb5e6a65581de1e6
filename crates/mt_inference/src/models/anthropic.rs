use std::fmt;

use async_trait::async_trait;
use mt_core::{Backend, Result, TextKind, TranslationFailure, TranslationModel, TranslationRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_input, classify_status, classify_transport, clean_output, http_client, malformed, require_api_key};
use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct UserMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<UserMessage>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// Messages API backend.
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    name: String,
    config: Config,
}

impl AnthropicModel {
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
            name: format!("Anthropic ({})", model),
            model,
            config: config.clone(),
        })
    }

    async fn complete(&self, request: &TranslationRequest) -> std::result::Result<String, TranslationFailure> {
        let body = MessagesRequest {
            model: request.model(),
            max_tokens: match request.kind() {
                TextKind::Body => self.config.max_output_tokens,
                TextKind::Title => self.config.title_max_output_tokens,
            },
            temperature: self.config.temperature,
            system: request.system_prompt(),
            messages: vec![UserMessage {
                role: "user",
                content: request.user_prompt(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = serde_json::from_str(&text).map_err(malformed)?;
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!("⚠️ {} stopped at the output token limit, translation may be incomplete", self.name);
        }

        // Only text blocks carry the translation.
        let translation = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if translation.is_empty() {
            return Err(malformed("no text content"));
        }

        clean_output(&translation)
    }
}

impl fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TranslationModel for AnthropicModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, text: &str, kind: TextKind) -> std::result::Result<String, TranslationFailure> {
        check_input(text, self.config.max_input_chars)?;
        let request = TranslationRequest::new(Backend::Anthropic, self.model.clone(), text, kind);
        debug!("Requesting {:?} translation of {} chars from {}", kind, text.chars().count(), self.name);
        self.complete(&request).await
    }
}
