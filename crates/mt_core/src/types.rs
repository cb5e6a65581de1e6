use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A fetched document, kept only until extraction has run.
#[derive(Debug, Clone)]
pub struct ArticleSource {
    pub url: String,
    pub raw_document: String,
}

impl ArticleSource {
    pub fn new(url: impl Into<String>, raw_document: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_document: raw_document.into(),
        }
    }
}

/// Plain-text article as isolated from its markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAi,
    Anthropic,
}

impl Backend {
    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-3.5-turbo",
            Backend::Anthropic => "claude-3-haiku-20240307",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::OpenAi => f.write_str("openai"),
            Backend::Anthropic => f.write_str("anthropic"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Backend::OpenAi),
            "anthropic" => Ok(Backend::Anthropic),
            other => Err(Error::Config(format!(
                "Invalid translation provider '{}'. Choose 'openai' or 'anthropic'",
                other
            ))),
        }
    }
}

/// What is being translated; headlines get a shorter framing and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Body,
    Title,
}

pub const TARGET_LANGUAGE: &str = "English";

/// One translation call. Fields are private so a request cannot change
/// after it has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    source_text: String,
    kind: TextKind,
    backend: Backend,
    model: String,
}

impl TranslationRequest {
    pub fn new(
        backend: Backend,
        model: impl Into<String>,
        source_text: impl Into<String>,
        kind: TextKind,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            kind,
            backend,
            model: model.into(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_language(&self) -> &'static str {
        TARGET_LANGUAGE
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Instruction framing shared by every backend.
    pub fn system_prompt(&self) -> String {
        match self.kind {
            TextKind::Body => format!(
                "You are a helpful assistant that translates Dhivehi news text to fluent {lang}, \
                 preserving meaning and named entities. Provide only the translated {lang} text as output, \
                 without any additional commentary or phrases like 'Here is the translation:'. \
                 Maintain a journalistic and formal tone.",
                lang = TARGET_LANGUAGE
            ),
            TextKind::Title => format!(
                "You are a helpful assistant that translates a Dhivehi news headline to fluent {lang}, \
                 preserving meaning and named entities. Provide only the translated headline. \
                 Keep it concise.",
                lang = TARGET_LANGUAGE
            ),
        }
    }

    pub fn user_prompt(&self) -> String {
        format!(
            "Translate the following Dhivehi text to {}:\n\n{}",
            TARGET_LANGUAGE, self.source_text
        )
    }
}

/// A chat as configured: numeric id (channels are negative) or `@username`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl ChatId {
    pub fn matches(&self, chat: &ChatRef) -> bool {
        match self {
            ChatId::Id(id) => *id == chat.id,
            ChatId::Username(name) => chat
                .username
                .as_deref()
                .map(|u| u.eq_ignore_ascii_case(name))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => write!(f, "@{}", name),
        }
    }
}

impl FromStr for ChatId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(ChatId::Id(id));
        }
        let name = s
            .trim_start_matches("https://")
            .trim_start_matches("t.me/")
            .trim_start_matches('@');
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidChat(s.to_string()));
        }
        Ok(ChatId::Username(name.to_string()))
    }
}

impl From<&ChatRef> for ChatId {
    fn from(chat: &ChatRef) -> Self {
        ChatId::Id(chat.id)
    }
}

/// The chat a message arrived in, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
    pub username: Option<String>,
}

/// Platform-neutral view of a channel post or a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat: ChatRef,
    pub text: String,
}
