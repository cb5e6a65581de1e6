use std::fmt;

use async_trait::async_trait;

use crate::error::{FetchError, SendError, TranslationFailure};
use crate::types::{ArticleSource, ChatId, TextKind};

/// An LLM backend able to translate Dhivehi text to English.
#[async_trait]
pub trait TranslationModel: Send + Sync + fmt::Debug {
    /// Backend and model, for logs
    fn name(&self) -> &str;

    /// Translate `text`, returning only the translated text with any
    /// backend envelope removed.
    async fn translate(&self, text: &str, kind: TextKind) -> Result<String, TranslationFailure>;
}

/// Retrieves raw documents.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ArticleSource, FetchError>;
}

/// Delivers text messages to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat: &ChatId, text: &str) -> Result<(), SendError>;
}
