use mt_core::{ChatRef, InboundMessage};
use serde::Deserialize;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    /// Human-readable failure, including the flood-wait hint when present.
    pub fn failure(&self) -> String {
        let mut message = format!(
            "{} ({})",
            self.description.as_deref().unwrap_or("unknown error"),
            self.error_code.map_or("no code".to_string(), |c| c.to_string())
        );
        if let Some(seconds) = self.parameters.as_ref().and_then(|p| p.retry_after) {
            message.push_str(&format!(", retry after {}s", seconds));
        }
        message
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub caption_entities: Vec<MessageEntity>,
}

/// Formatting span; `text_link` spans carry a URL that is not in the text.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub username: Option<String>,
}

impl Update {
    /// The text-bearing post or message, if the update carries one.
    /// Hyperlink targets are appended on their own lines so link detection
    /// sees them.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.channel_post.or(self.message)?;
        let (mut text, entities) = match (message.text, message.caption) {
            (Some(text), _) => (text, message.entities),
            (None, Some(caption)) => (caption, message.caption_entities),
            (None, None) => return None,
        };
        for url in entities
            .into_iter()
            .filter(|e| e.kind == "text_link")
            .filter_map(|e| e.url)
        {
            text.push('\n');
            text.push_str(&url);
        }
        Some(InboundMessage {
            chat: ChatRef {
                id: message.chat.id,
                username: message.chat.username,
            },
            text,
        })
    }
}
