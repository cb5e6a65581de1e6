use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use mt_core::{ChatId, Error, Messenger, Result, SendError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::api::{ApiResponse, Update};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Bot API client over HTTPS.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
    api_url: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl TelegramClient {
    /// `request_timeout` must exceed the long-poll timeout used with
    /// [`TelegramClient::get_updates`].
    pub fn new(token: impl Into<String>, api_url: Option<String>, request_timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Config("TELEGRAM_BOT_TOKEN is not set".to_string()));
        }
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            token,
            api_url: api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T> {
        let response = self.client.post(self.method_url(method)).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let parsed: ApiResponse<T> = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Messaging(format!("{} returned HTTP {} with an unreadable body: {}", method, status, e))
        })?;

        if !parsed.ok {
            return Err(Error::Messaging(format!("{} failed: {}", method, parsed.failure())));
        }
        parsed
            .result
            .ok_or_else(|| Error::Messaging(format!("{} returned no result", method)))
    }

    /// Identity check; returns the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me: Value = self.call("getMe", &json!({})).await?;
        Ok(me
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Long-polls for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, poll_timeout: Duration) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message", "channel_post"],
        });
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        debug!("getUpdates(offset={}) -> {} update(s)", offset, updates.len());
        Ok(updates)
    }
}

fn chat_param(chat: &ChatId) -> Value {
    match chat {
        ChatId::Id(id) => json!(id),
        ChatId::Username(name) => json!(format!("@{}", name)),
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat: &ChatId, text: &str) -> std::result::Result<(), SendError> {
        let body = json!({
            "chat_id": chat_param(chat),
            "text": text,
            "disable_web_page_preview": true,
        });
        match self.call::<_, Value>("sendMessage", &body).await {
            Ok(_) => Ok(()),
            Err(Error::Http(err)) if err.is_timeout() => Err(SendError::Timeout),
            Err(err) => {
                error!("Failed to send message to {}: {}", chat, err);
                Err(SendError::Delivery(err.to_string()))
            }
        }
    }
}
