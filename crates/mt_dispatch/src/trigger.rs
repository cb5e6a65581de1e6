use std::fmt;

use mt_core::{ChatId, InboundMessage};
use mt_extractor::{first_url, parse_command, Command};

/// What started a dispatch, and so where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A link posted in the watched channel; output goes to the destination.
    Channel { url: String },
    /// A `/translate` command; output goes back to the requesting chat.
    Command { url: String, chat: ChatId },
}

impl Trigger {
    pub fn url(&self) -> &str {
        match self {
            Trigger::Channel { url } | Trigger::Command { url, .. } => url,
        }
    }

    /// The requesting chat for commands.
    pub fn reply_to(&self) -> Option<&ChatId> {
        match self {
            Trigger::Channel { .. } => None,
            Trigger::Command { chat, .. } => Some(chat),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Channel { .. } => write!(f, "channel"),
            Trigger::Command { chat, .. } => write!(f, "command from {}", chat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dispatch(Trigger),
    Usage(ChatId),
}

/// Decides what an inbound message asks for. Commands are honoured in any
/// chat; bare links only in `source`.
pub fn route(message: &InboundMessage, source: &ChatId) -> Option<Action> {
    if let Some(Command::Translate(url)) = parse_command(&message.text) {
        let chat = ChatId::from(&message.chat);
        return Some(match url {
            Some(url) => Action::Dispatch(Trigger::Command { url, chat }),
            None => Action::Usage(chat),
        });
    }

    if !source.matches(&message.chat) {
        return None;
    }
    first_url(&message.text).map(|url| Action::Dispatch(Trigger::Channel { url }))
}
