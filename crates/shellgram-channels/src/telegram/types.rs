//! Telegram Bot API types.
//!
//! Only the fields shellgram reads are modelled; unknown fields are ignored
//! by serde.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response: `{ ok, result?, description? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    /// Error text when `ok` is `false`.
    pub description: Option<String>,
}

/// A single update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonically increasing update identifier.
    pub update_id: i64,
    /// New incoming message of any kind.
    pub message: Option<Message>,
    /// New version of a message that was edited.
    pub edited_message: Option<Message>,
    /// New incoming channel post.
    pub channel_post: Option<Message>,
}

impl Update {
    /// Short name of the update's payload kind, for logging.
    pub fn kind(&self) -> &'static str {
        match (&self.message, &self.edited_message, &self.channel_post) {
            (Some(msg), _, _) if msg.text.is_some() => "message",
            (Some(_), _, _) => "message_without_text",
            (None, Some(_), _) => "edited_message",
            (None, None, Some(_)) => "channel_post",
            (None, None, None) => "other",
        }
    }
}

/// A Telegram message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Absent for channel posts.
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    /// Unix timestamp.
    pub date: i64,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    /// Username without the leading `@`, if set.
    pub username: Option<String>,
}

/// A Telegram chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// `"private"`, `"group"`, `"supergroup"` or `"channel"`.
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Request body for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    /// `"HTML"` when the content uses markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}
