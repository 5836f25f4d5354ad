//! Message event types exchanged with the chat transport.
//!
//! [`InboundEvent`] is what a channel hands to the dispatcher for every
//! update it receives; [`OutboundMessage`] is a reply heading back out.

use serde::{Deserialize, Serialize};

/// A text message received from a chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel name (e.g. "telegram").
    pub channel: String,

    /// Sender identity checked against the allow-list.
    ///
    /// For Telegram this is the username without the leading `@`; it is
    /// empty when the sender has no username.
    pub sender_id: String,

    /// Chat / conversation identifier replies are sent to.
    pub chat_id: String,

    /// Channel-specific message identifier, if any. Replies thread under it.
    #[serde(default)]
    pub message_id: Option<String>,

    /// Raw message text.
    pub content: String,
}

impl InboundMessage {
    /// Build a message with no channel message id.
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            message_id: None,
            content: content.into(),
        }
    }

    /// Build a plain-text reply addressed to this message's chat, threaded
    /// under the message when it has an id.
    pub fn reply(&self, content: impl Into<String>) -> OutboundMessage {
        OutboundMessage {
            channel: self.channel.clone(),
            chat_id: self.chat_id.clone(),
            content: content.into(),
            format: MessageFormat::Plain,
            reply_to: self.message_id.clone(),
        }
    }

    /// Build an HTML reply addressed to this message's chat.
    pub fn reply_html(&self, content: impl Into<String>) -> OutboundMessage {
        OutboundMessage {
            format: MessageFormat::Html,
            ..self.reply(content)
        }
    }
}

/// One update delivered by a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A text message.
    Message(InboundMessage),

    /// Any update that is not a text message (edits, stickers, joins, ...).
    Unsupported {
        /// Channel the update came from.
        channel: String,
        /// Short description of the update kind, for logging.
        kind: String,
    },
}

impl InboundEvent {
    /// The text message carried by this event, if any.
    pub fn message(&self) -> Option<&InboundMessage> {
        match self {
            InboundEvent::Message(msg) => Some(msg),
            InboundEvent::Unsupported { .. } => None,
        }
    }
}

/// How the content of an [`OutboundMessage`] should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// Sent verbatim.
    #[default]
    Plain,
    /// Rendered with the channel's HTML subset.
    Html,
}

/// An outbound message to send to a chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Target channel name.
    pub channel: String,

    /// Target chat / conversation identifier.
    pub chat_id: String,

    /// Message text content.
    pub content: String,

    /// Rendering mode for `content`.
    #[serde(default)]
    pub format: MessageFormat,

    /// Message ID to thread the reply under.
    #[serde(default)]
    pub reply_to: Option<String>,
}
