//! Channel trait definitions.
//!
//! - [`Channel`] -- implemented by each chat transport
//! - [`ChannelHost`] -- implemented by the consumer of inbound events

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use shellgram_types::error::ChannelError;
use shellgram_types::event::{InboundEvent, OutboundMessage};

/// Lifecycle status of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Not yet started, or stopped after cancellation.
    Stopped,
    /// Verifying credentials.
    Starting,
    /// Polling and delivering updates.
    Running,
    /// The last poll failed; the channel is backing off.
    Error(String),
}

/// Identifier of a sent message, returned by [`Channel::send`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

/// A bidirectional connection to a chat backend.
///
/// [`start`](Channel::start) is long-lived: it runs until `cancel` fires,
/// delivering every update to `host` in arrival order. `send` and
/// `send_document` may be called concurrently from any task.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel identifier (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Current lifecycle status.
    fn status(&self) -> ChannelStatus;

    /// Receive updates until cancelled.
    async fn start(
        &self,
        host: Arc<dyn ChannelHost>,
        cancel: CancellationToken,
    ) -> Result<(), ChannelError>;

    /// Send a text message.
    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, ChannelError>;

    /// Upload a local file to a chat.
    async fn send_document(&self, chat_id: &str, path: &Path) -> Result<MessageId, ChannelError>;
}

/// Consumer of inbound events.
#[async_trait]
pub trait ChannelHost: Send + Sync {
    /// Hand one update to the dispatcher.
    async fn deliver_inbound(&self, event: InboundEvent) -> Result<(), ChannelError>;
}
