//! [`TelegramChannel`] -- `Channel` trait implementation for Telegram.
//!
//! Long-polls `getUpdates` through [`TelegramClient`] and hands every
//! update, text or not, to [`ChannelHost::deliver_inbound`] in arrival
//! order. Authorization is not decided here; the dispatcher's handler chain
//! owns that.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use shellgram_types::error::ChannelError;
use shellgram_types::event::{InboundEvent, InboundMessage, MessageFormat, OutboundMessage};
use shellgram_types::secret::BotToken;

use crate::traits::{Channel, ChannelHost, ChannelStatus, MessageId};

use super::client::TelegramClient;
use super::types::Update;

/// Channel name used in events and outbound routing.
pub const CHANNEL_NAME: &str = "telegram";

/// Delay before retrying after a failed poll, in seconds.
const ERROR_RETRY_DELAY_SECS: u64 = 5;

/// Telegram Bot channel.
pub struct TelegramChannel {
    client: TelegramClient,
    status: Arc<RwLock<ChannelStatus>>,
    /// Offset for the next `getUpdates` call (last update_id + 1).
    offset: AtomicI64,
    poll_timeout_secs: u64,
}

impl TelegramChannel {
    /// Create a channel for the given bot token.
    pub fn new(token: &BotToken, poll_timeout_secs: u64) -> Self {
        Self::with_client(TelegramClient::new(token), poll_timeout_secs)
    }

    /// Create a channel around an existing client.
    pub fn with_client(client: TelegramClient, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            status: Arc::new(RwLock::new(ChannelStatus::Stopped)),
            offset: AtomicI64::new(0),
            poll_timeout_secs,
        }
    }

    async fn set_status(&self, status: ChannelStatus) {
        *self.status.write().await = status;
    }

    /// Convert one update into an [`InboundEvent`].
    pub(crate) fn to_event(update: &Update) -> InboundEvent {
        let text_message = update
            .message
            .as_ref()
            .and_then(|msg| msg.text.as_ref().map(|text| (msg, text)));

        let Some((msg, text)) = text_message else {
            return InboundEvent::Unsupported {
                channel: CHANNEL_NAME.into(),
                kind: update.kind().into(),
            };
        };

        let sender_id = msg
            .from
            .as_ref()
            .and_then(|u| u.username.clone())
            .unwrap_or_default();

        InboundEvent::Message(InboundMessage {
            channel: CHANNEL_NAME.into(),
            sender_id,
            chat_id: msg.chat.id.to_string(),
            message_id: Some(msg.message_id.to_string()),
            content: text.clone(),
        })
    }

    /// Deliver a batch of updates, advancing the offset past each one.
    ///
    /// Returns `Err` only when the host is gone; per-update delivery is
    /// otherwise best-effort.
    pub(crate) async fn process_updates(
        &self,
        updates: &[Update],
        host: &Arc<dyn ChannelHost>,
    ) -> Result<(), ChannelError> {
        for update in updates {
            // Advance first so a closed host does not replay this update.
            self.offset.store(update.update_id + 1, Ordering::SeqCst);
            let event = Self::to_event(update);
            debug!(update_id = update.update_id, kind = update.kind(), "delivering update");
            match host.deliver_inbound(event).await {
                Ok(()) => {}
                Err(ChannelError::QueueClosed) => return Err(ChannelError::QueueClosed),
                Err(e) => {
                    error!(update_id = update.update_id, error = %e, "failed to deliver update");
                }
            }
        }
        Ok(())
    }

    /// The offset the next poll will use.
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }
}

fn parse_chat_id(chat_id: &str) -> Result<i64, ChannelError> {
    chat_id
        .parse()
        .map_err(|_| ChannelError::SendFailed(format!("invalid chat_id '{chat_id}': expected i64")))
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn status(&self) -> ChannelStatus {
        self.status
            .try_read()
            .map(|s| s.clone())
            .unwrap_or(ChannelStatus::Stopped)
    }

    async fn start(
        &self,
        host: Arc<dyn ChannelHost>,
        cancel: CancellationToken,
    ) -> Result<(), ChannelError> {
        self.set_status(ChannelStatus::Starting).await;

        let me = match self.client.get_me().await {
            Ok(me) => me,
            Err(e) => {
                error!(error = %e, "failed to verify Telegram bot token");
                self.set_status(ChannelStatus::Error(e.to_string())).await;
                return Err(e);
            }
        };

        info!(
            bot_id = me.id,
            bot_username = me.username.as_deref().unwrap_or(""),
            "authorized on bot account"
        );

        self.set_status(ChannelStatus::Running).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Telegram channel received cancellation");
                    break;
                }
                result = self.client.get_updates(Some(self.offset()), self.poll_timeout_secs) => {
                    match result {
                        Ok(updates) => {
                            if let Err(e) = self.process_updates(&updates, &host).await {
                                info!(error = %e, "dispatcher gone, stopping Telegram channel");
                                break;
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "getUpdates failed");
                            self.set_status(ChannelStatus::Error(e.to_string())).await;

                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    info!("Telegram channel cancelled during error backoff");
                                    break;
                                }
                                _ = tokio::time::sleep(Duration::from_secs(ERROR_RETRY_DELAY_SECS)) => {}
                            }

                            self.set_status(ChannelStatus::Running).await;
                        }
                    }
                }
            }
        }

        self.set_status(ChannelStatus::Stopped).await;
        info!("Telegram channel stopped");
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, ChannelError> {
        let chat_id = parse_chat_id(&msg.chat_id)?;

        let reply_to: Option<i64> = msg
            .reply_to
            .as_ref()
            .map(|id| {
                id.parse::<i64>().map_err(|_| {
                    ChannelError::SendFailed(format!("invalid reply_to '{id}': expected i64"))
                })
            })
            .transpose()?;

        let parse_mode = match msg.format {
            MessageFormat::Plain => None,
            MessageFormat::Html => Some("HTML"),
        };

        let sent = self
            .client
            .send_message(chat_id, &msg.content, parse_mode, reply_to)
            .await?;

        Ok(MessageId(sent.message_id.to_string()))
    }

    async fn send_document(&self, chat_id: &str, path: &Path) -> Result<MessageId, ChannelError> {
        let chat_id = parse_chat_id(chat_id)?;
        let sent = self.client.send_document(chat_id, path).await?;
        Ok(MessageId(sent.message_id.to_string()))
    }
}
