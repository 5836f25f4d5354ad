//! Handlers that run before any command is considered.

use async_trait::async_trait;
use tracing::{debug, warn};

use shellgram_types::event::InboundEvent;

use super::{Handler, Outcome};
use crate::context::DispatchContext;

pub(crate) const NOT_AUTHORIZED: &str = "Sorry, you are not authorized";

/// Swallows updates that are not text messages.
pub struct NonMessageHandler;

#[async_trait]
impl Handler for NonMessageHandler {
    fn name(&self) -> &'static str {
        "non_message"
    }

    async fn handle(&self, event: &InboundEvent, _ctx: &DispatchContext) -> Outcome {
        match event {
            InboundEvent::Message(_) => Outcome::Pass,
            InboundEvent::Unsupported { kind, .. } => {
                debug!(kind = %kind, "ignoring non-message update");
                Outcome::Handled
            }
        }
    }
}

/// Rejects senders missing from the allow-list.
pub struct AuthHandler;

#[async_trait]
impl Handler for AuthHandler {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        let Some(msg) = event.message() else {
            return Outcome::Pass;
        };
        if ctx.allow_list().is_authorized(&msg.sender_id) {
            return Outcome::Pass;
        }
        warn!(
            sender_id = %msg.sender_id,
            chat_id = %msg.chat_id,
            "message from unauthorized sender"
        );
        ctx.reply(msg, NOT_AUTHORIZED).await;
        Outcome::Handled
    }
}
