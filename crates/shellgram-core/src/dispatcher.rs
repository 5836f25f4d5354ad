//! The dispatch loop.
//!
//! Channels push updates into an [`InboundQueue`]; the [`Dispatcher`] pulls
//! them one at a time and runs each through the [`HandlerChain`]. Every
//! handler except command execution finishes before the next event is
//! pulled, so messages are processed in arrival order.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use shellgram_channels::{ChannelError, ChannelHost};
use shellgram_types::event::InboundEvent;

use crate::context::DispatchContext;
use crate::handlers::HandlerChain;

/// Default capacity of the inbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// [`ChannelHost`] that forwards events into the dispatcher's queue.
#[derive(Clone)]
pub struct InboundQueue {
    tx: mpsc::Sender<InboundEvent>,
}

impl InboundQueue {
    /// Create a queue and the receiving end the dispatcher consumes.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<InboundEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ChannelHost for InboundQueue {
    async fn deliver_inbound(&self, event: InboundEvent) -> Result<(), ChannelError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| ChannelError::QueueClosed)
    }
}

/// Owns the dispatch state and the handler chain.
pub struct Dispatcher {
    ctx: DispatchContext,
    chain: HandlerChain,
}

impl Dispatcher {
    pub fn new(ctx: DispatchContext, chain: HandlerChain) -> Self {
        Self { ctx, chain }
    }

    pub fn context(&self) -> &DispatchContext {
        &self.ctx
    }

    /// Run one event through the chain.
    pub async fn handle(&self, event: &InboundEvent) -> Option<&'static str> {
        if let Some(msg) = event.message() {
            debug!(
                sender_id = %msg.sender_id,
                chat_id = %msg.chat_id,
                text = %msg.content,
                "dispatching message"
            );
        }
        self.chain.dispatch(event, &self.ctx).await
    }

    /// Consume events until the queue closes or `cancel` fires.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundEvent>, cancel: CancellationToken) {
        info!(handlers = ?self.chain.names(), "handling chat updates");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("dispatch loop cancelled");
                    break;
                }
                event = inbound.recv() => {
                    let Some(event) = event else {
                        info!("inbound queue closed");
                        break;
                    };
                    self.handle(&event).await;
                }
            }
        }
    }

    /// Cancel every running task. Used on shutdown.
    pub fn cancel_all_tasks(&self) -> usize {
        self.ctx.registry().cancel_all()
    }
}
