//! `shellgram run` -- start the Telegram channel and the dispatch loop.
//!
//! # Lifecycle
//!
//! ```text
//! 1. Load and validate config, resolve the bot token
//! 2. Build the dispatch context (allow-list, aliases, registry, working dir)
//! 3. Start the Telegram long-poll loop in its own tokio task
//! 4. Run the dispatcher on the inbound queue
//! 5. On Ctrl+C (or channel failure) cancel both loops and kill running tasks
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use shellgram_channels::{Channel, ChannelHost};
use shellgram_channels::telegram::TelegramChannel;
use shellgram_core::dispatcher::DEFAULT_QUEUE_CAPACITY;
use shellgram_core::{DispatchContext, Dispatcher, HandlerChain, InboundQueue};

use super::{load, require_token};

pub async fn run(config_override: Option<&Path>) -> anyhow::Result<()> {
    let (_, config) = load(config_override).await?;
    let token = require_token(&config, |name| std::env::var(name).ok())?;

    let channel = Arc::new(TelegramChannel::new(&token, config.poll_timeout_secs));
    let ctx = DispatchContext::from_config(&config, channel.clone());
    info!(
        working_dir = %ctx.working_dir().display(),
        aliases = config.commands.len(),
        allowed_senders = config.white_list.len(),
        "dispatcher configured"
    );

    let dispatcher = Arc::new(Dispatcher::new(ctx, HandlerChain::standard()));
    let (queue, inbound) = InboundQueue::new(DEFAULT_QUEUE_CAPACITY);
    let cancel = CancellationToken::new();

    let mut channel_task = {
        let channel = Arc::clone(&channel);
        let host: Arc<dyn ChannelHost> = Arc::new(queue);
        let cancel = cancel.clone();
        tokio::spawn(async move { channel.start(host, cancel).await })
    };
    let dispatch_task = {
        let dispatcher = Arc::clone(&dispatcher);
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.run(inbound, cancel).await })
    };

    info!("shellgram running -- press Ctrl+C to stop");

    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("received shutdown signal");
            None
        }
        joined = &mut channel_task => Some(joined),
    };

    cancel.cancel();
    let killed = dispatcher.cancel_all_tasks();
    if killed > 0 {
        info!(tasks = killed, "killed running tasks");
    }
    if let Err(e) = dispatch_task.await {
        warn!(error = %e, "dispatch task ended abnormally");
    }

    let channel_result = match early_exit {
        Some(joined) => joined,
        None => channel_task.await,
    };
    info!(status = ?channel.status(), "telegram channel status at exit");
    match channel_result {
        Ok(Ok(())) => {
            info!("shutdown complete");
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::Error::new(e).context("telegram channel stopped")),
        Err(e) => Err(anyhow::anyhow!("telegram channel task panicked: {e}")),
    }
}
