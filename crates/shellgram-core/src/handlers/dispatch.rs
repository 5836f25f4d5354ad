//! Command execution and the final fallback.

use async_trait::async_trait;

use shellgram_types::event::InboundEvent;

use super::{Handler, Outcome};
use crate::context::DispatchContext;

pub(crate) const UNSUPPORTED: &str = "unsupported command";

/// Resolves the text to a command line and starts it as a task.
///
/// Returns as soon as the task is registered. The subprocess runs on its own
/// tokio task and replies when it finishes, so the dispatch loop is never
/// blocked by a long-running command.
pub struct CommandHandler;

#[async_trait]
impl Handler for CommandHandler {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        let Some(msg) = event.message() else {
            return Outcome::Pass;
        };
        let Some(line) = ctx.resolver().resolve(&msg.content) else {
            return Outcome::Pass;
        };

        // Detached on purpose; completion is reported by the runner.
        let _ = ctx.runner().spawn(line, ctx.working_dir(), msg.clone());
        Outcome::Handled
    }
}

/// Catches everything the earlier handlers passed on.
pub struct UnsupportedHandler;

#[async_trait]
impl Handler for UnsupportedHandler {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        if let Some(msg) = event.message() {
            ctx.reply(msg, UNSUPPORTED).await;
        }
        Outcome::Handled
    }
}
