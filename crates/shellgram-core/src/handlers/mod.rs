//! The message handler chain.
//!
//! A [`Handler`] inspects one [`InboundEvent`] and either handles it fully or
//! passes. [`HandlerChain`] runs its handlers in order and stops at the first
//! one that handles the event, so each message gets exactly one reply path.
//!
//! The canonical order ([`HandlerChain::standard`]) encodes the policy:
//!
//! ```text
//! non-message -> auth -> /help -> /file -> /cd -> /tasks -> /kill -> command -> unsupported
//! ```

use async_trait::async_trait;
use tracing::debug;

use shellgram_types::event::InboundEvent;

use crate::context::DispatchContext;

mod builtins;
mod dispatch;
mod gate;

pub use builtins::{CdHandler, FileHandler, HelpHandler, KillHandler, TasksHandler};
pub use dispatch::{CommandHandler, UnsupportedHandler};
pub use gate::{AuthHandler, NonMessageHandler};

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fully handled; stop the chain.
    Handled,
    /// Not for this handler; try the next one.
    Pass,
}

/// One link in the chain.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Try to handle `event`.
    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome;
}

/// Ordered list of handlers.
pub struct HandlerChain {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Box<dyn Handler>>) -> Self {
        Self { handlers }
    }

    /// The canonical chain.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(NonMessageHandler),
            Box::new(AuthHandler),
            Box::new(HelpHandler),
            Box::new(FileHandler),
            Box::new(CdHandler),
            Box::new(TasksHandler),
            Box::new(KillHandler),
            Box::new(CommandHandler),
            Box::new(UnsupportedHandler),
        ])
    }

    /// Handler names in invocation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run `event` through the chain. Returns the name of the handler that
    /// took it, or `None` if every handler passed.
    pub async fn dispatch(
        &self,
        event: &InboundEvent,
        ctx: &DispatchContext,
    ) -> Option<&'static str> {
        for handler in &self.handlers {
            if handler.handle(event, ctx).await == Outcome::Handled {
                debug!(handler = handler.name(), "event handled");
                return Some(handler.name());
            }
        }
        None
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests;
