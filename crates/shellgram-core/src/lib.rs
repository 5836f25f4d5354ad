//! Core of shellgram: the message handler chain and the task registry.
//!
//! ```text
//! Channel ──> InboundQueue ──> Dispatcher::run
//!                                   │
//!                             HandlerChain
//!     non-message → auth → help → file → cd → tasks → kill → command → unsupported
//!                                                        │         │
//!                                              TaskRegistry   TaskRunner ──> subprocess
//! ```
//!
//! - [`auth`] -- sender allow-list
//! - [`resolver`] -- message text to command line
//! - [`registry`] -- in-flight task table with cancel-by-id
//! - [`runner`] -- subprocess spawn, capture, reply, cleanup
//! - [`handlers`] -- the chain and its handlers
//! - [`context`] -- dispatcher-owned shared state
//! - [`dispatcher`] -- the dispatch loop
//! - [`config_loader`] -- config file discovery

pub mod auth;
pub mod config_loader;
pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod resolver;
pub mod runner;

pub use context::DispatchContext;
pub use dispatcher::{Dispatcher, InboundQueue};
pub use handlers::{Handler, HandlerChain, Outcome};
pub use registry::{RegistryError, TaskId, TaskRegistry, TaskSnapshot};
pub use runner::{TaskError, TaskRunner};
