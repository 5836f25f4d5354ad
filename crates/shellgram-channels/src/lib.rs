//! Chat transport for shellgram.
//!
//! A [`Channel`] is a bidirectional connection to a chat backend. It
//! receives updates and hands each one to a [`ChannelHost`] as an
//! [`InboundEvent`](shellgram_types::event::InboundEvent); the dispatcher
//! replies through [`Channel::send`] and [`Channel::send_document`].
//!
//! ```text
//!   TelegramChannel::start(host, cancel)
//!          │  getUpdates (long poll)
//!          ▼
//!   ChannelHost::deliver_inbound(event) ──> dispatch loop
//!                                               │
//!   Channel::send / send_document  <────────────┘
//! ```

pub mod telegram;
pub mod traits;

pub use traits::*;

pub use shellgram_types::error::ChannelError;
