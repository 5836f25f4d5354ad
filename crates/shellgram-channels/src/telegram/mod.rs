//! Telegram transport.
//!
//! - [`types`] -- Bot API request/response types
//! - [`client`] -- HTTP wrapper for the Bot API methods shellgram uses
//! - [`channel`] -- [`Channel`](crate::traits::Channel) implementation

pub mod channel;
pub mod client;
pub mod types;

pub use channel::TelegramChannel;
pub use client::TelegramClient;
