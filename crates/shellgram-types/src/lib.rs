//! # shellgram-types
//!
//! Core type definitions shared by every shellgram crate.
//!
//! - **[`error`]** -- [`ChannelError`] and [`ConfigError`]
//! - **[`config`]** -- Configuration schema (bot token, allow-list, aliases)
//! - **[`event`]** -- Inbound/outbound message events
//! - **[`secret`]** -- [`BotToken`], a redacting wrapper for the bot credential

pub mod config;
pub mod error;
pub mod event;
pub mod secret;

pub use error::{ChannelError, ConfigError};
pub use secret::BotToken;
